use crate::error::UploadError;
use axum::extract::multipart::Field;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Multipart field carrying the contact picture.
pub const PICTURE_FIELD: &str = "picture";

/// Prefix of stored `picture` paths; also the public static route.
pub const UPLOADS_PREFIX: &str = "uploads";

/// Picture files on disk, addressed by their relative `uploads/<file>` path.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Stream one picture part to disk under a fresh name.
    ///
    /// The returned guard removes the file on drop unless committed; that
    /// includes the partially written file when this function fails midway.
    pub async fn stage(&self, mut field: Field<'_>) -> Result<StagedPicture, UploadError> {
        let is_image = field
            .content_type()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(UploadError::InvalidFileType);
        }

        let extension = field.file_name().and_then(safe_extension).unwrap_or_default();
        let file_name = format!("picture-{}{}", Uuid::new_v4().simple(), extension);
        let staged = StagedPicture {
            path: self.root.join(&file_name),
            relative: format!("{UPLOADS_PREFIX}/{file_name}"),
            committed: false,
        };

        let mut file = fs::File::create(&staged.path).await?;
        let mut written = 0usize;
        while let Some(chunk) = field.chunk().await? {
            written += chunk.len();
            if written > self.max_bytes {
                return Err(UploadError::FileTooLarge);
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(path = %staged.relative, bytes = written, "picture staged");
        Ok(staged)
    }

    /// Map a stored `uploads/<file>` path to the file inside the root.
    /// Anything that is not a plain file name directly under the prefix is refused.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let name = relative.strip_prefix(UPLOADS_PREFIX)?.strip_prefix('/')?;
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        valid.then(|| self.root.join(name))
    }

    /// Delete a stored picture. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> std::io::Result<bool> {
        let Some(path) = self.resolve(relative) else {
            warn!(path = %relative, "refusing to remove picture outside uploads");
            return Ok(false);
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Extension (with leading dot) of a client file name, when it looks sane.
fn safe_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let sane = !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    sane.then(|| format!(".{}", ext.to_ascii_lowercase()))
}

/// An uploaded picture that is not yet owned by a row.
///
/// Dropping it deletes the file. Call [`StagedPicture::commit`] once the row
/// referencing it has been persisted.
#[derive(Debug)]
pub struct StagedPicture {
    path: PathBuf,
    relative: String,
    committed: bool,
}

impl StagedPicture {
    /// Path to persist in the `picture` column.
    pub fn relative_path(&self) -> &str {
        &self.relative
    }

    pub fn disk_path(&self) -> &Path {
        &self.path
    }

    /// Keep the file; ownership moves to the persisted row.
    pub fn commit(mut self) -> String {
        self.committed = true;
        std::mem::take(&mut self.relative)
    }
}

impl Drop for StagedPicture {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Synchronous on purpose: drop cannot await, and the file must be gone
        // before the response is sent. `block_in_place` is not an option since
        // it panics on a current-thread runtime.
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "discarded staged picture"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to discard staged picture")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut dir = std::env::temp_dir();
        dir.push(format!("contacts-uploads-{tag}-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp uploads dir");
        dir
    }

    fn staged_in(root: &Path, name: &str) -> StagedPicture {
        let path = root.join(name);
        std::fs::write(&path, b"png").expect("write staged file");
        StagedPicture {
            path,
            relative: format!("{UPLOADS_PREFIX}/{name}"),
            committed: false,
        }
    }

    #[test]
    fn dropping_uncommitted_picture_deletes_it() {
        let root = temp_root("drop");
        let staged = staged_in(&root, "a.png");
        let path = staged.disk_path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn committed_picture_survives() {
        let root = temp_root("commit");
        let staged = staged_in(&root, "b.png");
        let path = staged.disk_path().to_path_buf();

        assert_eq!(staged.commit(), "uploads/b.png");
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn resolve_stays_inside_root() {
        let store = UploadStore::new("/srv/uploads", 10);
        assert_eq!(
            store.resolve("uploads/picture-1.png"),
            Some(PathBuf::from("/srv/uploads/picture-1.png"))
        );
        assert_eq!(store.resolve("uploads/../secret"), None);
        assert_eq!(store.resolve("uploads/.."), None);
        assert_eq!(store.resolve("other/picture-1.png"), None);
        assert_eq!(store.resolve("uploads/"), None);
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(safe_extension("me.PNG"), Some(".png".to_string()));
        assert_eq!(safe_extension("archive.tar.gz"), Some(".gz".to_string()));
        assert_eq!(safe_extension("noext"), None);
        assert_eq!(safe_extension("evil.p/ng"), None);
    }

    #[tokio::test]
    async fn remove_tolerates_missing_files() {
        let root = temp_root("remove");
        let store = UploadStore::new(&root, 10);
        std::fs::write(root.join("c.png"), b"png").unwrap();

        assert!(store.remove("uploads/c.png").await.unwrap());
        assert!(!store.remove("uploads/c.png").await.unwrap());
        assert!(!store.remove("uploads/../c.png").await.unwrap());
        let _ = std::fs::remove_dir_all(&root);
    }
}
