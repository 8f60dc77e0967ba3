use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Config;
use crate::db::{self, ContactsStorage};
use crate::error::ContactsError;
use crate::handlers::contacts::{
    create_contact, delete_contact, get_contact, list_contacts, update_contact,
};
use crate::service::uploads::{UPLOADS_PREFIX, UploadStore};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct ContactsState {
    pub storage: ContactsStorage,
    pub uploads: UploadStore,
}

impl ContactsState {
    pub fn new(storage: ContactsStorage, uploads: UploadStore) -> Self {
        Self { storage, uploads }
    }

    /// Connect to the database (with retries), create the schema and the
    /// uploads directory.
    pub async fn bootstrap(cfg: &Config) -> Result<Self, ContactsError> {
        let pool = db::connect(cfg).await?;
        let storage = ContactsStorage::new(pool);
        storage.init_schema().await?;

        let uploads = UploadStore::new(&cfg.uploads_dir, cfg.max_upload_bytes);
        uploads.ensure_root().await?;
        info!(uploads_dir = %uploads.root().display(), "storage initialized");

        Ok(Self::new(storage, uploads))
    }
}

impl FromRef<ContactsState> for UploadStore {
    fn from_ref(state: &ContactsState) -> Self {
        state.uploads.clone()
    }
}

pub fn contacts_router(state: ContactsState, cfg: &Config) -> Router {
    let uploads = ServeDir::new(state.uploads.root());
    let spa = ServeDir::new(&cfg.static_dir)
        .fallback(ServeFile::new(cfg.static_dir.join("index.html")));

    let api = Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .nest_service(&format!("/{UPLOADS_PREFIX}"), uploads)
        .fallback_service(spa)
        .layer(DefaultBodyLimit::max(cfg.body_limit()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn api_not_found() -> ContactsError {
    ContactsError::RouteNotFound
}
