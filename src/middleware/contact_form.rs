use axum::{
    Json,
    extract::{FromRef, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};

use crate::error::{ContactsError, UploadError};
use crate::service::uploads::{PICTURE_FIELD, StagedPicture, UploadStore};
use crate::types::contact::ContactPayload;

/// Body of a create/update request: the text fields plus an optional staged
/// picture.
///
/// Accepts `multipart/form-data` (the picture travels as a file part) or
/// `application/json` (fields only). Other bodies yield an empty payload so
/// that validation reports the missing fields.
#[derive(Debug, Default)]
pub struct ContactForm {
    pub payload: ContactPayload,
    pub picture: Option<StagedPicture>,
}

impl<S> FromRequest<S> for ContactForm
where
    S: Send + Sync,
    UploadStore: FromRef<S>,
{
    type Rejection = ContactsError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ContactsError::MalformedBody(rejection.body_text()))?;
            let uploads = UploadStore::from_ref(state);
            return read_multipart(multipart, &uploads).await;
        }

        if content_type.starts_with("application/json") {
            let Json(payload) = Json::<ContactPayload>::from_request(req, state)
                .await
                .map_err(|rejection| ContactsError::MalformedBody(rejection.body_text()))?;
            return Ok(ContactForm {
                payload,
                picture: None,
            });
        }

        Ok(ContactForm::default())
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    uploads: &UploadStore,
) -> Result<ContactForm, ContactsError> {
    // Dropping `form` on any early return discards a picture already staged.
    let mut form = ContactForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            PICTURE_FIELD => {
                // Browsers send an empty part when no file was chosen.
                if field.file_name().is_none_or(str::is_empty) {
                    continue;
                }
                if form.picture.is_some() {
                    return Err(UploadError::UnexpectedFile.into());
                }
                form.picture = Some(uploads.stage(field).await?);
            }
            "name" => form.payload.name = Some(field.text().await?),
            "contact" => form.payload.contact = Some(field.text().await?),
            "email" => form.payload.email = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}
