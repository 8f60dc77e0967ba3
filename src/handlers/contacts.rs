use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::{Contact, ContactFields, ContactsStorage};
use crate::error::ContactsError;
use crate::middleware::contact_form::ContactForm;
use crate::router::ContactsState;
use crate::types::contact::ValidContact;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

/// GET /api/contacts
pub async fn list_contacts(
    State(state): State<ContactsState>,
) -> Result<Json<Vec<Contact>>, ContactsError> {
    Ok(Json(state.storage.find_all().await?))
}

/// GET /api/contacts/{id}
pub async fn get_contact(
    State(state): State<ContactsState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Contact>, ContactsError> {
    let id = parse_id(&raw_id)?;
    let contact = state
        .storage
        .find_by_id(id)
        .await?
        .ok_or(ContactsError::NotFound)?;
    Ok(Json(contact))
}

/// POST /api/contacts
///
/// The staged picture is only kept once the row is persisted; every early
/// return drops it, which deletes the file.
pub async fn create_contact(
    State(state): State<ContactsState>,
    form: ContactForm,
) -> Result<(StatusCode, Json<Contact>), ContactsError> {
    let ContactForm { payload, picture } = form;
    let picture = picture.ok_or(ContactsError::MissingPicture)?;

    let valid = payload.into_valid()?;
    ensure_unique(&state.storage, &valid, None).await?;

    let fields = into_fields(valid, picture.relative_path().to_owned());
    let contact = state.storage.create(&fields).await?;
    picture.commit();

    info!(id = contact.id, "contact created");
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/contacts/{id}
pub async fn update_contact(
    State(state): State<ContactsState>,
    Path(raw_id): Path<String>,
    form: ContactForm,
) -> Result<Json<Contact>, ContactsError> {
    let ContactForm { payload, picture } = form;
    let id = parse_id(&raw_id)?;
    let existing = state
        .storage
        .find_by_id(id)
        .await?
        .ok_or(ContactsError::NotFound)?;

    let valid = payload.into_valid()?;
    ensure_unique(&state.storage, &valid, Some(id)).await?;

    let picture_path = picture
        .as_ref()
        .map(|staged| staged.relative_path().to_owned())
        .unwrap_or_else(|| existing.picture.clone());
    let updated = state
        .storage
        .update(id, &into_fields(valid, picture_path))
        .await?
        .ok_or(ContactsError::NotFound)?;

    // The old image goes only after the row points at the new one.
    if let Some(staged) = picture {
        let new_path = staged.commit();
        if new_path != existing.picture {
            remove_picture(&state, &existing.picture).await;
        }
    }

    info!(id, "contact updated");
    Ok(Json(updated))
}

/// DELETE /api/contacts/{id}
pub async fn delete_contact(
    State(state): State<ContactsState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResponse>, ContactsError> {
    let id = parse_id(&raw_id)?;
    let existing = state
        .storage
        .find_by_id(id)
        .await?
        .ok_or(ContactsError::NotFound)?;

    if !state.storage.delete(id).await? {
        return Err(ContactsError::NotFound);
    }
    remove_picture(&state, &existing.picture).await;

    info!(id, "contact deleted");
    Ok(Json(DeleteResponse {
        message: "Contact deleted successfully",
    }))
}

/// Ids are non-empty ASCII digit strings. One that overflows `i64` cannot
/// name an existing row.
pub fn parse_id(raw: &str) -> Result<i64, ContactsError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ContactsError::InvalidId);
    }
    raw.parse().map_err(|_| ContactsError::NotFound)
}

/// Best-effort lookups; the table's UNIQUE constraints remain authoritative.
async fn ensure_unique(
    storage: &ContactsStorage,
    valid: &ValidContact,
    exclude_id: Option<i64>,
) -> Result<(), ContactsError> {
    if storage.exists_by_contact(&valid.contact, exclude_id).await? {
        return Err(ContactsError::DuplicateContact);
    }
    if storage.exists_by_email(&valid.email, exclude_id).await? {
        return Err(ContactsError::DuplicateEmail);
    }
    Ok(())
}

fn into_fields(valid: ValidContact, picture: String) -> ContactFields {
    ContactFields {
        name: valid.name,
        contact: valid.contact,
        email: valid.email,
        picture,
    }
}

/// The row is already gone or repointed, so a failed delete only leaves a
/// stray file behind; log it rather than failing the request.
async fn remove_picture(state: &ContactsState, relative: &str) {
    if let Err(e) = state.uploads.remove(relative).await {
        warn!(path = %relative, error = %e, "failed to remove picture");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_digits_only() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("007").unwrap(), 7);
        for bad in ["", "abc", "-1", "1.5", " 1", "1e3"] {
            assert!(
                matches!(parse_id(bad), Err(ContactsError::InvalidId)),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_id_overflow_is_not_found() {
        assert!(matches!(
            parse_id("99999999999999999999999"),
            Err(ContactsError::NotFound)
        ));
    }
}
