use crate::error::ContactsError;
use crate::types::contact::{ContactPayload, ValidContact};
use regex::Regex;
use std::sync::LazyLock;

pub const NAME_MIN_CHARS: usize = 5;

const NAME_MESSAGE: &str = "the name must be a string with at least 5 characters";
const CONTACT_MESSAGE: &str = "the contact must be a string of exactly 9 digits";
const EMAIL_MESSAGE: &str = "the email must be a valid email address";

// ASCII digits only; `\d` would also accept other Unicode digits.
static CONTACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{9}$").expect("contact pattern compiles"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Check field constraints and return every violation, in field order.
/// An empty list means the payload is valid.
pub fn validate_contact(payload: &ContactPayload) -> Vec<String> {
    let mut errors = Vec::new();

    let name_ok = payload
        .name
        .as_deref()
        .is_some_and(|n| n.trim().chars().count() >= NAME_MIN_CHARS);
    if !name_ok {
        errors.push(NAME_MESSAGE.to_string());
    }

    if !payload.contact.as_deref().is_some_and(|c| CONTACT_RE.is_match(c)) {
        errors.push(CONTACT_MESSAGE.to_string());
    }

    if !payload.email.as_deref().is_some_and(|e| EMAIL_RE.is_match(e)) {
        errors.push(EMAIL_MESSAGE.to_string());
    }

    errors
}

impl ContactPayload {
    /// Validate and normalize: name trimmed, email trimmed and lower-cased.
    pub fn into_valid(self) -> Result<ValidContact, ContactsError> {
        let errors = validate_contact(&self);
        let (Some(name), Some(contact), Some(email)) = (self.name, self.contact, self.email) else {
            return Err(ContactsError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(ContactsError::Validation(errors));
        }

        Ok(ValidContact {
            name: name.trim().to_string(),
            contact,
            email: email.trim().to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, contact: &str, email: &str) -> ContactPayload {
        ContactPayload {
            name: Some(name.to_string()),
            contact: Some(contact.to_string()),
            email: Some(email.to_string()),
        }
    }

    #[test]
    fn accepts_well_formed_payload() {
        assert!(validate_contact(&payload("Alice Doe", "123456789", "a@b.com")).is_empty());
    }

    #[test]
    fn name_length_counts_trimmed_characters() {
        assert_eq!(
            validate_contact(&payload("  Ali  ", "123456789", "a@b.com")),
            vec![NAME_MESSAGE]
        );
        assert!(validate_contact(&payload("  Alice  ", "123456789", "a@b.com")).is_empty());
        assert!(validate_contact(&payload("Zoë Ñú", "123456789", "a@b.com")).is_empty());
    }

    #[test]
    fn contact_must_be_exactly_nine_ascii_digits() {
        for bad in ["12345678", "1234567890", "12345678a", " 123456789", "١٢٣٤٥٦٧٨٩"] {
            assert_eq!(
                validate_contact(&payload("Alice Doe", bad, "a@b.com")),
                vec![CONTACT_MESSAGE],
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn email_needs_local_domain_and_tld() {
        for bad in ["ab.com", "a@b", "a@@b.com", "a b@c.com", "@b.com"] {
            assert_eq!(
                validate_contact(&payload("Alice Doe", "123456789", bad)),
                vec![EMAIL_MESSAGE],
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_fields_report_every_violation() {
        let errors = validate_contact(&ContactPayload::default());
        assert_eq!(errors, vec![NAME_MESSAGE, CONTACT_MESSAGE, EMAIL_MESSAGE]);
    }

    #[test]
    fn into_valid_normalizes() {
        let valid = payload("  Alice Doe ", "123456789", "Alice@Example.COM")
            .into_valid()
            .unwrap();
        assert_eq!(valid.name, "Alice Doe");
        assert_eq!(valid.email, "alice@example.com");
        assert_eq!(valid.contact, "123456789");
    }

    #[test]
    fn into_valid_carries_messages() {
        let err = payload("Al", "123", "nope").into_valid().unwrap_err();
        match err {
            ContactsError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
