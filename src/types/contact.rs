use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Raw contact fields as submitted by a client. Any of them may be missing.
///
/// Non-string JSON values count as missing so that they surface as
/// validation errors rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ContactPayload {
    #[serde(default, deserialize_with = "text_or_missing")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text_or_missing")]
    pub contact: Option<String>,
    #[serde(default, deserialize_with = "text_or_missing")]
    pub email: Option<String>,
}

/// A payload that passed validation, already normalized for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub contact: String,
    pub email: String,
}

fn text_or_missing<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Field::deserialize(deserializer)? {
        Field::Text(text) => Some(text),
        Field::Other(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_fields_are_kept() {
        let payload: ContactPayload = serde_json::from_str(
            r#"{"name": "Alice Doe", "contact": "123456789", "email": "a@b.com"}"#,
        )
        .unwrap();
        assert_eq!(payload.name.as_deref(), Some("Alice Doe"));
        assert_eq!(payload.contact.as_deref(), Some("123456789"));
        assert_eq!(payload.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn non_string_fields_count_as_missing() {
        let payload: ContactPayload = serde_json::from_str(
            r#"{"name": 12345, "contact": 123456789, "email": null, "extra": true}"#,
        )
        .unwrap();
        assert_eq!(payload, ContactPayload::default());
    }

    #[test]
    fn absent_fields_are_missing() {
        let payload: ContactPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload, ContactPayload::default());
    }
}
