//! Raw request payloads as they arrive from the transport layer.
//!
//! Every field is optional or loosely typed on purpose: the engine turns
//! these into validated drafts and reports missing or malformed fields as
//! `DeskError::Validation` instead of letting deserialization reject them.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateTicketInput {
    pub category: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub priority: Option<String>,
}

/// Partial ticket update. `assigned_to` distinguishes "absent" (keep the
/// current assignee) from an explicit `null` or empty string (clear it).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateTicketInput {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub assigned_to: Option<Option<String>>,
}

impl UpdateTicketInput {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.assigned_to.is_none()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommentInput {
    #[serde(alias = "comment")]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddFacultyInput {
    pub username: Option<String>,
    #[serde(default, deserialize_with = "optional_secret")]
    pub password: Option<SecretString>,
    #[serde(alias = "full_name")]
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn assigned_to_absent_vs_null_vs_value() {
        let absent: UpdateTicketInput = serde_json::from_str(r#"{"status":"resolved"}"#).unwrap();
        assert_eq!(absent.assigned_to, None);

        let null: UpdateTicketInput = serde_json::from_str(r#"{"assigned_to":null}"#).unwrap();
        assert_eq!(null.assigned_to, Some(None));

        let set: UpdateTicketInput =
            serde_json::from_str(r#"{"assigned_to":"Prof. X"}"#).unwrap();
        assert_eq!(set.assigned_to, Some(Some("Prof. X".to_string())));
    }

    #[test]
    fn empty_update_detected() {
        let input: UpdateTicketInput = serde_json::from_str("{}").unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn comment_accepts_legacy_field_name() {
        let input: CommentInput = serde_json::from_str(r#"{"comment":"on it"}"#).unwrap();
        assert_eq!(input.body.as_deref(), Some("on it"));
    }

    #[test]
    fn login_password_is_redacted_in_debug() {
        let input: LoginInput =
            serde_json::from_str(r#"{"username":"dean","password":"dean123"}"#).unwrap();
        assert_eq!(input.password.expose_secret(), "dean123");
        assert!(!format!("{input:?}").contains("dean123"));
    }

    #[test]
    fn add_faculty_accepts_full_name_alias() {
        let input: AddFacultyInput = serde_json::from_str(
            r#"{"username":"grant","password":"pw","full_name":"Prof. Alan Grant"}"#,
        )
        .unwrap();
        assert_eq!(input.display_name.as_deref(), Some("Prof. Alan Grant"));
        assert!(input.email.is_none());
    }
}
