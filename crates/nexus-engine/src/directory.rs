use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;

use nexus_core::directory::NewUser;
use nexus_core::inputs::AddFacultyInput;
use nexus_core::{DeskError, DeskResult, Role};

use crate::credentials::Credentials;
use crate::lifecycle::required_text;

pub const MAX_USERNAME_LEN: usize = 64;
pub const MAX_DISPLAY_NAME_LEN: usize = 100;
pub const MAX_CONTACT_LEN: usize = 100;

/// Blank contact fields are stored as absent.
fn optional_text(value: Option<&str>, field: &str) -> DeskResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > MAX_CONTACT_LEN => Err(DeskError::validation(format!(
            "{field} must be at most {MAX_CONTACT_LEN} characters"
        ))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Validate an add-faculty request and hash its password.
pub fn new_faculty(
    input: &AddFacultyInput,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> DeskResult<NewUser> {
    let username = required_text(input.username.as_deref(), "username", MAX_USERNAME_LEN)?;
    if username.chars().any(char::is_whitespace) {
        return Err(DeskError::validation("username must not contain whitespace"));
    }
    let display_name =
        required_text(input.display_name.as_deref(), "display name", MAX_DISPLAY_NAME_LEN)?;
    let password = match &input.password {
        Some(p) if !p.expose_secret().is_empty() => p,
        _ => return Err(DeskError::validation("password is required")),
    };

    Ok(NewUser {
        username,
        password_hash: credentials.hash(password)?,
        role: Role::Faculty,
        display_name,
        email: optional_text(input.email.as_deref(), "email")?,
        phone: optional_text(input.phone.as_deref(), "phone")?,
        created_at: now,
    })
}
