/// Error taxonomy for every desk operation.
///
/// The first five variants are caller-facing outcomes; `Storage` covers
/// collaborator failures and is reported without internal detail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeskError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type DeskResult<T> = Result<T, DeskError>;

pub const REASON_UNAUTHORIZED: &str = "unauthorized";
pub const REASON_NOT_ASSIGNED: &str = "not assigned to you";
pub const REASON_NOT_OWNER: &str = "not your ticket";
pub const REASON_FACULTY_STATUS_ONLY: &str = "faculty may only change status";

impl DeskError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn unauthorized() -> Self {
        Self::Forbidden(REASON_UNAUTHORIZED.to_string())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    /// Short classification string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether the error is the caller's fault rather than the system's.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn constructors_pick_variant() {
        assert_matches!(DeskError::unauthorized(), DeskError::Forbidden(r) if r == "unauthorized");
        assert_matches!(DeskError::not_found("ticket#4"), DeskError::NotFound(_));
        assert_matches!(DeskError::validation("subject is required"), DeskError::Validation(_));
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            DeskError::forbidden(REASON_NOT_ASSIGNED).to_string(),
            "forbidden: not assigned to you"
        );
        assert_eq!(DeskError::Unauthenticated.to_string(), "authentication required");
        assert_eq!(
            DeskError::Conflict("username taken".into()).to_string(),
            "conflict: username taken"
        );
    }

    #[test]
    fn kind_strings() {
        assert_eq!(DeskError::Unauthenticated.kind(), "unauthenticated");
        assert_eq!(DeskError::unauthorized().kind(), "forbidden");
        assert_eq!(DeskError::Storage("disk".into()).kind(), "storage");
    }

    #[test]
    fn storage_is_not_a_client_error() {
        assert!(DeskError::validation("x").is_client_error());
        assert!(!DeskError::Storage("locked".into()).is_client_error());
    }
}
