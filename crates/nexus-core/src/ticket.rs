use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, TicketId, UserId};

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Pending,
    Processing,
    Resolved,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [Self::Pending, Self::Processing, Self::Resolved];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Resolved => "resolved",
        }
    }

    pub fn is_open(self) -> bool {
        self != Self::Resolved
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A persisted ticket joined with its author's current display name.
///
/// `author_name` is `None` once the author's account has been deleted; the
/// ticket itself survives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: TicketId,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub category: String,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub priority: Priority,
    /// Weak reference to a faculty member by display name.
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketRecord {
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author_id == user
    }

    pub fn is_assigned_to(&self, display_name: &str) -> bool {
        self.assigned_to.as_deref() == Some(display_name)
    }

    pub fn version(&self) -> TicketVersion {
        TicketVersion {
            assigned_to: self.assigned_to.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Append-only comment on a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    /// Author's display name at the time of writing.
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Validated ticket ready for insertion. Status always starts `pending`
/// and the assignee empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketDraft {
    pub author_id: UserId,
    pub category: String,
    pub subject: String,
    pub message: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentDraft {
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The complete mutable state of a ticket after an accepted update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketFields {
    pub status: TicketStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The part of a ticket an update decision depends on. `delete_user`
/// clears `assigned_to` without touching `updated_at`, so both are compared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketVersion {
    pub assigned_to: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// New field values plus the version they were computed from. The store
/// writes them only while the ticket is still at `expected`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketUpdate {
    pub fields: TicketFields,
    pub expected: TicketVersion,
}

impl TicketUpdate {
    /// The assignee this update moves the ticket to, if it changes to a
    /// non-empty name.
    pub fn new_assignee(&self) -> Option<&str> {
        match &self.fields.assigned_to {
            Some(name) if self.expected.assigned_to.as_ref() != Some(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The ticket no longer matches `TicketUpdate::expected`; nothing written.
    Stale,
    /// The new assignee is not on the faculty roster; nothing written.
    UnknownAssignee,
}

/// Row selection for `FeedbackStore::list_tickets`. Empty filter = all rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub author: Option<UserId>,
    pub assignee: Option<String>,
    pub open_only: bool,
}

impl TicketFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn authored_by(user: UserId) -> Self {
        Self {
            author: Some(user),
            ..Self::default()
        }
    }

    pub fn open_assigned_to(display_name: impl Into<String>) -> Self {
        Self {
            assignee: Some(display_name.into()),
            open_only: true,
            ..Self::default()
        }
    }
}
