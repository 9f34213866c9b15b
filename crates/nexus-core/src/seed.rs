//! Demo data handed to the store as a single batch. Tickets and comments
//! refer to users and tickets by their position in the batch, since ids do
//! not exist until the rows are inserted.

use chrono::{DateTime, Utc};

use crate::directory::NewUser;
use crate::ticket::{Priority, TicketStatus};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedBatch {
    pub users: Vec<NewUser>,
    pub tickets: Vec<SeedTicket>,
    pub comments: Vec<SeedComment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedTicket {
    /// Index into `SeedBatch::users`.
    pub author: usize,
    pub category: String,
    pub subject: String,
    pub message: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub handled: Option<SeedHandling>,
}

/// Status and assignee a seeded ticket is moved to after insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedHandling {
    pub status: TicketStatus,
    pub assigned_to: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedComment {
    /// Index into `SeedBatch::tickets`.
    pub ticket: usize,
    /// Index into `SeedBatch::users`; the comment carries that user's
    /// display name.
    pub author: usize,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
