use chrono::{DateTime, Utc};
use serde::Serialize;

use nexus_core::ids::{TicketId, UserId};
use nexus_core::ticket::{Comment, Priority, TicketRecord, TicketStatus};
use nexus_core::{DeskResult, Principal};

use crate::policy::{self, Action, Scope};

pub const ANONYMOUS_AUTHOR: &str = "Anonymous Student";
pub const FORMER_USER: &str = "Former User";

/// A ticket as a particular viewer is allowed to see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TicketView {
    pub id: TicketId,
    /// Omitted when the author is redacted for this viewer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    pub author_name: String,
    pub category: String,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketView,
    pub comments: Vec<Comment>,
}

/// Whether `viewer` sees the real author of `ticket`.
pub fn reveals_author(viewer: &Principal, ticket: &TicketRecord) -> bool {
    ticket.is_authored_by(viewer.id) || viewer.role.sees_author_identity()
}

pub fn redact(viewer: &Principal, ticket: TicketRecord) -> TicketView {
    let (author_id, author_name) = if reveals_author(viewer, &ticket) {
        (
            Some(ticket.author_id),
            ticket.author_name.unwrap_or_else(|| FORMER_USER.to_string()),
        )
    } else {
        (None, ANONYMOUS_AUTHOR.to_string())
    };

    TicketView {
        id: ticket.id,
        author_id,
        author_name,
        category: ticket.category,
        subject: ticket.subject,
        message: ticket.message,
        status: ticket.status,
        priority: ticket.priority,
        assigned_to: ticket.assigned_to,
        created_at: ticket.created_at,
        updated_at: ticket.updated_at,
    }
}

/// Narrow `tickets` to what `viewer` may list, newest first, redacted.
pub fn filter_list(viewer: &Principal, tickets: Vec<TicketRecord>) -> DeskResult<Vec<TicketView>> {
    let scope = policy::authorize(viewer, Action::ListTickets, None)?;
    let mut visible: Vec<TicketRecord> = tickets
        .into_iter()
        .filter(|t| scope != Scope::Own || t.is_authored_by(viewer.id))
        .collect();
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(visible.into_iter().map(|t| redact(viewer, t)).collect())
}

/// Detail view with comments oldest first. Comment authors are shown as
/// written.
pub fn filter_detail(
    viewer: &Principal,
    ticket: TicketRecord,
    mut comments: Vec<Comment>,
) -> DeskResult<TicketDetail> {
    policy::authorize(viewer, Action::ViewTicket, Some(&ticket))?;
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(TicketDetail {
        ticket: redact(viewer, ticket),
        comments,
    })
}
