//! Ticket creation, status/priority/assignment updates, and the statistics
//! derived from ticket state.
//!
//! The status machine is permissive: any status may follow any other. What
//! is constrained is who may change which fields, decided by the [`Scope`]
//! the authorizer returned.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use nexus_core::directory::FacultyWorkload;
use nexus_core::errors::REASON_FACULTY_STATUS_ONLY;
use nexus_core::inputs::{CommentInput, CreateTicketInput, UpdateTicketInput};
use nexus_core::stats::FacultyStats;
use nexus_core::ticket::{
    CommentDraft, Priority, TicketDraft, TicketFields, TicketRecord, TicketStatus, TicketUpdate,
};
use nexus_core::{DeskError, DeskResult, Principal};

use crate::policy::Scope;

pub const MAX_CATEGORY_LEN: usize = 64;
pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;
pub const MAX_COMMENT_LEN: usize = 2000;

/// Trimmed, non-empty, at most `max` characters.
pub(crate) fn required_text(value: Option<&str>, field: &str, max: usize) -> DeskResult<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(DeskError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(DeskError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn parse_status(raw: &str) -> DeskResult<TicketStatus> {
    raw.trim().parse().map_err(DeskError::Validation)
}

fn parse_priority(raw: &str) -> DeskResult<Priority> {
    raw.trim().parse().map_err(DeskError::Validation)
}

/// Build the draft for a new ticket. The author is always the caller.
pub fn new_ticket(
    author: &Principal,
    input: &CreateTicketInput,
    now: DateTime<Utc>,
) -> DeskResult<TicketDraft> {
    let category = required_text(input.category.as_deref(), "category", MAX_CATEGORY_LEN)?;
    let subject = required_text(input.subject.as_deref(), "subject", MAX_SUBJECT_LEN)?;
    let message = required_text(input.message.as_deref(), "message", MAX_MESSAGE_LEN)?;
    let priority = match input.priority.as_deref() {
        Some(raw) => parse_priority(raw)?,
        None => return Err(DeskError::validation("priority is required")),
    };

    Ok(TicketDraft {
        author_id: author.id,
        category,
        subject,
        message,
        priority,
        created_at: now,
    })
}

pub fn new_comment(
    author: &Principal,
    ticket: &TicketRecord,
    input: &CommentInput,
    now: DateTime<Utc>,
) -> DeskResult<CommentDraft> {
    Ok(CommentDraft {
        ticket_id: ticket.id,
        author_id: author.id,
        author_name: author.display_name.clone(),
        body: required_text(input.body.as_deref(), "comment", MAX_COMMENT_LEN)?,
        created_at: now,
    })
}

/// Apply `input` on top of `ticket` within `scope`.
///
/// Absent fields keep their current value. An explicit `null` or blank
/// `assigned_to` clears the assignee. Under [`Scope::Assigned`] only the
/// status may differ from the current ticket. The result is pinned to
/// `ticket`'s version, so the store refuses it if the ticket moved on.
pub fn plan_update(
    ticket: &TicketRecord,
    scope: Scope,
    input: &UpdateTicketInput,
    now: DateTime<Utc>,
) -> DeskResult<TicketUpdate> {
    if input.is_empty() {
        return Err(DeskError::validation("no fields to update"));
    }

    let status = match input.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => ticket.status,
    };
    let priority = match input.priority.as_deref() {
        Some(raw) => parse_priority(raw)?,
        None => ticket.priority,
    };
    let assigned_to = match &input.assigned_to {
        None => ticket.assigned_to.clone(),
        Some(value) => value
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    };

    let priority_changed = priority != ticket.priority;
    let assignee_changed = assigned_to != ticket.assigned_to;
    if scope == Scope::Assigned && (priority_changed || assignee_changed) {
        return Err(DeskError::forbidden(REASON_FACULTY_STATUS_ONLY));
    }

    Ok(TicketUpdate {
        fields: TicketFields {
            status,
            priority,
            assigned_to,
            updated_at: now,
        },
        expected: ticket.version(),
    })
}

/// Open tickets, high priority first, creation order within a priority.
pub fn order_tasks(mut tickets: Vec<TicketRecord>) -> Vec<TicketRecord> {
    tickets.retain(|t| t.status.is_open());
    tickets.sort_by_key(|t| (Reverse(t.priority == Priority::High), t.created_at, t.id));
    tickets
}

pub fn faculty_stats(workload: Vec<FacultyWorkload>) -> Vec<FacultyStats> {
    workload
        .into_iter()
        .map(|w| FacultyStats {
            id: w.member.id,
            name: w.member.display_name,
            username: w.member.username,
            email: w.member.email,
            phone: w.member.phone,
            total_assigned: w.total_assigned,
            resolved: w.resolved,
            pending: w.total_assigned.saturating_sub(w.resolved),
        })
        .collect()
}
