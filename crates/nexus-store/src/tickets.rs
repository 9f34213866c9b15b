use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, instrument};

use nexus_core::directory::FacultyWorkload;
use nexus_core::ids::{TicketId, UserId};
use nexus_core::stats::{AssigneeCounts, StatusCounts};
use nexus_core::ticket::{
    TicketDraft, TicketFields, TicketFilter, TicketRecord, TicketUpdate, TicketVersion,
    UpdateOutcome,
};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;
use crate::users::{is_faculty, row_to_faculty};

const SELECT_TICKET: &str = "SELECT t.id, t.author_id, u.display_name, t.category, t.subject, t.message,
        t.status, t.priority, t.assigned_to, t.created_at, t.updated_at
 FROM tickets t LEFT JOIN users u ON u.id = t.author_id";

pub struct TicketRepo {
    db: Database,
}

impl TicketRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new ticket: `pending`, unassigned, `updated_at == created_at`.
    #[instrument(skip(self, draft), fields(author_id = %draft.author_id, priority = %draft.priority))]
    pub fn insert(&self, draft: &TicketDraft) -> Result<TicketId, StoreError> {
        self.db.with_conn(|conn| insert_ticket(conn, draft))
    }

    #[instrument(skip(self), fields(ticket_id = %id))]
    pub fn get(&self, id: TicketId) -> Result<Option<TicketRecord>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_TICKET} WHERE t.id = ?1"))?;
            let mut rows = stmt.query([id.get()])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_ticket(row)?)),
                None => Ok(None),
            }
        })
    }

    /// Tickets matching the filter, newest first.
    #[instrument(skip(self))]
    pub fn list(&self, filter: &TicketFilter) -> Result<Vec<TicketRecord>, StoreError> {
        self.db.with_conn(|conn| {
            let mut sql = format!("{SELECT_TICKET} WHERE 1=1");
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(author) = filter.author {
                params.push(Box::new(author.get()));
                sql.push_str(&format!(" AND t.author_id = ?{}", params.len()));
            }
            if let Some(ref assignee) = filter.assignee {
                params.push(Box::new(assignee.clone()));
                sql.push_str(&format!(" AND t.assigned_to = ?{}", params.len()));
            }
            if filter.open_only {
                sql.push_str(" AND t.status != 'resolved'");
            }
            sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");

            let mut stmt = conn.prepare(&sql)?;
            let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            let mut rows = stmt.query(param_refs.as_slice())?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_ticket(row)?);
            }
            Ok(results)
        })
    }

    /// Compare-and-set: the row is re-read inside the transaction and
    /// written only if it still matches `update.expected` and a new
    /// assignee is on the faculty roster at that moment.
    #[instrument(skip(self, update), fields(ticket_id = %id, status = %update.fields.status))]
    pub fn update(&self, id: TicketId, update: &TicketUpdate) -> Result<UpdateOutcome, StoreError> {
        self.db.with_tx(|tx| {
            let current = tx
                .query_row(
                    "SELECT assigned_to, updated_at FROM tickets WHERE id = ?1",
                    [id.get()],
                    |row| Ok(row_to_version(row)),
                )
                .optional()?
                .transpose()?;
            let Some(current) = current else {
                return Err(StoreError::NotFound(format!("{id}")));
            };
            if current != update.expected {
                debug!(assigned_to = ?current.assigned_to, "ticket changed since it was read");
                return Ok(UpdateOutcome::Stale);
            }
            if let Some(name) = update.new_assignee() {
                if !is_faculty(tx, name)? {
                    return Ok(UpdateOutcome::UnknownAssignee);
                }
            }
            write_fields(tx, id, &update.fields)?;
            Ok(UpdateOutcome::Applied)
        })
    }

    /// All four counts come from one aggregate query, so they always
    /// describe the same set of rows.
    #[instrument(skip(self))]
    pub fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(status = 'pending'), 0),
                        COALESCE(SUM(status = 'processing'), 0),
                        COALESCE(SUM(status = 'resolved'), 0)
                 FROM tickets",
                [],
                |row| Ok(row_to_status_counts(row)),
            )?
        })
    }

    #[instrument(skip(self))]
    pub fn count_by_assignee(&self, display_name: &str) -> Result<AssigneeCounts, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(status = 'resolved'), 0)
                 FROM tickets WHERE assigned_to = ?1",
                [display_name],
                |row| Ok(row_to_assignee_counts(row)),
            )?
        })
    }

    /// Roster and per-member counts joined in a single statement.
    #[instrument(skip(self))]
    pub fn faculty_workload(&self) -> Result<Vec<FacultyWorkload>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.display_name, u.email, u.phone,
                        COUNT(t.id),
                        COALESCE(SUM(t.status = 'resolved'), 0)
                 FROM users u
                 LEFT JOIN tickets t ON t.assigned_to = u.display_name
                 WHERE u.role = 'faculty'
                 GROUP BY u.id
                 ORDER BY u.display_name, u.id",
            )?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(FacultyWorkload {
                    member: row_to_faculty(row)?,
                    total_assigned: row_helpers::get_count(row, 5, "tickets", "id")?,
                    resolved: row_helpers::get_count(row, 6, "tickets", "status")?,
                });
            }
            Ok(results)
        })
    }
}

pub(crate) fn insert_ticket(conn: &Connection, draft: &TicketDraft) -> Result<TicketId, StoreError> {
    let now = row_helpers::format_timestamp(&draft.created_at);
    conn.execute(
        "INSERT INTO tickets (author_id, category, subject, message, status, priority, assigned_to, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, NULL, ?6, ?6)",
        rusqlite::params![
            draft.author_id.get(),
            draft.category,
            draft.subject,
            draft.message,
            draft.priority.as_str(),
            now,
        ],
    )?;
    Ok(TicketId::new(conn.last_insert_rowid()))
}

/// Unchecked overwrite of the mutable fields.
pub(crate) fn write_fields(conn: &Connection, id: TicketId, fields: &TicketFields) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE tickets SET status = ?1, priority = ?2, assigned_to = ?3, updated_at = ?4
         WHERE id = ?5",
        rusqlite::params![
            fields.status.as_str(),
            fields.priority.as_str(),
            fields.assigned_to,
            row_helpers::format_timestamp(&fields.updated_at),
            id.get(),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(format!("{id}")));
    }
    Ok(())
}

fn row_to_version(row: &rusqlite::Row<'_>) -> Result<TicketVersion, StoreError> {
    Ok(TicketVersion {
        assigned_to: row_helpers::get(row, 0, "tickets", "assigned_to")?,
        updated_at: row_helpers::get_timestamp(row, 1, "tickets", "updated_at")?,
    })
}

fn row_to_ticket(row: &rusqlite::Row<'_>) -> Result<TicketRecord, StoreError> {
    Ok(TicketRecord {
        id: TicketId::new(row_helpers::get(row, 0, "tickets", "id")?),
        author_id: UserId::new(row_helpers::get(row, 1, "tickets", "author_id")?),
        author_name: row_helpers::get(row, 2, "users", "display_name")?,
        category: row_helpers::get(row, 3, "tickets", "category")?,
        subject: row_helpers::get(row, 4, "tickets", "subject")?,
        message: row_helpers::get(row, 5, "tickets", "message")?,
        status: row_helpers::get_enum(row, 6, "tickets", "status")?,
        priority: row_helpers::get_enum(row, 7, "tickets", "priority")?,
        assigned_to: row_helpers::get(row, 8, "tickets", "assigned_to")?,
        created_at: row_helpers::get_timestamp(row, 9, "tickets", "created_at")?,
        updated_at: row_helpers::get_timestamp(row, 10, "tickets", "updated_at")?,
    })
}

fn row_to_status_counts(row: &rusqlite::Row<'_>) -> Result<StatusCounts, StoreError> {
    Ok(StatusCounts {
        total: row_helpers::get_count(row, 0, "tickets", "id")?,
        pending: row_helpers::get_count(row, 1, "tickets", "status")?,
        processing: row_helpers::get_count(row, 2, "tickets", "status")?,
        resolved: row_helpers::get_count(row, 3, "tickets", "status")?,
    })
}

fn row_to_assignee_counts(row: &rusqlite::Row<'_>) -> Result<AssigneeCounts, StoreError> {
    Ok(AssigneeCounts {
        total: row_helpers::get_count(row, 0, "tickets", "id")?,
        resolved: row_helpers::get_count(row, 1, "tickets", "status")?,
    })
}
