use rusqlite::Connection;
use tracing::instrument;

use nexus_core::ids::{CommentId, TicketId, UserId};
use nexus_core::ticket::{Comment, CommentDraft};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

pub struct CommentRepo {
    db: Database,
}

impl CommentRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append a comment. Fails with `NotFound` if the ticket is gone.
    #[instrument(skip(self, draft), fields(ticket_id = %draft.ticket_id, author_id = %draft.author_id))]
    pub fn insert(&self, draft: &CommentDraft) -> Result<CommentId, StoreError> {
        self.db.with_tx(|tx| insert_comment(tx, draft))
    }

    /// Comments for a ticket, oldest first.
    #[instrument(skip(self), fields(ticket_id = %ticket_id))]
    pub fn list(&self, ticket_id: TicketId) -> Result<Vec<Comment>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, ticket_id, author_id, author_name, body, created_at
                 FROM comments WHERE ticket_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let mut rows = stmt.query([ticket_id.get()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_comment(row)?);
            }
            Ok(results)
        })
    }
}

pub(crate) fn insert_comment(conn: &Connection, draft: &CommentDraft) -> Result<CommentId, StoreError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tickets WHERE id = ?1)",
        [draft.ticket_id.get()],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(StoreError::NotFound(format!("{}", draft.ticket_id)));
    }

    conn.execute(
        "INSERT INTO comments (ticket_id, author_id, author_name, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            draft.ticket_id.get(),
            draft.author_id.get(),
            draft.author_name,
            draft.body,
            row_helpers::format_timestamp(&draft.created_at),
        ],
    )?;
    Ok(CommentId::new(conn.last_insert_rowid()))
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> Result<Comment, StoreError> {
    Ok(Comment {
        id: CommentId::new(row_helpers::get(row, 0, "comments", "id")?),
        ticket_id: TicketId::new(row_helpers::get(row, 1, "comments", "ticket_id")?),
        author_id: UserId::new(row_helpers::get(row, 2, "comments", "author_id")?),
        author_name: row_helpers::get(row, 3, "comments", "author_name")?,
        body: row_helpers::get(row, 4, "comments", "body")?,
        created_at: row_helpers::get_timestamp(row, 5, "comments", "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tickets::tests::draft;
    use crate::tickets::TicketRepo;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    fn comment(ticket_id: TicketId, body: &str, minutes: i64) -> CommentDraft {
        CommentDraft {
            ticket_id,
            author_id: UserId::new(1),
            author_name: "Dr. J Dean".to_string(),
            body: body.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn comments_come_back_oldest_first() {
        let db = Database::in_memory().unwrap();
        let ticket = TicketRepo::new(db.clone())
            .insert(&draft(UserId::new(5), "wifi", 0))
            .unwrap();
        let repo = CommentRepo::new(db);
        repo.insert(&comment(ticket, "second", 10)).unwrap();
        repo.insert(&comment(ticket, "first", 1)).unwrap();

        let bodies: Vec<_> = repo
            .list(ticket)
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[test]
    fn comment_on_missing_ticket_is_not_found() {
        let repo = CommentRepo::new(Database::in_memory().unwrap());
        let err = repo.insert(&comment(TicketId::new(3), "hello", 0)).unwrap_err();
        assert_matches!(err, StoreError::NotFound(_));
        assert!(repo.list(TicketId::new(3)).unwrap().is_empty());
    }

    #[test]
    fn author_name_is_a_snapshot() {
        let db = Database::in_memory().unwrap();
        let ticket = TicketRepo::new(db.clone())
            .insert(&draft(UserId::new(5), "wifi", 0))
            .unwrap();
        let repo = CommentRepo::new(db);
        let id = repo.insert(&comment(ticket, "on it", 0)).unwrap();
        let stored = &repo.list(ticket).unwrap()[0];
        assert_eq!(stored.id, id);
        assert_eq!(stored.author_name, "Dr. J Dean");
        assert_eq!(stored.ticket_id, ticket);
    }
}
