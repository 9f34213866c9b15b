use tracing::{debug, instrument};

use nexus_core::ids::{TicketId, UserId};
use nexus_core::seed::SeedBatch;
use nexus_core::ticket::{CommentDraft, TicketDraft, TicketFields};

use crate::comments::insert_comment;
use crate::database::Database;
use crate::error::StoreError;
use crate::tickets::{insert_ticket, write_fields};
use crate::users::{count_users, insert_user};

fn pick<T: Copy>(ids: &[T], index: usize, what: &str) -> Result<T, StoreError> {
    ids.get(index)
        .copied()
        .ok_or_else(|| StoreError::Database(format!("seed {what} #{index} does not exist")))
}

/// Insert `batch` in one transaction if the users table is empty. Any
/// failure rolls the whole batch back, so a later start can try again.
#[instrument(skip(db, batch), fields(users = batch.users.len(), tickets = batch.tickets.len()))]
pub fn seed_if_empty(db: &Database, batch: &SeedBatch) -> Result<bool, StoreError> {
    db.with_tx(|tx| {
        if count_users(tx)? > 0 {
            debug!("directory not empty, skipping seed");
            return Ok(false);
        }

        let users = batch
            .users
            .iter()
            .map(|user| insert_user(tx, user))
            .collect::<Result<Vec<UserId>, _>>()?;

        let mut tickets: Vec<TicketId> = Vec::with_capacity(batch.tickets.len());
        for ticket in &batch.tickets {
            let id = insert_ticket(
                tx,
                &TicketDraft {
                    author_id: pick(&users, ticket.author, "user")?,
                    category: ticket.category.clone(),
                    subject: ticket.subject.clone(),
                    message: ticket.message.clone(),
                    priority: ticket.priority,
                    created_at: ticket.created_at,
                },
            )?;
            if let Some(handled) = &ticket.handled {
                write_fields(
                    tx,
                    id,
                    &TicketFields {
                        status: handled.status,
                        priority: ticket.priority,
                        assigned_to: Some(handled.assigned_to.clone()),
                        updated_at: handled.updated_at,
                    },
                )?;
            }
            tickets.push(id);
        }

        for comment in &batch.comments {
            let author = batch.users.get(comment.author).ok_or_else(|| {
                StoreError::Database(format!("seed user #{} does not exist", comment.author))
            })?;
            insert_comment(
                tx,
                &CommentDraft {
                    ticket_id: pick(&tickets, comment.ticket, "ticket")?,
                    author_id: pick(&users, comment.author, "user")?,
                    author_name: author.display_name.clone(),
                    body: comment.body.clone(),
                    created_at: comment.created_at,
                },
            )?;
        }
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::tests::new_user;
    use crate::SqliteStore;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use nexus_core::seed::{SeedComment, SeedHandling, SeedTicket};
    use nexus_core::ticket::{Priority, TicketFilter, TicketStatus};
    use nexus_core::{FeedbackStore, Role};

    fn batch() -> SeedBatch {
        let now = Utc::now();
        SeedBatch {
            users: vec![
                new_user("student", Role::Student, "Student User"),
                new_user("grant", Role::Faculty, "Prof. Alan Grant"),
            ],
            tickets: vec![SeedTicket {
                author: 0,
                category: "facility".into(),
                subject: "Projector".into(),
                message: "flickers".into(),
                priority: Priority::High,
                created_at: now,
                handled: Some(SeedHandling {
                    status: TicketStatus::Processing,
                    assigned_to: "Prof. Alan Grant".into(),
                    updated_at: now,
                }),
            }],
            comments: vec![SeedComment {
                ticket: 0,
                author: 1,
                body: "On it.".into(),
                created_at: now,
            }],
        }
    }

    #[test]
    fn seeds_an_empty_directory_once() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(seed_if_empty(store.database(), &batch()).unwrap());
        assert!(!seed_if_empty(store.database(), &batch()).unwrap());

        assert_eq!(store.count_users().unwrap(), 2);
        let tickets = store.list_tickets(&TicketFilter::all()).unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(tickets[0].is_assigned_to("Prof. Alan Grant"));
        let comments = store.get_comments(tickets[0].id).unwrap();
        assert_eq!(comments[0].author_name, "Prof. Alan Grant");
    }

    #[test]
    fn failed_batch_leaves_nothing_behind() {
        let store = SqliteStore::in_memory().unwrap();
        let mut broken = batch();
        broken.comments[0].ticket = 5;
        assert_matches!(
            seed_if_empty(store.database(), &broken),
            Err(StoreError::Database(_))
        );
        assert_eq!(store.count_users().unwrap(), 0);
        assert!(store.list_tickets(&TicketFilter::all()).unwrap().is_empty());

        let mut duplicate = batch();
        duplicate.users.push(new_user("student", Role::Student, "Again"));
        assert_matches!(
            seed_if_empty(store.database(), &duplicate),
            Err(StoreError::Conflict(_))
        );
        assert_eq!(store.count_users().unwrap(), 0);

        assert!(seed_if_empty(store.database(), &batch()).unwrap());
        assert_eq!(store.count_users().unwrap(), 2);
    }
}
