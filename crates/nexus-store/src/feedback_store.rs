use std::path::Path;

use nexus_core::directory::{DeletedUser, FacultyRecord, FacultyWorkload, LoginRecord, NewUser};
use nexus_core::ids::{CommentId, TicketId, UserId};
use nexus_core::seed::SeedBatch;
use nexus_core::stats::{AssigneeCounts, StatusCounts};
use nexus_core::ticket::{
    Comment, CommentDraft, TicketDraft, TicketFilter, TicketRecord, TicketUpdate, UpdateOutcome,
};
use nexus_core::{DeskResult, FeedbackStore, Principal};

use crate::comments::CommentRepo;
use crate::database::Database;
use crate::error::StoreError;
use crate::seed;
use crate::tickets::TicketRepo;
use crate::users::UserRepo;

/// SQLite-backed [`FeedbackStore`], one repository per table over a shared
/// connection.
pub struct SqliteStore {
    db: Database,
    users: UserRepo,
    tickets: TicketRepo,
    comments: CommentRepo,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            users: UserRepo::new(db.clone()),
            tickets: TicketRepo::new(db.clone()),
            comments: CommentRepo::new(db.clone()),
            db,
        }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl FeedbackStore for SqliteStore {
    fn list_tickets(&self, filter: &TicketFilter) -> DeskResult<Vec<TicketRecord>> {
        Ok(self.tickets.list(filter)?)
    }

    fn get_ticket(&self, id: TicketId) -> DeskResult<Option<TicketRecord>> {
        Ok(self.tickets.get(id)?)
    }

    fn get_comments(&self, ticket: TicketId) -> DeskResult<Vec<Comment>> {
        Ok(self.comments.list(ticket)?)
    }

    fn insert_ticket(&self, draft: &TicketDraft) -> DeskResult<TicketId> {
        Ok(self.tickets.insert(draft)?)
    }

    fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> DeskResult<UpdateOutcome> {
        Ok(self.tickets.update(id, update)?)
    }

    fn insert_comment(&self, draft: &CommentDraft) -> DeskResult<CommentId> {
        Ok(self.comments.insert(draft)?)
    }

    fn list_faculty(&self) -> DeskResult<Vec<FacultyRecord>> {
        Ok(self.users.list_faculty()?)
    }

    fn insert_user(&self, user: &NewUser) -> DeskResult<UserId> {
        Ok(self.users.insert(user)?)
    }

    fn get_user(&self, id: UserId) -> DeskResult<Option<Principal>> {
        Ok(self.users.get(id)?)
    }

    fn find_login(&self, username: &str) -> DeskResult<Option<LoginRecord>> {
        Ok(self.users.find_login(username)?)
    }

    fn count_users(&self) -> DeskResult<u64> {
        Ok(self.users.count()?)
    }

    fn seed_if_empty(&self, batch: &SeedBatch) -> DeskResult<bool> {
        Ok(seed::seed_if_empty(&self.db, batch)?)
    }

    fn delete_user(&self, id: UserId) -> DeskResult<DeletedUser> {
        Ok(self.users.delete(id)?)
    }

    fn count_tickets_by_status(&self) -> DeskResult<StatusCounts> {
        Ok(self.tickets.count_by_status()?)
    }

    fn count_tickets_by_assignee(&self, display_name: &str) -> DeskResult<AssigneeCounts> {
        Ok(self.tickets.count_by_assignee(display_name)?)
    }

    fn faculty_workload(&self) -> DeskResult<Vec<FacultyWorkload>> {
        Ok(self.tickets.faculty_workload()?)
    }
}
