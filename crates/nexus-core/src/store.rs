use crate::directory::{DeletedUser, FacultyRecord, FacultyWorkload, LoginRecord, NewUser};
use crate::errors::DeskResult;
use crate::ids::{CommentId, TicketId, UserId};
use crate::principal::Principal;
use crate::seed::SeedBatch;
use crate::stats::{AssigneeCounts, StatusCounts};
use crate::ticket::{
    Comment, CommentDraft, TicketDraft, TicketFilter, TicketRecord, TicketUpdate, UpdateOutcome,
};

/// Storage collaborator consumed by the desk engine.
///
/// Implementations must be safe to call from concurrent requests. Methods
/// that combine several reads or writes (`update_ticket`, `delete_user`,
/// `seed_if_empty`, `faculty_workload`, `count_tickets_by_status`) must
/// observe or apply them as one unit.
pub trait FeedbackStore: Send + Sync {
    /// Tickets matching `filter`, newest first, joined with author names.
    fn list_tickets(&self, filter: &TicketFilter) -> DeskResult<Vec<TicketRecord>>;

    fn get_ticket(&self, id: TicketId) -> DeskResult<Option<TicketRecord>>;

    /// Comments on a ticket, oldest first.
    fn get_comments(&self, ticket: TicketId) -> DeskResult<Vec<Comment>>;

    fn insert_ticket(&self, draft: &TicketDraft) -> DeskResult<TicketId>;

    /// Write `update.fields` if the ticket is still at `update.expected` and
    /// any new assignee is a current faculty member, checked and written
    /// atomically. `NotFound` if the ticket is gone.
    fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> DeskResult<UpdateOutcome>;

    /// Append a comment. `NotFound` if the parent ticket does not exist at
    /// insertion time.
    fn insert_comment(&self, draft: &CommentDraft) -> DeskResult<CommentId>;

    fn list_faculty(&self) -> DeskResult<Vec<FacultyRecord>>;

    /// Insert a directory entry. `Conflict` when the username is taken.
    fn insert_user(&self, user: &NewUser) -> DeskResult<UserId>;

    fn get_user(&self, id: UserId) -> DeskResult<Option<Principal>>;

    fn find_login(&self, username: &str) -> DeskResult<Option<LoginRecord>>;

    fn count_users(&self) -> DeskResult<u64>;

    /// Insert the whole batch in one transaction when the directory has no
    /// users. Returns `false`, writing nothing, when it already has some.
    fn seed_if_empty(&self, batch: &SeedBatch) -> DeskResult<bool>;

    /// Clear every assignment pointing at the user's display name, then
    /// remove the user, atomically. `NotFound` if the user does not exist.
    fn delete_user(&self, id: UserId) -> DeskResult<DeletedUser>;

    fn count_tickets_by_status(&self) -> DeskResult<StatusCounts>;

    /// Totals for a single assignee. Use `faculty_workload` for the whole
    /// roster at once.
    fn count_tickets_by_assignee(&self, display_name: &str) -> DeskResult<AssigneeCounts>;

    /// Every faculty member with assignment counts, from one snapshot.
    fn faculty_workload(&self) -> DeskResult<Vec<FacultyWorkload>>;
}
