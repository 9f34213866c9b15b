use chrono::Utc;
use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};

use nexus_core::directory::{DeletedUser, FacultyRecord};
use nexus_core::ids::{TicketId, UserId};
use nexus_core::inputs::{AddFacultyInput, CommentInput, CreateTicketInput, UpdateTicketInput};
use nexus_core::stats::{FacultyStats, StatusCounts};
use nexus_core::ticket::{Comment, TicketFilter, TicketRecord, UpdateOutcome};
use nexus_core::{DeskError, DeskResult, FeedbackStore, Principal};

use crate::credentials::Credentials;
use crate::directory;
use crate::lifecycle;
use crate::policy::{self, Action, Scope};
use crate::seed::{self, SeedReport};
use crate::visibility::{self, TicketDetail, TicketView};

/// Compare-and-set rounds before an update gives up with `Conflict`.
const UPDATE_ATTEMPTS: u32 = 3;

/// The feedback desk: every operation a principal can request, authorized
/// through the policy table and persisted through the store.
pub struct FeedbackDesk<S> {
    store: S,
    credentials: Credentials,
}

impl<S: FeedbackStore> FeedbackDesk<S> {
    pub fn new(store: S) -> Self {
        Self::with_credentials(store, Credentials::default())
    }

    pub fn with_credentials(store: S, credentials: Credentials) -> Self {
        Self { store, credentials }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn check(
        &self,
        principal: &Principal,
        action: Action,
        target: Option<&TicketRecord>,
    ) -> DeskResult<Scope> {
        policy::authorize(principal, action, target).inspect_err(|e| {
            debug!(
                user_id = %principal.id,
                role = %principal.role,
                action = %action,
                ticket_id = target.map(|t| t.id.get()),
                error = %e,
                "request denied"
            );
        })
    }

    fn load_ticket(&self, id: TicketId) -> DeskResult<TicketRecord> {
        self.store
            .get_ticket(id)?
            .ok_or_else(|| DeskError::not_found(id.to_string()))
    }

    // ── Identity ──

    /// Check a username/password pair. Unknown users and wrong passwords
    /// are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &SecretString) -> DeskResult<Principal> {
        let Some(record) = self.store.find_login(username.trim())? else {
            debug!("login for unknown user");
            return Err(DeskError::Unauthenticated);
        };
        if !self.credentials.verify(password, &record.password_hash) {
            debug!(user_id = %record.principal.id, "login with wrong password");
            return Err(DeskError::Unauthenticated);
        }
        info!(user_id = %record.principal.id, role = %record.principal.role, "user logged in");
        Ok(record.principal)
    }

    /// Current directory entry for a session's user, or `Unauthenticated`
    /// if the account has since been deleted.
    pub fn principal(&self, id: UserId) -> DeskResult<Principal> {
        self.store.get_user(id)?.ok_or(DeskError::Unauthenticated)
    }

    // ── Tickets ──

    pub fn stats(&self, principal: &Principal) -> DeskResult<StatusCounts> {
        self.check(principal, Action::ViewStats, None)?;
        self.store.count_tickets_by_status()
    }

    pub fn list_tickets(&self, principal: &Principal) -> DeskResult<Vec<TicketView>> {
        let filter = match self.check(principal, Action::ListTickets, None)? {
            Scope::Own => TicketFilter::authored_by(principal.id),
            _ => TicketFilter::all(),
        };
        visibility::filter_list(principal, self.store.list_tickets(&filter)?)
    }

    #[instrument(skip(self, principal, input), fields(user_id = %principal.id))]
    pub fn create_ticket(
        &self,
        principal: &Principal,
        input: &CreateTicketInput,
    ) -> DeskResult<TicketView> {
        self.check(principal, Action::CreateTicket, None)?;
        let draft = lifecycle::new_ticket(principal, input, Utc::now())?;
        let id = self.store.insert_ticket(&draft)?;
        info!(ticket_id = %id, priority = %draft.priority, "ticket created");
        Ok(visibility::redact(principal, self.load_ticket(id)?))
    }

    pub fn get_ticket(&self, principal: &Principal, id: TicketId) -> DeskResult<TicketDetail> {
        let ticket = self.load_ticket(id)?;
        self.check(principal, Action::ViewTicket, Some(&ticket))?;
        let comments = self.store.get_comments(id)?;
        visibility::filter_detail(principal, ticket, comments)
    }

    /// Authorize, plan, and write as one compare-and-set. If the ticket
    /// changes between the read and the write (reassigned, or its assignee
    /// deleted) the whole decision is made again against the new state.
    #[instrument(skip(self, principal, input), fields(user_id = %principal.id, ticket_id = %id))]
    pub fn update_ticket(
        &self,
        principal: &Principal,
        id: TicketId,
        input: &UpdateTicketInput,
    ) -> DeskResult<TicketView> {
        for attempt in 1..=UPDATE_ATTEMPTS {
            let ticket = self.load_ticket(id)?;
            let scope = self.check(principal, Action::UpdateTicket, Some(&ticket))?;
            let update = lifecycle::plan_update(&ticket, scope, input, Utc::now())?;

            match self.store.update_ticket(id, &update)? {
                UpdateOutcome::Applied => {
                    info!(
                        status = %update.fields.status,
                        priority = %update.fields.priority,
                        assigned_to = update.fields.assigned_to.as_deref().unwrap_or(""),
                        "ticket updated"
                    );
                    return Ok(visibility::redact(principal, self.load_ticket(id)?));
                }
                UpdateOutcome::UnknownAssignee => {
                    let name = update.new_assignee().unwrap_or_default();
                    return Err(DeskError::validation(format!(
                        "assignee {name:?} is not a faculty member"
                    )));
                }
                UpdateOutcome::Stale => debug!(attempt, "ticket changed while updating"),
            }
        }
        warn!(attempts = UPDATE_ATTEMPTS, "ticket kept changing, update abandoned");
        Err(DeskError::Conflict(format!("{id} changed during update")))
    }

    #[instrument(skip(self, principal, input), fields(user_id = %principal.id, ticket_id = %id))]
    pub fn add_comment(
        &self,
        principal: &Principal,
        id: TicketId,
        input: &CommentInput,
    ) -> DeskResult<Comment> {
        let ticket = self.load_ticket(id)?;
        self.check(principal, Action::AddComment, Some(&ticket))?;
        let draft = lifecycle::new_comment(principal, &ticket, input, Utc::now())?;
        let comment_id = self.store.insert_comment(&draft)?;
        info!(comment_id = %comment_id, "comment added");
        Ok(Comment {
            id: comment_id,
            ticket_id: draft.ticket_id,
            author_id: draft.author_id,
            author_name: draft.author_name,
            body: draft.body,
            created_at: draft.created_at,
        })
    }

    /// Open tickets assigned to the calling faculty member.
    pub fn my_tasks(&self, principal: &Principal) -> DeskResult<Vec<TicketView>> {
        self.check(principal, Action::ViewMyTasks, None)?;
        let assigned = self
            .store
            .list_tickets(&TicketFilter::open_assigned_to(&principal.display_name))?;
        Ok(lifecycle::order_tasks(assigned)
            .into_iter()
            .map(|t| visibility::redact(principal, t))
            .collect())
    }

    // ── Directory ──

    pub fn list_faculty(&self, principal: &Principal) -> DeskResult<Vec<FacultyRecord>> {
        self.check(principal, Action::ListFaculty, None)?;
        self.store.list_faculty()
    }

    #[instrument(skip(self, principal, input), fields(user_id = %principal.id))]
    pub fn add_faculty(
        &self,
        principal: &Principal,
        input: &AddFacultyInput,
    ) -> DeskResult<FacultyRecord> {
        self.check(principal, Action::AddFaculty, None)?;
        let user = directory::new_faculty(input, &self.credentials, Utc::now())?;
        let id = self.store.insert_user(&user).inspect_err(|e| {
            if let DeskError::Conflict(reason) = e {
                warn!(username = %user.username, reason = %reason, "faculty not added");
            }
        })?;
        info!(faculty_id = %id, username = %user.username, "faculty added");
        Ok(FacultyRecord {
            id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            phone: user.phone,
        })
    }

    pub fn faculty_stats(&self, principal: &Principal) -> DeskResult<Vec<FacultyStats>> {
        self.check(principal, Action::ViewFacultyStats, None)?;
        Ok(lifecycle::faculty_stats(self.store.faculty_workload()?))
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.id, target = %id))]
    pub fn delete_user(&self, principal: &Principal, id: UserId) -> DeskResult<DeletedUser> {
        self.check(principal, Action::DeleteUser, None)?;
        let deleted = self.store.delete_user(id)?;
        info!(
            display_name = %deleted.display_name,
            unassigned = deleted.unassigned_tickets,
            "user deleted"
        );
        Ok(deleted)
    }

    // ── Bootstrap ──

    pub fn seed_demo_data(&self) -> DeskResult<Option<SeedReport>> {
        seed::seed_demo_data(&self.store, &self.credentials, Utc::now())
    }
}
