//! Role/action authorization table.
//!
//! Every decision the desk makes about *who* may do *what* goes through
//! [`authorize`], which reads a single static table. Ownership and
//! assignment checks are expressed as grant kinds in that table rather than
//! as conditionals scattered through the operations.

use nexus_core::errors::{REASON_NOT_ASSIGNED, REASON_NOT_OWNER};
use nexus_core::ticket::TicketRecord;
use nexus_core::{DeskError, DeskResult, Principal, Role};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    ViewStats,
    ListTickets,
    ViewTicket,
    CreateTicket,
    AddComment,
    UpdateTicket,
    ListFaculty,
    AddFaculty,
    DeleteUser,
    ViewFacultyStats,
    ViewMyTasks,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::ViewStats,
        Action::ListTickets,
        Action::ViewTicket,
        Action::CreateTicket,
        Action::AddComment,
        Action::UpdateTicket,
        Action::ListFaculty,
        Action::AddFaculty,
        Action::DeleteUser,
        Action::ViewFacultyStats,
        Action::ViewMyTasks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ViewStats => "view_stats",
            Self::ListTickets => "list_tickets",
            Self::ViewTicket => "view_ticket",
            Self::CreateTicket => "create_ticket",
            Self::AddComment => "add_comment",
            Self::UpdateTicket => "update_ticket",
            Self::ListFaculty => "list_faculty",
            Self::AddFaculty => "add_faculty",
            Self::DeleteUser => "delete_user",
            Self::ViewFacultyStats => "view_faculty_stats",
            Self::ViewMyTasks => "view_my_tasks",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a role is granted for an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    Deny,
    /// Unrestricted.
    Full,
    /// Only tickets the principal authored.
    OwnOnly,
    /// Only tickets assigned to the principal's display name.
    AssignedOnly,
}

/// The scope an accepted request runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    Own,
    Assigned,
}

use Grant::{AssignedOnly as A, Deny as D, Full as F, OwnOnly as O};

/// Columns: student, faculty, dean, admin.
const MATRIX: [(Action, [Grant; 4]); 11] = [
    (Action::ViewStats, [F, F, F, F]),
    (Action::ListTickets, [O, F, F, F]),
    (Action::ViewTicket, [O, F, F, F]),
    (Action::CreateTicket, [F, F, F, F]),
    (Action::AddComment, [O, F, F, F]),
    (Action::UpdateTicket, [D, A, F, F]),
    (Action::ListFaculty, [D, D, F, D]),
    (Action::AddFaculty, [D, D, F, D]),
    (Action::DeleteUser, [D, D, F, D]),
    (Action::ViewFacultyStats, [D, D, F, D]),
    (Action::ViewMyTasks, [D, A, D, D]),
];

fn column(role: Role) -> usize {
    match role {
        Role::Student => 0,
        Role::Faculty => 1,
        Role::Dean => 2,
        Role::Admin => 3,
    }
}

/// Table lookup. Actions missing from the table are denied.
pub fn grant(role: Role, action: Action) -> Grant {
    MATRIX
        .iter()
        .find(|(a, _)| *a == action)
        .map(|(_, grants)| grants[column(role)])
        .unwrap_or(Grant::Deny)
}

/// Decide whether `principal` may perform `action`, optionally against a
/// specific ticket.
///
/// Without a target, `OwnOnly`/`AssignedOnly` grants are accepted and the
/// returned [`Scope`] tells the caller how to narrow its query. With a
/// target, the ownership or assignment relation is checked here.
pub fn authorize(
    principal: &Principal,
    action: Action,
    target: Option<&TicketRecord>,
) -> DeskResult<Scope> {
    match (grant(principal.role, action), target) {
        (Grant::Deny, _) => Err(DeskError::unauthorized()),
        (Grant::Full, _) => Ok(Scope::All),
        (Grant::OwnOnly, Some(ticket)) if !ticket.is_authored_by(principal.id) => {
            Err(DeskError::forbidden(REASON_NOT_OWNER))
        }
        (Grant::OwnOnly, _) => Ok(Scope::Own),
        (Grant::AssignedOnly, Some(ticket)) if !ticket.is_assigned_to(&principal.display_name) => {
            Err(DeskError::forbidden(REASON_NOT_ASSIGNED))
        }
        (Grant::AssignedOnly, _) => Ok(Scope::Assigned),
    }
}
