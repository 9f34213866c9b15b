use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::principal::{Principal, Role};

/// Faculty roster entry; `display_name` is what tickets reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRecord {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// New directory entry with an already-hashed password.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What login needs: the principal plus the stored PHC hash string.
#[derive(Clone, Debug)]
pub struct LoginRecord {
    pub principal: Principal,
    pub password_hash: String,
}

/// Result of a user deletion: who was removed and how many tickets lost
/// their assignee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletedUser {
    pub id: UserId,
    pub display_name: String,
    pub unassigned_tickets: u64,
}

/// One faculty member's assignment counts, read in the same snapshot as
/// the roster itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacultyWorkload {
    pub member: FacultyRecord,
    pub total_assigned: u64,
    pub resolved: u64,
}
