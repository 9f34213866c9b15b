use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Directory role. Determines which row of the authorization table applies.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Faculty,
    Dean,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Faculty, Role::Dean, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Dean => "dean",
            Self::Admin => "admin",
        }
    }

    /// Dean and admin see real author names on every ticket.
    pub fn sees_author_identity(self) -> bool {
        matches!(self, Self::Dean | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "dean" => Ok(Self::Dean),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated caller of a single request.
///
/// Built by the session layer and handed to every desk operation by
/// reference; nothing in the core keeps a principal beyond the call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub display_name: String,
}

impl Principal {
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        role: Role,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            display_name: display_name.into(),
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}
