use rusqlite::{Connection, OptionalExtension};
use tracing::instrument;

use nexus_core::directory::{DeletedUser, FacultyRecord, LoginRecord, NewUser};
use nexus_core::ids::UserId;
use nexus_core::principal::{Principal, Role};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

pub struct UserRepo {
    db: Database,
}

impl UserRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a user. Usernames are unique across the whole directory;
    /// faculty display names are unique among faculty because tickets
    /// reference faculty by display name.
    #[instrument(skip(self, user), fields(username = %user.username, role = %user.role))]
    pub fn insert(&self, user: &NewUser) -> Result<UserId, StoreError> {
        self.db.with_tx(|tx| insert_user(tx, user))
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub fn get(&self, id: UserId) -> Result<Option<Principal>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, role, display_name FROM users WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id.get()])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_principal(row)?)),
                None => Ok(None),
            }
        })
    }

    #[instrument(skip(self))]
    pub fn find_login(&self, username: &str) -> Result<Option<LoginRecord>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, role, display_name, password_hash FROM users WHERE username = ?1",
            )?;
            let mut rows = stmt.query([username])?;
            match rows.next()? {
                Some(row) => Ok(Some(LoginRecord {
                    principal: row_to_principal(row)?,
                    password_hash: row_helpers::get(row, 4, "users", "password_hash")?,
                })),
                None => Ok(None),
            }
        })
    }

    /// Faculty roster ordered by display name.
    #[instrument(skip(self))]
    pub fn list_faculty(&self) -> Result<Vec<FacultyRecord>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, display_name, email, phone FROM users
                 WHERE role = 'faculty' ORDER BY display_name, id",
            )?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_faculty(row)?);
            }
            Ok(results)
        })
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        self.db.with_conn(count_users)
    }

    /// Clear assignments naming the user, then delete the user row, in one
    /// transaction.
    #[instrument(skip(self), fields(user_id = %id))]
    pub fn delete(&self, id: UserId) -> Result<DeletedUser, StoreError> {
        self.db.with_tx(|tx| {
            let display_name: Option<String> = tx
                .query_row(
                    "SELECT display_name FROM users WHERE id = ?1",
                    [id.get()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(display_name) = display_name else {
                return Err(StoreError::NotFound(format!("{id}")));
            };

            let unassigned = tx.execute(
                "UPDATE tickets SET assigned_to = NULL WHERE assigned_to = ?1",
                [&display_name],
            )?;
            let removed = tx.execute("DELETE FROM users WHERE id = ?1", [id.get()])?;
            if removed != 1 {
                return Err(StoreError::Database(format!("{id}: expected 1 row deleted, got {removed}")));
            }

            Ok(DeletedUser {
                id,
                display_name,
                unassigned_tickets: unassigned as u64,
            })
        })
    }
}

/// Shared by `UserRepo::insert` and the seed batch; the caller owns the
/// transaction.
pub(crate) fn insert_user(conn: &Connection, user: &NewUser) -> Result<UserId, StoreError> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [&user.username],
        |row| row.get(0),
    )?;
    if taken {
        return Err(StoreError::Conflict("username taken".into()));
    }
    if user.role == Role::Faculty && is_faculty(conn, &user.display_name)? {
        return Err(StoreError::Conflict("display name taken".into()));
    }

    conn.execute(
        "INSERT INTO users (username, password_hash, role, display_name, email, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user.username,
            user.password_hash,
            user.role.as_str(),
            user.display_name,
            user.email,
            user.phone,
            row_helpers::format_timestamp(&user.created_at),
        ],
    )?;
    Ok(UserId::new(conn.last_insert_rowid()))
}

/// Whether a faculty member currently holds `display_name`.
pub(crate) fn is_faculty(conn: &Connection, display_name: &str) -> Result<bool, StoreError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'faculty' AND display_name = ?1)",
        [display_name],
        |row| row.get(0),
    )?)
}

pub(crate) fn count_users(conn: &Connection) -> Result<u64, StoreError> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| {
        Ok(row_helpers::get_count(row, 0, "users", "id"))
    })?
}

fn row_to_principal(row: &rusqlite::Row<'_>) -> Result<Principal, StoreError> {
    Ok(Principal {
        id: UserId::new(row_helpers::get(row, 0, "users", "id")?),
        username: row_helpers::get(row, 1, "users", "username")?,
        role: row_helpers::get_enum(row, 2, "users", "role")?,
        display_name: row_helpers::get(row, 3, "users", "display_name")?,
    })
}

pub(crate) fn row_to_faculty(row: &rusqlite::Row<'_>) -> Result<FacultyRecord, StoreError> {
    Ok(FacultyRecord {
        id: UserId::new(row_helpers::get(row, 0, "users", "id")?),
        username: row_helpers::get(row, 1, "users", "username")?,
        display_name: row_helpers::get(row, 2, "users", "display_name")?,
        email: row_helpers::get(row, 3, "users", "email")?,
        phone: row_helpers::get(row, 4, "users", "phone")?,
    })
}
