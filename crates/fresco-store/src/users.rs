//! User CRUD and lookup helpers.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::{not_found, ts_col, uuid_col, Database};
use crate::error::{Result, StoreError};
use crate::models::{User, UserSummary};

const USER_COLUMNS: &str = "id, name, username, email, password_hash, profile_picture, created_at";

impl Database {
    /// Insert a new user.  A uniqueness violation on username or email maps
    /// to [`StoreError::Conflict`]; handlers pre-check both to produce
    /// field-level errors, so hitting the constraint here is a race loser.
    pub fn insert_user(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        profile_picture: Option<&str>,
    ) -> Result<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn()
            .execute(
                "INSERT INTO users (id, name, username, email, password_hash, profile_picture, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.to_string(),
                    name,
                    username,
                    email,
                    password_hash,
                    profile_picture,
                    now.to_rfc3339(),
                ],
            )
            .map_err(StoreError::from_write)?;

        Ok(User {
            id,
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            profile_picture: profile_picture.map(str::to_string),
            created_at: now,
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Resolve a login identifier: values containing `@` are matched against
    /// the email column, everything else against the username.
    pub fn get_user_by_login(&self, login: &str) -> Result<User> {
        let column = if login.contains('@') { "email" } else { "username" };
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
                params![login],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Whether a username is already in use, optionally ignoring one user
    /// (the caller, during profile updates).
    pub fn username_taken(&self, username: &str, exclude: Option<Uuid>) -> Result<bool> {
        self.identifier_taken("username", username, exclude)
    }

    /// Whether an email is already in use, optionally ignoring one user.
    pub fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        self.identifier_taken("email", email, exclude)
    }

    fn identifier_taken(&self, column: &str, value: &str, exclude: Option<Uuid>) -> Result<bool> {
        let conn = self.conn();
        let existing: Option<String> = conn
            .query_row(
                &format!("SELECT id FROM users WHERE {column} = ?1"),
                params![value],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match (existing, exclude) {
            (Some(id), Some(me)) => id != me.to_string(),
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    /// Partial profile update: only the provided fields change.
    pub fn update_user_fields(
        &self,
        id: Uuid,
        name: Option<&str>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        {
            let conn = self.conn();
            if let Some(name) = name {
                conn.execute(
                    "UPDATE users SET name = ?1 WHERE id = ?2",
                    params![name, id.to_string()],
                )?;
            }
            if let Some(username) = username {
                conn.execute(
                    "UPDATE users SET username = ?1 WHERE id = ?2",
                    params![username, id.to_string()],
                )
                .map_err(StoreError::from_write)?;
            }
            if let Some(email) = email {
                conn.execute(
                    "UPDATE users SET email = ?1 WHERE id = ?2",
                    params![email, id.to_string()],
                )
                .map_err(StoreError::from_write)?;
            }
        }
        self.get_user(id)
    }

    pub fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Set or clear the avatar path.
    pub fn set_profile_picture(&self, id: Uuid, path: Option<&str>) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET profile_picture = ?1 WHERE id = ?2",
            params![path, id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Remove an account.  Sessions, follow edges, posts, comments and likes
    /// cascade at the schema level.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        profile_picture: row.get(5)?,
        created_at: ts_col(row, 6)?,
    })
}

pub(crate) fn row_to_user_summary(
    row: &rusqlite::Row<'_>,
    start: usize,
) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: uuid_col(row, start)?,
        name: row.get(start + 1)?,
        username: row.get(start + 2)?,
        profile_picture: row.get(start + 3)?,
    })
}
