//! Bearer-token sessions with expiry.

use chrono::{Duration, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::{not_found, ts_col, uuid_col, Database};
use crate::error::Result;
use crate::models::Session;

impl Database {
    /// Create a session for `user_id` that expires `ttl` from now.
    pub fn create_session(&self, user_id: Uuid, token: &str, ttl: Duration) -> Result<Session> {
        let now = Utc::now();
        let expires_at = now + ttl;

        self.conn().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token,
                user_id.to_string(),
                now.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )?;

        Ok(Session {
            token: token.to_string(),
            user_id,
            created_at: now,
            expires_at,
        })
    }

    /// Look up a session by token.  An expired session is deleted on sight
    /// and reported as not found.
    pub fn get_session(&self, token: &str) -> Result<Session> {
        let session = self
            .conn()
            .query_row(
                "SELECT token, user_id, created_at, expires_at
                 FROM sessions WHERE token = ?1",
                params![token],
                row_to_session,
            )
            .map_err(not_found)?;

        if session.expires_at < Utc::now() {
            self.delete_session(token)?;
            return Err(crate::StoreError::NotFound);
        }

        Ok(session)
    }

    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(affected > 0)
    }

    /// Delete all expired sessions.  Run periodically by the server.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        if affected > 0 {
            tracing::debug!(purged = affected, "purged expired sessions");
        }
        Ok(affected)
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        token: row.get(0)?,
        user_id: uuid_col(row, 1)?,
        created_at: ts_col(row, 2)?,
        expires_at: ts_col(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    fn test_db_with_user() -> (Database, Uuid) {
        let db = Database::in_memory().unwrap();
        let user = db
            .insert_user("Alice", "alice", "alice@example.com", "h", None)
            .unwrap();
        (db, user.id)
    }

    #[test]
    fn create_get_delete_round_trip() {
        let (db, user_id) = test_db_with_user();

        let session = db
            .create_session(user_id, "deadbeef", Duration::hours(1))
            .unwrap();
        assert_eq!(db.get_session("deadbeef").unwrap(), session);

        assert!(db.delete_session("deadbeef").unwrap());
        assert!(matches!(
            db.get_session("deadbeef"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn expired_session_is_rejected_and_removed() {
        let (db, user_id) = test_db_with_user();

        db.create_session(user_id, "stale", Duration::seconds(-10))
            .unwrap();
        assert!(matches!(db.get_session("stale"), Err(StoreError::NotFound)));

        // Already gone, so the purge finds nothing left.
        assert_eq!(db.purge_expired_sessions().unwrap(), 0);
    }

    #[test]
    fn purge_removes_only_expired() {
        let (db, user_id) = test_db_with_user();

        db.create_session(user_id, "old", Duration::seconds(-10))
            .unwrap();
        db.create_session(user_id, "fresh", Duration::hours(1))
            .unwrap();

        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(db.get_session("fresh").is_ok());
    }

    #[test]
    fn sessions_cascade_with_user() {
        let (db, user_id) = test_db_with_user();
        db.create_session(user_id, "tok", Duration::hours(1)).unwrap();

        assert!(db.delete_user(user_id).unwrap());
        assert!(matches!(db.get_session("tok"), Err(StoreError::NotFound)));
    }
}
