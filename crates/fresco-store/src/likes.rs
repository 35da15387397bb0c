//! Likes: a unique (user, post) pair with a single toggle operation.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::LikeToggle;

impl Database {
    /// Flip the like state of `post_id` for `user_id` and return the
    /// resulting state with a fresh count.
    ///
    /// Runs inside a transaction.  The insert uses `INSERT OR IGNORE` so a
    /// concurrent toggle that wins the race on the unique (user, post)
    /// constraint is a benign outcome, not an error; the returned state is
    /// re-read from the table either way.
    pub fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeToggle> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2)",
            params![user_id.to_string(), post_id.to_string()],
            |row| row.get(0),
        )?;

        if existing {
            tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
                params![user_id.to_string(), post_id.to_string()],
            )?;
        } else {
            tx.execute(
                "INSERT OR IGNORE INTO likes (user_id, post_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    user_id.to_string(),
                    post_id.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )?;
        }

        let liked: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2)",
            params![user_id.to_string(), post_id.to_string()],
            |row| row.get(0),
        )?;
        let like_count: u64 = tx.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            params![post_id.to_string()],
            |row| row.get(0),
        )?;

        tx.commit()?;

        Ok(LikeToggle { liked, like_count })
    }

    pub fn like_count(&self, post_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            params![post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn user_likes_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2)",
            params![user_id.to_string(), post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
