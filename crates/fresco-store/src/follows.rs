//! The follow graph, modeled as an explicit relation table.
//!
//! Edges are directed (`follower_id` follows `followed_id`) and unique per
//! pair.  Follower/following counts are live counts over edge rows, never
//! maintained counters.  Self-follow is a handler-level rule, not a schema
//! constraint.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::UserSummary;
use crate::users::row_to_user_summary;

impl Database {
    /// Add a follow edge.  Returns [`StoreError::Conflict`] when the edge
    /// already exists.
    pub fn add_edge(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO follows (follower_id, followed_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    follower_id.to_string(),
                    followed_id.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(StoreError::from_write)?;
        Ok(())
    }

    /// Remove a follow edge.  Returns whether an edge was removed.
    pub fn remove_edge(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id.to_string(), followed_id.to_string()],
        )?;
        Ok(affected > 0)
    }

    pub fn edge_exists(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
            params![follower_id.to_string(), followed_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Number of followers of `user_id` (incoming edges).
    pub fn count_in_edges(&self, user_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM follows WHERE followed_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of accounts `user_id` follows (outgoing edges).
    pub fn count_out_edges(&self, user_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Page of users following `user_id`, newest edge first, with the total
    /// follower count.
    pub fn list_followers(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<UserSummary>, u64)> {
        let total = self.count_in_edges(user_id)?;
        let users = self.edge_endpoint_page(
            "SELECT u.id, u.name, u.username, u.profile_picture
             FROM follows f JOIN users u ON u.id = f.follower_id
             WHERE f.followed_id = ?1
             ORDER BY f.created_at DESC, u.id DESC
             LIMIT ?2 OFFSET ?3",
            user_id,
            limit,
            offset,
        )?;
        Ok((users, total))
    }

    /// Page of users `user_id` follows, newest edge first, with the total
    /// following count.
    pub fn list_following(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<UserSummary>, u64)> {
        let total = self.count_out_edges(user_id)?;
        let users = self.edge_endpoint_page(
            "SELECT u.id, u.name, u.username, u.profile_picture
             FROM follows f JOIN users u ON u.id = f.followed_id
             WHERE f.follower_id = ?1
             ORDER BY f.created_at DESC, u.id DESC
             LIMIT ?2 OFFSET ?3",
            user_id,
            limit,
            offset,
        )?;
        Ok((users, total))
    }

    fn edge_endpoint_page(
        &self,
        sql: &str,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<UserSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![user_id.to_string(), limit, offset], |row| {
            row_to_user_summary(row, 0)
        })?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}
