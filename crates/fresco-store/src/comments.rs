//! Comments: one-level threads under a post.
//!
//! The read path returns paginated top-level comments, each eagerly loaded
//! with its direct replies.  The insert path enforces that a parent comment
//! is a top-level comment on the same post, so no persisted comment can be
//! orphaned from the listing.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{not_found, ts_col, uuid_col, Database};
use crate::error::Result;
use crate::models::{Comment, CommentThread, CommentView};
use crate::users::row_to_user_summary;

const COMMENT_VIEW_SELECT: &str = "\
    SELECT c.id, c.user_id, c.post_id, c.parent_id, c.body, c.created_at,
           u.id, u.name, u.username, u.profile_picture
    FROM comments c
    JOIN users u ON u.id = c.user_id";

impl Database {
    /// Insert a comment.  The caller has already verified the post exists
    /// and that `parent_id`, when given, names a top-level comment on the
    /// same post.
    pub fn insert_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        body: &str,
        parent_id: Option<Uuid>,
    ) -> Result<CommentView> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn().execute(
            "INSERT INTO comments (id, user_id, post_id, parent_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                user_id.to_string(),
                post_id.to_string(),
                parent_id.map(|p| p.to_string()),
                body,
                now.to_rfc3339(),
            ],
        )?;

        self.get_comment_view(id)
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Comment> {
        self.conn()
            .query_row(
                "SELECT id, user_id, post_id, parent_id, body, created_at
                 FROM comments WHERE id = ?1",
                params![id.to_string()],
                row_to_comment,
            )
            .map_err(not_found)
    }

    fn get_comment_view(&self, id: Uuid) -> Result<CommentView> {
        self.conn()
            .query_row(
                &format!("{COMMENT_VIEW_SELECT} WHERE c.id = ?1"),
                params![id.to_string()],
                row_to_comment_view,
            )
            .map_err(not_found)
    }

    /// Delete a comment (and, via cascade, its replies).
    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    /// Page of top-level comments on a post, newest first, each with its
    /// direct replies (oldest first) and reply count.  The total counts
    /// top-level comments only.
    pub fn top_level_comments_page(
        &self,
        post_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<CommentThread>, u64)> {
        let total: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1 AND parent_id IS NULL",
            params![post_id.to_string()],
            |row| row.get(0),
        )?;

        let top_level = {
            let conn = self.conn();
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_VIEW_SELECT}
                 WHERE c.post_id = ?1 AND c.parent_id IS NULL
                 ORDER BY c.created_at DESC, c.id DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows =
                stmt.query_map(params![post_id.to_string(), limit, offset], row_to_comment_view)?;

            let mut comments = Vec::new();
            for row in rows {
                comments.push(row?);
            }
            comments
        };

        // Load each page entry's replies.  Replies are few per thread, so a
        // query per top-level comment keeps the SQL simple.
        let mut threads = Vec::with_capacity(top_level.len());
        for comment in top_level {
            let replies = self.replies_of(comment.id)?;
            let reply_count = replies.len() as u64;
            threads.push(CommentThread {
                comment,
                replies,
                reply_count,
            });
        }

        Ok((threads, total))
    }

    fn replies_of(&self, parent_id: Uuid) -> Result<Vec<CommentView>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{COMMENT_VIEW_SELECT}
             WHERE c.parent_id = ?1
             ORDER BY c.created_at ASC, c.id ASC"
        ))?;
        let rows = stmt.query_map(params![parent_id.to_string()], row_to_comment_view)?;

        let mut replies = Vec::new();
        for row in rows {
            replies.push(row?);
        }
        Ok(replies)
    }
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let parent: Option<String> = row.get(3)?;
    let parent_id = match parent {
        Some(s) => Some(Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(Comment {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        post_id: uuid_col(row, 2)?,
        parent_id,
        body: row.get(4)?,
        created_at: ts_col(row, 5)?,
    })
}

fn row_to_comment_view(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentView> {
    let parent: Option<String> = row.get(3)?;
    let parent_id = match parent {
        Some(s) => Some(Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(CommentView {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        post_id: uuid_col(row, 2)?,
        parent_id,
        body: row.get(4)?,
        created_at: ts_col(row, 5)?,
        user: row_to_user_summary(row, 6)?,
    })
}
