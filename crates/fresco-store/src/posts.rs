//! Post CRUD and the feed / listing queries.
//!
//! Listing queries return [`PostView`] rows: the post joined with its author
//! and per-viewer derived values (like count, comment count, liked flag),
//! all computed from rows at read time.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{not_found, ts_col, uuid_col, Database};
use crate::error::Result;
use crate::models::{Post, PostView};
use crate::users::row_to_user_summary;

/// Shared SELECT head for [`PostView`] queries.  `?1` is always the viewing
/// user, used by the `liked` subselect.
const POST_VIEW_SELECT: &str = "\
    SELECT p.id, p.user_id, p.image_path, p.caption, p.created_at,
           u.id, u.name, u.username, u.profile_picture,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
           EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1) AS liked
    FROM posts p
    JOIN users u ON u.id = p.user_id";

impl Database {
    pub fn insert_post(
        &self,
        user_id: Uuid,
        image_path: &str,
        caption: Option<&str>,
    ) -> Result<Post> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn().execute(
            "INSERT INTO posts (id, user_id, image_path, caption, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                user_id.to_string(),
                image_path,
                caption,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Post {
            id,
            user_id,
            image_path: image_path.to_string(),
            caption: caption.map(str::to_string),
            created_at: now,
        })
    }

    /// Fetch the bare row.  Used for existence and ownership checks before
    /// mutations.
    pub fn get_post(&self, id: Uuid) -> Result<Post> {
        self.conn()
            .query_row(
                "SELECT id, user_id, image_path, caption, created_at
                 FROM posts WHERE id = ?1",
                params![id.to_string()],
                row_to_post,
            )
            .map_err(not_found)
    }

    /// Fetch a post with author and derived values for `viewer`.
    pub fn get_post_view(&self, id: Uuid, viewer: Uuid) -> Result<PostView> {
        self.conn()
            .query_row(
                &format!("{POST_VIEW_SELECT} WHERE p.id = ?2"),
                params![viewer.to_string(), id.to_string()],
                row_to_post_view,
            )
            .map_err(not_found)
    }

    /// The home timeline: posts authored by `viewer` or by accounts `viewer`
    /// follows, reverse-chronological.
    pub fn feed_page(
        &self,
        viewer: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<PostView>, u64)> {
        const FEED_WHERE: &str = "p.user_id = ?1
              OR p.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)";

        let total: u64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM posts p WHERE {FEED_WHERE}"),
            params![viewer.to_string()],
            |row| row.get(0),
        )?;

        let sql = format!(
            "{POST_VIEW_SELECT} WHERE {FEED_WHERE}
             ORDER BY p.created_at DESC, p.id DESC LIMIT ?2 OFFSET ?3"
        );
        let posts = self.post_view_page(&sql, params![viewer.to_string(), limit, offset])?;
        Ok((posts, total))
    }

    /// Every post on the instance, reverse-chronological.
    pub fn all_posts_page(
        &self,
        viewer: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<PostView>, u64)> {
        let total: u64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;

        let sql = format!(
            "{POST_VIEW_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT ?2 OFFSET ?3"
        );
        let posts = self.post_view_page(&sql, params![viewer.to_string(), limit, offset])?;
        Ok((posts, total))
    }

    /// Posts authored by one user, reverse-chronological.
    pub fn user_posts_page(
        &self,
        author: Uuid,
        viewer: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<PostView>, u64)> {
        let total: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM posts WHERE user_id = ?1",
            params![author.to_string()],
            |row| row.get(0),
        )?;

        let sql = format!(
            "{POST_VIEW_SELECT} WHERE p.user_id = ?2
             ORDER BY p.created_at DESC, p.id DESC LIMIT ?3 OFFSET ?4"
        );
        let posts = self.post_view_page(
            &sql,
            params![viewer.to_string(), author.to_string(), limit, offset],
        )?;
        Ok((posts, total))
    }

    fn post_view_page<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<PostView>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_post_view)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    /// Caption is the only mutable field; the owner check happens in the
    /// handler before this runs.
    pub fn update_post_caption(&self, id: Uuid, caption: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE posts SET caption = ?1 WHERE id = ?2",
            params![caption, id.to_string()],
        )?;
        if affected == 0 {
            return Err(crate::StoreError::NotFound);
        }
        Ok(())
    }

    /// Delete a post row.  Comments and likes cascade at the schema level;
    /// the stored image file is the handler's responsibility.
    pub fn delete_post(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM posts WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        image_path: row.get(2)?,
        caption: row.get(3)?,
        created_at: ts_col(row, 4)?,
    })
}

fn row_to_post_view(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostView> {
    Ok(PostView {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        image_path: row.get(2)?,
        caption: row.get(3)?,
        created_at: ts_col(row, 4)?,
        user: row_to_user_summary(row, 5)?,
        like_count: row.get(9)?,
        comment_count: row.get(10)?,
        liked_by_viewer: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    fn seed_user(db: &Database, username: &str) -> Uuid {
        db.insert_user(username, username, &format!("{username}@example.com"), "h", None)
            .unwrap()
            .id
    }

    #[test]
    fn insert_get_update_delete() {
        let db = Database::in_memory().unwrap();
        let alice = seed_user(&db, "alice");

        let post = db
            .insert_post(alice, "posts/1.jpg", Some("hello"))
            .unwrap();
        assert_eq!(db.get_post(post.id).unwrap(), post);

        db.update_post_caption(post.id, "edited").unwrap();
        assert_eq!(
            db.get_post(post.id).unwrap().caption.as_deref(),
            Some("edited")
        );

        assert!(db.delete_post(post.id).unwrap());
        assert!(matches!(db.get_post(post.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn feed_is_caller_plus_followees() {
        let db = Database::in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        let own = db.insert_post(alice, "posts/a.jpg", None).unwrap();
        let followed = db.insert_post(bob, "posts/b.jpg", None).unwrap();
        db.insert_post(carol, "posts/c.jpg", None).unwrap();

        db.add_edge(alice, bob).unwrap();

        let (feed, total) = db.feed_page(alice, 10, 0).unwrap();
        assert_eq!(total, 2);
        let ids: Vec<Uuid> = feed.iter().map(|p| p.id).collect();
        assert!(ids.contains(&own.id));
        assert!(ids.contains(&followed.id));
    }

    #[test]
    fn feed_is_reverse_chronological() {
        let db = Database::in_memory().unwrap();
        let alice = seed_user(&db, "alice");

        let first = db.insert_post(alice, "posts/1.jpg", None).unwrap();
        let second = db.insert_post(alice, "posts/2.jpg", None).unwrap();

        let (feed, _) = db.feed_page(alice, 10, 0).unwrap();
        assert_eq!(feed[0].id, second.id);
        assert_eq!(feed[1].id, first.id);
    }

    #[test]
    fn derived_counts_and_liked_flag() {
        let db = Database::in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let post = db.insert_post(bob, "posts/b.jpg", None).unwrap();
        db.toggle_like(alice, post.id).unwrap();
        db.insert_comment(alice, post.id, "nice", None).unwrap();

        let view = db.get_post_view(post.id, alice).unwrap();
        assert_eq!(view.like_count, 1);
        assert_eq!(view.comment_count, 1);
        assert!(view.liked_by_viewer);
        assert_eq!(view.user.username, "bob");

        // The author has not liked their own post.
        assert!(!db.get_post_view(post.id, bob).unwrap().liked_by_viewer);
    }

    #[test]
    fn user_posts_page_filters_by_author() {
        let db = Database::in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.insert_post(alice, "posts/a.jpg", None).unwrap();
        db.insert_post(bob, "posts/b.jpg", None).unwrap();

        let (posts, total) = db.user_posts_page(alice, bob, 10, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(posts[0].user.username, "alice");
    }

    #[test]
    fn deleting_post_cascades_comments_and_likes() {
        let db = Database::in_memory().unwrap();
        let alice = seed_user(&db, "alice");

        let post = db.insert_post(alice, "posts/a.jpg", None).unwrap();
        db.toggle_like(alice, post.id).unwrap();
        let comment = db.insert_comment(alice, post.id, "hi", None).unwrap();

        db.delete_post(post.id).unwrap();
        assert!(matches!(
            db.get_comment(comment.id),
            Err(StoreError::NotFound)
        ));
        assert_eq!(db.like_count(post.id).unwrap(), 0);
    }
}
