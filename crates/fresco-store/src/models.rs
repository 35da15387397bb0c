//! Domain model structs persisted in the SQLite database, plus the composed
//! read models the query layer assembles for the HTTP layer.
//!
//! Derived values (counts, `liked_by_viewer`) are recomputed from rows on
//! every read and never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique handle.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2id PHC hash of the password.  Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Relative path of the avatar image (`profile/...`), if one is set.
    pub profile_picture: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// The public slice of a user row, embedded in posts, comments and follower
/// listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub profile_picture: Option<String>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated session, keyed by its bearer token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Session {
    /// 32 random bytes, hex-encoded.
    pub token: String,
    /// The account this session belongs to.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Follow graph
// ---------------------------------------------------------------------------

/// A directed edge in the follow graph: `follower_id` follows `followed_id`.
/// The pair is unique.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// An image post.  The owner is immutable after creation; only the caption
/// can be edited.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Relative path of the stored image (`posts/...`).  URLs are derived at
    /// serialization time, never persisted.
    pub image_path: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A post joined with its author and per-viewer derived values.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_path: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
    pub like_count: u64,
    pub comment_count: u64,
    /// Whether the viewing user has liked this post.
    pub liked_by_viewer: bool,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment on a post.  `parent_id` is set on replies and always references
/// a top-level comment on the same post.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A comment joined with its author.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
}

/// A top-level comment with its direct replies eagerly loaded.  Replies are
/// not independently paginated.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
    pub reply_count: u64,
}

// ---------------------------------------------------------------------------
// Like
// ---------------------------------------------------------------------------

/// A like on a post.  The (user, post) pair is unique.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Like {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Result of a like toggle: the state after the flip and the fresh count.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u64,
}
