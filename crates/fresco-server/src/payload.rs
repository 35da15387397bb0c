//! Response shaping: the `{success, message?, data?, errors?}` envelope and
//! the JSON payload structs handlers put in `data`.
//!
//! Derived attributes (image URLs, follower counts, liked flags) are
//! computed here on every serialization, never persisted, so they always
//! agree with the underlying rows.

use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use fresco_store::{
    CommentThread, CommentView, Database, PostView, User, UserSummary,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

pub fn data<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

pub fn message_data<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

pub fn created<T: Serialize>(msg: &str, payload: T) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, message_data(msg, payload))
}

// ---------------------------------------------------------------------------
// Derived URLs
// ---------------------------------------------------------------------------

/// Derive the public URL of a stored image from its relative path
/// (`posts/...` or `profile/...`).
pub fn image_url(base_url: &str, path: &str) -> String {
    format!("{base_url}/img/{path}")
}

fn optional_image_url(base_url: &str, path: Option<&str>) -> Option<String> {
    path.map(|p| image_url(base_url, p))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// The authenticated user's own account, email included.
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub created_at: DateTime<Utc>,
}

pub fn user_payload(db: &Database, user: &User, base_url: &str) -> Result<UserPayload, ApiError> {
    Ok(UserPayload {
        id: user.id,
        name: user.name.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        profile_picture: user.profile_picture.clone(),
        profile_picture_url: optional_image_url(base_url, user.profile_picture.as_deref()),
        followers_count: db.count_in_edges(user.id)?,
        following_count: db.count_out_edges(user.id)?,
        created_at: user.created_at,
    })
}

/// A user as seen by others: public fields only.
#[derive(Debug, Serialize)]
pub struct ProfilePayload {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub profile_picture: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub created_at: DateTime<Utc>,
}

pub fn profile_payload(
    db: &Database,
    user: &User,
    base_url: &str,
) -> Result<ProfilePayload, ApiError> {
    Ok(ProfilePayload {
        id: user.id,
        name: user.name.clone(),
        username: user.username.clone(),
        profile_picture: user.profile_picture.clone(),
        profile_picture_url: optional_image_url(base_url, user.profile_picture.as_deref()),
        followers_count: db.count_in_edges(user.id)?,
        following_count: db.count_out_edges(user.id)?,
        created_at: user.created_at,
    })
}

/// The slice of a user embedded in posts, comments and follower listings.
#[derive(Debug, Serialize)]
pub struct SummaryPayload {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub profile_picture: Option<String>,
    pub profile_picture_url: Option<String>,
}

impl SummaryPayload {
    pub fn new(summary: UserSummary, base_url: &str) -> Self {
        Self {
            profile_picture_url: optional_image_url(base_url, summary.profile_picture.as_deref()),
            id: summary.id,
            name: summary.name,
            username: summary.username,
            profile_picture: summary.profile_picture,
        }
    }
}

/// A follower-listing row: the listed user annotated with the caller's
/// relationship to them, one existence check each way.
#[derive(Debug, Serialize)]
pub struct FollowListEntry {
    #[serde(flatten)]
    pub user: SummaryPayload,
    pub is_following: bool,
    pub is_followed_by: bool,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PostPayload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub caption: Option<String>,
    pub image_path: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub user: SummaryPayload,
    pub like_count: u64,
    pub comment_count: u64,
    pub is_liked: bool,
}

impl PostPayload {
    pub fn new(view: PostView, base_url: &str) -> Self {
        Self {
            image_url: image_url(base_url, &view.image_path),
            user: SummaryPayload::new(view.user, base_url),
            id: view.id,
            user_id: view.user_id,
            caption: view.caption,
            image_path: view.image_path,
            created_at: view.created_at,
            like_count: view.like_count,
            comment_count: view.comment_count,
            is_liked: view.liked_by_viewer,
        }
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CommentPayload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub user: SummaryPayload,
}

impl CommentPayload {
    pub fn new(view: CommentView, base_url: &str) -> Self {
        Self {
            user: SummaryPayload::new(view.user, base_url),
            id: view.id,
            user_id: view.user_id,
            post_id: view.post_id,
            parent_id: view.parent_id,
            body: view.body,
            created_at: view.created_at,
        }
    }
}

/// A top-level comment with its direct replies.
#[derive(Debug, Serialize)]
pub struct ThreadPayload {
    #[serde(flatten)]
    pub comment: CommentPayload,
    pub replies: Vec<CommentPayload>,
    pub reply_count: u64,
}

impl ThreadPayload {
    pub fn new(thread: CommentThread, base_url: &str) -> Self {
        Self {
            comment: CommentPayload::new(thread.comment, base_url),
            replies: thread
                .replies
                .into_iter()
                .map(|r| CommentPayload::new(r, base_url))
                .collect(),
            reply_count: thread.reply_count,
        }
    }
}
