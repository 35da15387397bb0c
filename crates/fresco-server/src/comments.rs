//! Comment handlers: add, delete, and the one-level threaded listing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::{or_not_found, ApiError};
use crate::pagination::{Page, PageParams};
use crate::payload::{self, created, message, CommentPayload, ThreadPayload};
use crate::validate::Validator;

const COMMENTS_PER_PAGE: u32 = 5;

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub body: String,
    pub parent_id: Option<Uuid>,
}

/// POST /posts/{id}/comment
///
/// A parent comment must exist, belong to the same post, and itself be
/// top-level: threads are one level deep by design, so a reply can never
/// be orphaned from the listing.
pub async fn add(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .db
        .get_post(post_id)
        .map_err(|e| or_not_found(e, "Post not found"))?;

    let mut v = Validator::new();
    v.check_comment_body(&req.body);

    if let Some(parent_id) = req.parent_id {
        match state.db.get_comment(parent_id) {
            Ok(parent) => {
                if parent.post_id != post_id {
                    v.add("parent_id", "The parent comment belongs to another post.");
                } else if parent.parent_id.is_some() {
                    v.add("parent_id", "Replies to replies are not supported.");
                }
            }
            Err(fresco_store::StoreError::NotFound) => {
                v.add("parent_id", "The selected parent id is invalid.");
            }
            Err(other) => return Err(other.into()),
        }
    }
    v.finish()?;

    let comment = state
        .db
        .insert_comment(current.user.id, post_id, req.body.trim(), req.parent_id)?;

    info!(id = %comment.id, post = %post_id, author = %current.user.username, "comment added");

    Ok(created(
        "Comment added successfully",
        CommentPayload::new(comment, &state.config.base_url),
    ))
}

/// GET /posts/{id}/comments — paginated top-level comments, each with its
/// direct replies.
pub async fn list(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(post_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .get_post(post_id)
        .map_err(|e| or_not_found(e, "Post not found"))?;

    let (page, per_page) = params.resolve(COMMENTS_PER_PAGE);
    let offset = PageParams::offset(page, per_page);

    let (threads, total) = state.db.top_level_comments_page(post_id, per_page, offset)?;
    let items: Vec<ThreadPayload> = threads
        .into_iter()
        .map(|t| ThreadPayload::new(t, &state.config.base_url))
        .collect();

    Ok(payload::data(Page::new(items, page, per_page, total)))
}

/// DELETE /comments/{id} — owner only.
pub async fn destroy(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let comment = state
        .db
        .get_comment(id)
        .map_err(|e| or_not_found(e, "Comment not found"))?;

    if comment.user_id != current.user.id {
        return Err(ApiError::Forbidden);
    }

    state.db.delete_comment(id)?;

    info!(id = %id, author = %current.user.username, "comment deleted");
    Ok(message("Comment deleted successfully"))
}
