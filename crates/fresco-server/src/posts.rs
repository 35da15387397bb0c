//! Post handlers: CRUD, the feed, per-user listings and the like toggle.
//!
//! Missing-entity checks come before ownership checks; ownership checks come
//! before any write.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::{or_not_found, ApiError};
use crate::media_store::{image_extension, POSTS_BUCKET};
use crate::pagination::{Page, PageParams};
use crate::payload::{self, created, message, message_data, profile_payload, PostPayload};
use crate::validate::Validator;

const POSTS_PER_PAGE: u32 = 10;

/// GET /posts — every post on the instance.
pub async fn index(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let (page, per_page) = params.resolve(POSTS_PER_PAGE);
    let offset = PageParams::offset(page, per_page);

    let (views, total) = state.db.all_posts_page(current.user.id, per_page, offset)?;
    let items: Vec<PostPayload> = views
        .into_iter()
        .map(|v| PostPayload::new(v, &state.config.base_url))
        .collect();

    Ok(payload::data(Page::new(items, page, per_page, total)))
}

/// GET /feed — posts by the caller and the accounts they follow,
/// reverse-chronological.
pub async fn feed(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let (page, per_page) = params.resolve(POSTS_PER_PAGE);
    let offset = PageParams::offset(page, per_page);

    let (views, total) = state.db.feed_page(current.user.id, per_page, offset)?;
    let items: Vec<PostPayload> = views
        .into_iter()
        .map(|v| PostPayload::new(v, &state.config.base_url))
        .collect();

    Ok(payload::data(Page::new(items, page, per_page, total)))
}

/// GET /users/{username}/posts — the user's posts plus a profile summary.
pub async fn user_posts(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let author = state
        .db
        .get_user_by_username(&username)
        .map_err(|e| or_not_found(e, "User not found"))?;

    let (page, per_page) = params.resolve(POSTS_PER_PAGE);
    let offset = PageParams::offset(page, per_page);

    let (views, total) = state
        .db
        .user_posts_page(author.id, current.user.id, per_page, offset)?;
    let items: Vec<PostPayload> = views
        .into_iter()
        .map(|v| PostPayload::new(v, &state.config.base_url))
        .collect();

    Ok(payload::data(json!({
        "user": profile_payload(&state.db, &author, &state.config.base_url)?,
        "posts": Page::new(items, page, per_page, total),
    })))
}

/// POST /posts (multipart: `image` required, `caption` optional)
///
/// The image file is written before the row; if the row write fails the
/// file is removed again so storage and database stay consistent.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut caption: Option<String> = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::field("image", &format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("caption") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::field("caption", &format!("Upload failed: {e}")))?;
                caption = Some(text);
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::field("image", &format!("Upload failed: {e}")))?;
                image = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let mut v = Validator::new();
    if let Some(caption) = &caption {
        v.check_caption(caption);
    }
    let Some((filename, data)) = image else {
        v.add("image", "The image field is required.");
        return Err(v.into_error());
    };
    let Some(ext) = image_extension(&filename) else {
        v.add(
            "image",
            "The image must be a file of type: jpeg, png, jpg, gif.",
        );
        return Err(v.into_error());
    };
    v.finish()?;

    let image_path = state
        .media
        .store_image(POSTS_BUCKET, "", &ext, &data)
        .await?;

    let post = match state
        .db
        .insert_post(current.user.id, &image_path, caption.as_deref())
    {
        Ok(post) => post,
        Err(e) => {
            let _ = state.media.delete_image(&image_path).await;
            return Err(e.into());
        }
    };

    info!(id = %post.id, author = %current.user.username, "post created");

    let view = state.db.get_post_view(post.id, current.user.id)?;
    Ok(created(
        "Post created successfully",
        PostPayload::new(view, &state.config.base_url),
    ))
}

/// GET /posts/{id}
pub async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let view = state
        .db
        .get_post_view(id, current.user.id)
        .map_err(|e| or_not_found(e, "Post not found"))?;

    Ok(payload::data(PostPayload::new(
        view,
        &state.config.base_url,
    )))
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub caption: String,
}

/// PUT /posts/{id} — caption is the only mutable field, owner only.
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    if req.caption.is_empty() {
        v.add("caption", "The caption field is required.");
    }
    v.check_caption(&req.caption);
    v.finish()?;

    let post = state
        .db
        .get_post(id)
        .map_err(|e| or_not_found(e, "Post not found"))?;

    if post.user_id != current.user.id {
        return Err(ApiError::Forbidden);
    }

    state.db.update_post_caption(id, &req.caption)?;

    let view = state.db.get_post_view(id, current.user.id)?;
    Ok(message_data(
        "Post caption updated successfully",
        PostPayload::new(view, &state.config.base_url),
    ))
}

/// DELETE /posts/{id} — owner only; the stored image file goes first, then
/// the row (comments and likes cascade with it).
pub async fn destroy(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let post = state
        .db
        .get_post(id)
        .map_err(|e| or_not_found(e, "Post not found"))?;

    if post.user_id != current.user.id {
        return Err(ApiError::Forbidden);
    }

    state.media.delete_image(&post.image_path).await?;
    state.db.delete_post(id)?;

    info!(id = %id, author = %current.user.username, "post deleted");
    Ok(message("Post deleted successfully"))
}

/// POST /posts/{id}/like — flip the caller's like and report the fresh
/// count.
pub async fn toggle_like(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .get_post(id)
        .map_err(|e| or_not_found(e, "Post not found"))?;

    let toggle = state.db.toggle_like(current.user.id, id)?;

    let message = if toggle.liked {
        "Post liked successfully"
    } else {
        "Post unliked successfully"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "liked": toggle.liked,
        "like_count": toggle.like_count,
    })))
}
