//! Follow-graph handlers.
//!
//! `follow`/`unfollow` are strict: a redundant request is a conflict.
//! `toggle-follow` flips state and never errors on it.  Counts are live
//! counts of edge rows.

use axum::extract::{Path, Query, State};
use axum::Json;
use fresco_store::{StoreError, User};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::{or_not_found, ApiError};
use crate::pagination::{Page, PageParams};
use crate::payload::{self, message_data, FollowListEntry, SummaryPayload};

const FOLLOWER_LIST_PER_PAGE: u32 = 15;

fn find_target(state: &AppState, username: &str) -> Result<User, ApiError> {
    state
        .db
        .get_user_by_username(username)
        .map_err(|e| or_not_found(e, "User not found"))
}

fn graph_counts(state: &AppState, user: &User) -> Result<Value, ApiError> {
    Ok(json!({
        "followers_count": state.db.count_in_edges(user.id)?,
        "following_count": state.db.count_out_edges(user.id)?,
    }))
}

/// POST /users/{username}/follow
pub async fn follow(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let target = find_target(&state, &username)?;

    if current.user.id == target.id {
        return Err(ApiError::Conflict("You cannot follow yourself".to_string()));
    }

    state
        .db
        .add_edge(current.user.id, target.id)
        .map_err(|e| match e {
            StoreError::Conflict => {
                ApiError::Conflict("You are already following this user".to_string())
            }
            other => other.into(),
        })?;

    info!(follower = %current.user.username, followed = %target.username, "follow");

    Ok(message_data(
        &format!("You are now following {}", target.username),
        graph_counts(&state, &target)?,
    ))
}

/// POST /users/{username}/unfollow
pub async fn unfollow(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let target = find_target(&state, &username)?;

    if !state.db.remove_edge(current.user.id, target.id)? {
        return Err(ApiError::Conflict(
            "You are not following this user".to_string(),
        ));
    }

    info!(follower = %current.user.username, unfollowed = %target.username, "unfollow");

    Ok(message_data(
        &format!("You have unfollowed {}", target.username),
        graph_counts(&state, &target)?,
    ))
}

/// POST /users/{username}/toggle-follow
pub async fn toggle(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let target = find_target(&state, &username)?;

    if current.user.id == target.id {
        return Err(ApiError::Conflict("You cannot follow yourself".to_string()));
    }

    let is_following = if state.db.edge_exists(current.user.id, target.id)? {
        state.db.remove_edge(current.user.id, target.id)?;
        false
    } else {
        // A concurrent follow winning the unique-pair race leaves the edge
        // in place, which is exactly the state this branch reports.
        match state.db.add_edge(current.user.id, target.id) {
            Ok(()) | Err(StoreError::Conflict) => {}
            Err(other) => return Err(other.into()),
        }
        true
    };

    let message = if is_following {
        format!("You are now following {}", target.username)
    } else {
        format!("You have unfollowed {}", target.username)
    };

    let mut data = graph_counts(&state, &target)?;
    data["is_following"] = json!(is_following);

    Ok(message_data(&message, data))
}

#[derive(Deserialize)]
pub struct ListQuery {
    /// `followers` (default) or `following`.
    #[serde(rename = "type")]
    pub list_type: Option<String>,
    // Not a flattened PageParams: serde_urlencoded cannot drive numeric
    // fields through #[serde(flatten)].
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /users/{username}/followers?type=followers|following
///
/// Each listed user is annotated with the caller's relationship to them:
/// one edge-existence check in each direction.
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let target = find_target(&state, &username)?;
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let (page, per_page) = params.resolve(FOLLOWER_LIST_PER_PAGE);
    let offset = PageParams::offset(page, per_page);

    let list_type = query.list_type.as_deref().unwrap_or("followers");
    let (users, total) = match list_type {
        "following" => state.db.list_following(target.id, per_page, offset)?,
        _ => state.db.list_followers(target.id, per_page, offset)?,
    };

    let mut entries = Vec::with_capacity(users.len());
    for user in users {
        let is_following = state.db.edge_exists(current.user.id, user.id)?;
        let is_followed_by = state.db.edge_exists(user.id, current.user.id)?;
        entries.push(FollowListEntry {
            user: SummaryPayload::new(user, &state.config.base_url),
            is_following,
            is_followed_by,
        });
    }

    Ok(payload::data(Page::new(entries, page, per_page, total)))
}

/// GET /users/{username}/follow-status
pub async fn status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let target = find_target(&state, &username)?;

    Ok(payload::data(json!({
        "is_following": state.db.edge_exists(current.user.id, target.id)?,
        "is_followed_by": state.db.edge_exists(target.id, current.user.id)?,
    })))
}
