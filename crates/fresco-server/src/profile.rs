//! Profile handlers: own profile, public profiles, partial updates,
//! password change and the avatar.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::AppState;
use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::error::{or_not_found, ApiError};
use crate::media_store::{image_extension, PROFILE_BUCKET};
use crate::payload::{self, image_url, message, message_data, profile_payload, user_payload};
use crate::validate::Validator;

/// GET /profile
pub async fn show_own(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let payload = user_payload(&state.db, &current.user, &state.config.base_url)?;
    Ok(payload::data(payload))
}

/// GET /profile/{username} — public fields only.
pub async fn show_public(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .db
        .get_user_by_username(&username)
        .map_err(|e| or_not_found(e, "User not found"))?;

    let payload = profile_payload(&state.db, &user, &state.config.base_url)?;
    Ok(payload::data(payload))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// PUT /profile — partial update; absent fields are left alone.
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    if let Some(name) = &req.name {
        v.check_name(name);
    }
    if let Some(username) = &req.username {
        v.check_username(username);
        if state.db.username_taken(username, Some(current.user.id))? {
            v.add("username", "The username has already been taken.");
        }
    }
    if let Some(email) = &req.email {
        v.check_email(email);
        if state.db.email_taken(email, Some(current.user.id))? {
            v.add("email", "The email has already been taken.");
        }
    }
    v.finish()?;

    let updated = state.db.update_user_fields(
        current.user.id,
        req.name.as_deref(),
        req.username.as_deref(),
        req.email.as_deref(),
    )?;

    let payload = user_payload(&state.db, &updated, &state.config.base_url)?;
    Ok(message_data("Profile updated successfully", payload))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
}

/// PUT /profile/password — the current password is verified against the
/// stored hash before the new one is accepted.
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    if req.current_password.is_empty() {
        v.add("current_password", "The current password field is required.");
    }
    v.check_password("password", &req.password);
    v.finish()?;

    if !verify_password(&req.current_password, &current.user.password_hash) {
        return Err(ApiError::field(
            "current_password",
            "The provided password does not match our records.",
        ));
    }

    let hash = hash_password(&req.password)?;
    state.db.set_password_hash(current.user.id, &hash)?;

    info!(username = %current.user.username, "password changed");
    Ok(message("Password updated successfully"))
}

/// POST /profile/picture (multipart: `profile_picture`)
///
/// The new file is written first; the row update failing rolls the file
/// back.  The previous file is deleted only after the row points at the
/// new one.
pub async fn upload_picture(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::field("profile_picture", &format!("Multipart error: {e}")))?
    {
        if field.name() == Some("profile_picture") {
            let filename = field.file_name().unwrap_or("").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::field("profile_picture", &format!("Upload failed: {e}")))?;
            upload = Some((filename, data.to_vec()));
        }
    }

    let Some((filename, data)) = upload else {
        return Err(ApiError::field(
            "profile_picture",
            "The profile picture field is required.",
        ));
    };
    let Some(ext) = image_extension(&filename) else {
        return Err(ApiError::field(
            "profile_picture",
            "The profile picture must be a file of type: jpeg, png, jpg, gif.",
        ));
    };

    let discriminator = current.user.id.simple().to_string();
    let new_path = state
        .media
        .store_image(PROFILE_BUCKET, &discriminator[..8], &ext, &data)
        .await?;

    if let Err(e) = state
        .db
        .set_profile_picture(current.user.id, Some(&new_path))
    {
        // Roll the orphaned file back before surfacing the failure.
        let _ = state.media.delete_image(&new_path).await;
        return Err(e.into());
    }

    if let Some(old) = &current.user.profile_picture {
        if let Err(e) = state.media.delete_image(old).await {
            warn!(path = %old, error = %e, "failed to delete replaced profile picture");
        }
    }

    info!(username = %current.user.username, path = %new_path, "profile picture updated");

    Ok(message_data(
        "Profile picture uploaded successfully",
        json!({
            "profile_picture": new_path,
            "profile_picture_url": image_url(&state.config.base_url, &new_path),
        }),
    ))
}

/// DELETE /profile/picture
pub async fn remove_picture(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let Some(path) = &current.user.profile_picture else {
        return Err(ApiError::BadState(
            "No profile picture to remove".to_string(),
        ));
    };

    state.media.delete_image(path).await?;
    state.db.set_profile_picture(current.user.id, None)?;

    Ok(message("Profile picture removed successfully"))
}
