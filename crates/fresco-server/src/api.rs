//! HTTP router and application state.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use fresco_store::Database;

use crate::comments;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::follow;
use crate::media_store::{content_type_for, MediaStore, POSTS_BUCKET, PROFILE_BUCKET};
use crate::auth;
use crate::posts;
use crate::profile;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub media: Arc<MediaStore>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // Multipart framing adds a little on top of the image itself.
    let body_limit = state.config.max_image_size + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        // Identity & session
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::current_user))
        // Profile
        .route("/profile", get(profile::show_own).put(profile::update))
        .route("/profile/password", put(profile::change_password))
        .route(
            "/profile/picture",
            post(profile::upload_picture).delete(profile::remove_picture),
        )
        .route("/profile/{username}", get(profile::show_public))
        // Follow graph
        .route("/users/{username}/follow", post(follow::follow))
        .route("/users/{username}/unfollow", post(follow::unfollow))
        .route("/users/{username}/toggle-follow", post(follow::toggle))
        .route("/users/{username}/followers", get(follow::list))
        .route("/users/{username}/follow-status", get(follow::status))
        .route("/users/{username}/posts", get(posts::user_posts))
        // Posts
        .route("/feed", get(posts::feed))
        .route("/posts", get(posts::index).post(posts::create))
        .route(
            "/posts/{id}",
            get(posts::show).put(posts::update).delete(posts::destroy),
        )
        .route("/posts/{id}/like", post(posts::toggle_like))
        // Comments
        .route("/posts/{id}/comment", post(comments::add))
        .route("/posts/{id}/comments", get(comments::list))
        .route("/comments/{id}", delete(comments::destroy))
        // Stored images
        .route("/img/{bucket}/{filename}", get(serve_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /img/{bucket}/{filename} — read-through serving of stored images
/// with a content type derived from the file extension.
async fn serve_image(
    State(state): State<AppState>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    if bucket != POSTS_BUCKET && bucket != PROFILE_BUCKET {
        return Err(ApiError::NotFound("Image not found".to_string()));
    }

    let data = state.media.read_image(&bucket, &filename).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], data))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "fresco-test-boundary";

    async fn test_app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::in_memory().unwrap();
        let media = MediaStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        let state = AppState {
            db: Arc::new(db),
            media: Arc::new(media),
            config: Arc::new(ServerConfig::default()),
        };
        (build_router(state), dir)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Build a `multipart/form-data` body with optional text fields and one
    /// optional file field.
    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, filename, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn send_multipart(
        app: &Router,
        uri: &str,
        token: &str,
        body: Vec<u8>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, username: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/register",
            None,
            Some(json!({
                "name": username,
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "hunter2hunter2",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn create_post(app: &Router, token: &str, caption: &str) -> Value {
        let body = multipart_body(
            &[("caption", caption)],
            Some(("image", "photo.jpg", b"fake-jpeg-bytes")),
        );
        let (status, body) = send_multipart(app, "/posts", token, body).await;
        assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
        body["data"].clone()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn register_login_logout_flow() {
        let (app, _dir) = test_app().await;
        let token = register(&app, "alice").await;

        // The session works.
        let (status, body) = send(&app, "GET", "/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["username"], "alice");

        // Login by username and by email, wrong password is opaque.
        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"login": "alice", "password": "hunter2hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"login": "alice@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert!(body["errors"]["login"].is_array());

        // Logout invalidates the token.
        let (status, _) = send(&app, "POST", "/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_registration_is_field_keyed() {
        let (app, _dir) = test_app().await;
        register(&app, "alice").await;

        let (status, body) = send(
            &app,
            "POST",
            "/register",
            None,
            Some(json!({
                "name": "Alice Again",
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2hunter2",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["username"].is_array());
        assert!(body["errors"]["email"].is_array());
    }

    #[tokio::test]
    async fn protected_routes_require_auth() {
        let (app, _dir) = test_app().await;
        for uri in ["/feed", "/profile", "/user"] {
            let (status, _) = send(&app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn follow_rules() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;
        register(&app, "bob").await;

        // Self-follow is rejected.
        let (status, _) = send(&app, "POST", "/users/alice/follow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        // Follow, then duplicate follow conflicts.
        let (status, body) = send(&app, "POST", "/users/bob/follow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["followers_count"], 1);
        let (status, _) = send(&app, "POST", "/users/bob/follow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = send(&app, "GET", "/users/bob/follow-status", Some(&alice), None).await;
        assert_eq!(body["data"]["is_following"], true);
        assert_eq!(body["data"]["is_followed_by"], false);

        // Unfollow, then duplicate unfollow conflicts.
        let (status, _) = send(&app, "POST", "/users/bob/unfollow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", "/users/bob/unfollow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        // Unknown target is 404, before any state check.
        let (status, _) = send(&app, "POST", "/users/nobody/follow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn toggle_follow_is_its_own_inverse() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;
        register(&app, "bob").await;

        let (status, body) =
            send(&app, "POST", "/users/bob/toggle-follow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_following"], true);

        let (status, body) =
            send(&app, "POST", "/users/bob/toggle-follow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_following"], false);
        assert_eq!(body["data"]["followers_count"], 0);
    }

    #[tokio::test]
    async fn follower_listing_annotates_relationships() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;
        let carol = register(&app, "carol").await;

        // bob and carol follow alice; alice follows bob back.
        send(&app, "POST", "/users/alice/follow", Some(&bob), None).await;
        send(&app, "POST", "/users/alice/follow", Some(&carol), None).await;
        send(&app, "POST", "/users/bob/follow", Some(&alice), None).await;

        let (status, body) = send(
            &app,
            "GET",
            "/users/alice/followers?type=followers",
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(body["data"]["total"], 2);

        let bob_row = items.iter().find(|u| u["username"] == "bob").unwrap();
        assert_eq!(bob_row["is_following"], true);
        assert_eq!(bob_row["is_followed_by"], true);

        let carol_row = items.iter().find(|u| u["username"] == "carol").unwrap();
        assert_eq!(carol_row["is_following"], false);
        assert_eq!(carol_row["is_followed_by"], true);

        let (_, body) = send(
            &app,
            "GET",
            "/users/bob/followers?type=following",
            Some(&alice),
            None,
        )
        .await;
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["username"], "alice");
    }

    #[tokio::test]
    async fn feed_and_like_scenario() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        send(&app, "POST", "/users/bob/follow", Some(&alice), None).await;
        let post = create_post(&app, &bob, "hello").await;
        let post_id = post["id"].as_str().unwrap().to_string();

        // Alice's feed carries bob's post, not yet liked.
        let (status, body) = send(&app, "GET", "/feed", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["caption"], "hello");
        assert_eq!(items[0]["user"]["username"], "bob");
        assert_eq!(items[0]["is_liked"], false);

        // Like, then unlike; the toggle is its own inverse.
        let uri = format!("/posts/{post_id}/like");
        let (status, body) = send(&app, "POST", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["liked"], true);
        assert_eq!(body["like_count"], 1);

        let (_, body) = send(&app, "POST", &uri, Some(&alice), None).await;
        assert_eq!(body["liked"], false);
        assert_eq!(body["like_count"], 0);

        // A stranger's post stays out of the feed.
        let carol = register(&app, "carol").await;
        create_post(&app, &carol, "unrelated").await;
        let (_, body) = send(&app, "GET", "/feed", Some(&alice), None).await;
        assert_eq!(body["data"]["total"], 1);
    }

    #[tokio::test]
    async fn post_ownership_rules() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let post = create_post(&app, &bob, "bob's post").await;
        let post_id = post["id"].as_str().unwrap().to_string();

        // Not the owner: update and delete are forbidden.
        let uri = format!("/posts/{post_id}");
        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&alice),
            Some(json!({"caption": "hijacked"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Missing post wins over ownership: unknown id is 404 for anyone.
        let missing = format!("/posts/{}", uuid::Uuid::new_v4());
        let (status, _) = send(
            &app,
            "PUT",
            &missing,
            Some(&alice),
            Some(json!({"caption": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // The owner can edit.
        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&bob),
            Some(json!({"caption": "edited"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["caption"], "edited");
    }

    #[tokio::test]
    async fn deleting_a_post_removes_row_and_image() {
        let (app, _dir) = test_app().await;
        let bob = register(&app, "bob").await;

        let post = create_post(&app, &bob, "doomed").await;
        let post_id = post["id"].as_str().unwrap().to_string();
        let image_path = post["image_path"].as_str().unwrap().to_string();

        // The image serves while the post exists.
        let img_uri = format!("/img/{image_path}");
        let (status, _) = send(&app, "GET", &img_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/posts/{post_id}"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", &format!("/posts/{post_id}"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", &img_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_requires_image() {
        let (app, _dir) = test_app().await;
        let bob = register(&app, "bob").await;

        let body = multipart_body(&[("caption", "no image")], None);
        let (status, body) = send_multipart(&app, "/posts", &bob, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["image"].is_array());

        let body = multipart_body(&[], Some(("image", "script.exe", b"MZ")));
        let (status, _) = send_multipart(&app, "/posts", &bob, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn comment_threads() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let post = create_post(&app, &bob, "discuss").await;
        let post_id = post["id"].as_str().unwrap().to_string();
        let comment_uri = format!("/posts/{post_id}/comment");

        let (status, body) = send(
            &app,
            "POST",
            &comment_uri,
            Some(&alice),
            Some(json!({"body": "first!"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let top_id = body["data"]["id"].as_str().unwrap().to_string();

        // Reply to the top-level comment.
        let (status, body) = send(
            &app,
            "POST",
            &comment_uri,
            Some(&bob),
            Some(json!({"body": "welcome", "parent_id": top_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let reply_id = body["data"]["id"].as_str().unwrap().to_string();

        // A reply to a reply is rejected.
        let (status, body) = send(
            &app,
            "POST",
            &comment_uri,
            Some(&alice),
            Some(json!({"body": "too deep", "parent_id": reply_id})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["parent_id"].is_array());

        // A dangling parent is rejected and nothing is persisted.
        let (status, _) = send(
            &app,
            "POST",
            &comment_uri,
            Some(&alice),
            Some(json!({"body": "orphan", "parent_id": uuid::Uuid::new_v4()})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        // Listing: one top-level comment, reply nested beneath it.
        let (status, body) = send(
            &app,
            "GET",
            &format!("/posts/{post_id}/comments"),
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 1);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"].as_str().unwrap(), top_id);
        assert_eq!(items[0]["reply_count"], 1);
        assert_eq!(items[0]["replies"][0]["id"].as_str().unwrap(), reply_id);

        // Only the author may delete a comment.
        let delete_uri = format!("/comments/{top_id}");
        let (status, _) = send(&app, "DELETE", &delete_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "DELETE", &delete_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn profile_update_and_password_change() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;
        register(&app, "bob").await;

        // Partial update.
        let (status, body) = send(
            &app,
            "PUT",
            "/profile",
            Some(&alice),
            Some(json!({"name": "Alice Cooper"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Alice Cooper");
        assert_eq!(body["data"]["username"], "alice");

        // Someone else's username is taken.
        let (status, body) = send(
            &app,
            "PUT",
            "/profile",
            Some(&alice),
            Some(json!({"username": "bob"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["username"].is_array());

        // Keeping your own username is fine.
        let (status, _) = send(
            &app,
            "PUT",
            "/profile",
            Some(&alice),
            Some(json!({"username": "alice"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Password change requires the current password.
        let (status, body) = send(
            &app,
            "PUT",
            "/profile/password",
            Some(&alice),
            Some(json!({"current_password": "wrong", "password": "brand-new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["current_password"].is_array());

        let (status, _) = send(
            &app,
            "PUT",
            "/profile/password",
            Some(&alice),
            Some(json!({"current_password": "hunter2hunter2", "password": "brand-new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Old password no longer works, the new one does.
        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"login": "alice", "password": "hunter2hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"login": "alice", "password": "brand-new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn profile_picture_lifecycle() {
        let (app, _dir) = test_app().await;
        let alice = register(&app, "alice").await;

        // Nothing to remove yet.
        let (status, _) = send(&app, "DELETE", "/profile/picture", Some(&alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = multipart_body(&[], Some(("profile_picture", "me.png", b"png-bytes")));
        let (status, body) = send_multipart(&app, "/profile/picture", &alice, body).await;
        assert_eq!(status, StatusCode::OK, "upload failed: {body}");
        let path = body["data"]["profile_picture"].as_str().unwrap().to_string();
        assert!(path.starts_with("profile/"));

        // The public profile now carries the derived URL.
        let (_, body) = send(&app, "GET", "/profile/alice", Some(&alice), None).await;
        let url = body["data"]["profile_picture_url"].as_str().unwrap();
        assert!(url.ends_with(&path));

        let (status, _) = send(&app, "DELETE", "/profile/picture", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", "/profile/picture", Some(&alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn user_posts_include_profile_summary() {
        let (app, _dir) = test_app().await;
        let bob = register(&app, "bob").await;
        create_post(&app, &bob, "one").await;
        create_post(&app, &bob, "two").await;

        let (status, body) = send(&app, "GET", "/users/bob/posts", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["username"], "bob");
        assert!(body["data"]["user"]["email"].is_null());
        assert_eq!(body["data"]["posts"]["total"], 2);
        // Reverse-chronological: the newest post leads.
        assert_eq!(body["data"]["posts"]["items"][0]["caption"], "two");
    }

    #[tokio::test]
    async fn feed_pagination_totals() {
        let (app, _dir) = test_app().await;
        let bob = register(&app, "bob").await;
        for i in 0..3 {
            create_post(&app, &bob, &format!("post {i}")).await;
        }

        let (status, body) = send(&app, "GET", "/feed?per_page=2", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 3);
        assert_eq!(body["data"]["total_pages"], 2);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, "GET", "/feed?per_page=2&page=2", Some(&bob), None).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    }
}
