//! Blogging backend built with Rust.
//!
//! Accounts with JWT auth and email password reset, posts with tags and
//! drafts, comments, a like toggle, profiles and image uploads, all exposed
//! as a JSON API over PostgreSQL.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use handlers::{comments, http, posts, profiles, upload};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the API router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let upload_limit = state.uploads.max_bytes + MULTIPART_OVERHEAD_BYTES;

    let auth_routes = axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/password-reset-request", post(auth::request_password_reset))
        .route("/password_reset_request", post(auth::request_password_reset))
        .route(
            "/password-reset/:token",
            get(auth::verify_reset_token).post(auth::reset_password_with_path_token),
        )
        .route("/password_reset", post(auth::reset_password));

    let api_routes = axum::Router::new()
        .nest("/auth", auth_routes)
        .route("/me", get(profiles::get_me).put(profiles::update_profile))
        .route("/edit_profile", put(profiles::update_profile))
        .route("/users/:username", get(profiles::get_user_profile))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/tags", get(posts::list_tags))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like", post(posts::like_post))
        .route(
            "/posts/:id/comment",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/posts/:id/comment/:comment_id",
            delete(comments::delete_post_comment),
        )
        .route("/comments/:id", delete(comments::delete_comment))
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload_limit)),
        );

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/api", api_routes)
        .nest_service(
            upload::UPLOAD_ROUTE_PREFIX,
            ServeDir::new(state.uploads.dir.clone()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
