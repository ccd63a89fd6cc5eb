use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(handlers::register))
        .route("/user/activate-user", post(handlers::activate))
        .route("/user/login", post(handlers::login))
        .route("/user/update-profile", patch(handlers::update_profile))
        .route("/user/my-profile", get(handlers::my_profile))
        // register and update-profile carry multipart image uploads
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}
