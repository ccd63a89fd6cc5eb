use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/task/create-task", post(handlers::create_task))
        .route("/task/get-task/:id", get(handlers::get_task))
        .route("/task/get-all-task", get(handlers::get_all_tasks))
        .route("/task/delete-task/:id", delete(handlers::delete_task))
}
