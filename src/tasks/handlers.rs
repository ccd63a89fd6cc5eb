use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    respond::{success, success_message, Envelope},
    state::AppState,
    users::jwt::AuthUser,
};

use super::{
    dto::{CreateTaskRequest, TaskListData},
    repo::Task,
};

/// Task ids arrive as raw path segments. A syntactically invalid id cannot
/// name any task, so it reports exactly like an id that matches nothing —
/// same envelope, same status.
fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Task not found".into()))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Envelope<Task>>), ApiError> {
    let title = payload
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("title is required".into()))?;
    let description = payload
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("description is required".into()))?;

    let task = Task::create(&state.db, &claims.email, &title, &description).await?;

    info!(task_id = %task.id, owner = %task.creator_email, "task created");
    Ok((
        StatusCode::CREATED,
        success("Task created successful", task),
    ))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Task>>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = Task::find_by_owner(&state.db, id, &claims.email)
        .await?
        .ok_or_else(|| {
            warn!(task_id = %id, owner = %claims.email, "task not found for owner");
            ApiError::NotFound("Task not found".into())
        })?;
    Ok(success("Task found", task))
}

#[instrument(skip(state))]
pub async fn get_all_tasks(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Envelope<TaskListData>>, ApiError> {
    let tasks = Task::list_by_owner(&state.db, &claims.email).await?;
    Ok(success(
        "Your Tasks found",
        TaskListData {
            count: tasks.len(),
            my_tasks: tasks,
        },
    ))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let id = parse_task_id(&id)?;
    match Task::delete_by_owner(&state.db, id, &claims.email).await? {
        Some(task_id) => {
            info!(task_id = %task_id, owner = %claims.email, "task deleted");
            Ok(success_message("Task deleted"))
        }
        None => {
            warn!(task_id = %id, owner = %claims.email, "task not found for owner");
            Err(ApiError::NotFound("Task not found".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlx::PgPool;

    use crate::state::test_support::{self, MemoryStorage};
    use crate::users::jwt::Claims;

    fn claims_for(email: &str) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: email.into(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn malformed_task_id_reads_as_not_found() {
        assert!(matches!(
            parse_task_id("not-a-uuid"),
            Err(ApiError::NotFound(m)) if m == "Task not found"
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_task_id(&id.to_string()).unwrap(), id);
    }

    #[tokio::test]
    async fn create_task_requires_title_and_description() {
        let state = test_support::state_without_db();
        let a = claims_for("a@x.com");

        let err = create_task(
            State(state.clone()),
            AuthUser(a.clone()),
            Json(CreateTaskRequest {
                title: None,
                description: Some("d1".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "title is required"));

        let err = create_task(
            State(state.clone()),
            AuthUser(a),
            Json(CreateTaskRequest {
                title: Some("t1".into()),
                description: Some("   ".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "description is required"));
    }

    async fn create_for(state: &crate::state::AppState, claims: &Claims, title: &str) -> Task {
        let (status, Json(env)) = create_task(
            State(state.clone()),
            AuthUser(claims.clone()),
            Json(CreateTaskRequest {
                title: Some(title.into()),
                description: Some("desc".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        env.data.unwrap()
    }

    #[sqlx::test]
    async fn ownership_filter_hides_other_users_tasks(db: PgPool) {
        let state = test_support::state_with(db, MemoryStorage::default());
        let a = claims_for("a@x.com");
        let b = claims_for("b@y.com");

        let task_a = create_for(&state, &a, "t1").await;
        assert_eq!(task_a.creator_email, "a@x.com");
        let task_b = create_for(&state, &b, "t2").await;

        // B's task id under A's identity is indistinguishable from a
        // missing task.
        let err = get_task(
            State(state.clone()),
            AuthUser(a.clone()),
            Path(task_b.id.to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Each owner lists only their own tasks.
        let Json(env) = get_all_tasks(State(state.clone()), AuthUser(a.clone()))
            .await
            .unwrap();
        let data = env.data.unwrap();
        assert_eq!(data.count, 1);
        assert_eq!(data.my_tasks[0].id, task_a.id);

        // The owner still sees it.
        let Json(env) = get_task(
            State(state.clone()),
            AuthUser(b.clone()),
            Path(task_b.id.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(env.data.unwrap().id, task_b.id);
    }

    #[sqlx::test]
    async fn delete_requires_matching_owner(db: PgPool) {
        let state = test_support::state_with(db, MemoryStorage::default());
        let a = claims_for("a@x.com");
        let b = claims_for("b@y.com");
        let task_b = create_for(&state, &b, "t2").await;

        // A cross-owner delete fails and leaves the task in place.
        let err = delete_task(
            State(state.clone()),
            AuthUser(a.clone()),
            Path(task_b.id.to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(Task::find_by_owner(&state.db, task_b.id, "b@y.com")
            .await
            .unwrap()
            .is_some());

        // The owner's delete removes it.
        delete_task(
            State(state.clone()),
            AuthUser(b.clone()),
            Path(task_b.id.to_string()),
        )
        .await
        .unwrap();
        assert!(Task::find_by_owner(&state.db, task_b.id, "b@y.com")
            .await
            .unwrap()
            .is_none());
    }
}
