use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::models::task::{Task, TaskCreateRequest, TaskType};
use crate::routes::{forbidden, require_staff};
use crate::tasks::NewTask;

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    /// Evaluate the inbox as of this date instead of today.
    pub now: Option<NaiveDate>,
}

pub async fn inbox(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<InboxQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let now = query.now.unwrap_or_else(|| Utc::now().date_naive());
    let tasks = state.scheduler.active_tasks(&auth.user, now).await?;
    Ok(Json(tasks))
}

/// Raw task creation is the collaborator boundary (comment, request and
/// error-detection flows); only staff may hit it over HTTP.
pub async fn create(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    require_staff(&auth.user)?;

    let task_type = TaskType::parse(&payload.task_type)
        .ok_or_else(|| AppError::bad_request("unknown task type"))?;
    let role = match payload.role.as_deref() {
        Some(raw) => Some(
            Role::parse(raw)
                .filter(Role::is_binding_role)
                .ok_or_else(|| AppError::bad_request("task role must be coordinator or manager"))?,
        ),
        None => None,
    };

    let task = state
        .tasks
        .create(NewTask {
            title: payload.title,
            task_type,
            user_id: payload.user_id,
            organization_id: payload.organization_id,
            role,
            due_date: payload.due_date,
            principal_kind: payload.principal_kind,
            principal_id: payload.principal_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn assign(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Task>> {
    ensure_visible(&state, &auth, id).await?;
    let task = state.tasks.assign(id, auth.user.id).await?;
    Ok(Json(task))
}

pub async fn close(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Task>> {
    ensure_visible(&state, &auth, id).await?;
    let task = state.tasks.close(id).await?;
    Ok(Json(task))
}

/// A task can only be acted on by someone it is currently visible to.
async fn ensure_visible(state: &AppState, auth: &CurrentUser, id: Uuid) -> AppResult<()> {
    let now = Utc::now().date_naive();
    let visible = state.scheduler.active_tasks(&auth.user, now).await?;
    if visible.iter().any(|task| task.id == id) {
        Ok(())
    } else {
        Err(forbidden())
    }
}
