use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::authz::{Action, AuthTarget};
use crate::errors::AppResult;
use crate::models::organization::{
    Organization, OrganizationCreateRequest, OrganizationMoveRequest, OrganizationUpdateRequest,
};
use crate::routes::{forbidden, require_staff};

pub async fn create_root(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<OrganizationCreateRequest>,
) -> AppResult<(StatusCode, Json<Organization>)> {
    require_staff(&auth.user)?;
    let org = state.tree.add_root(&payload.title).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

pub async fn create_child(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrganizationCreateRequest>,
) -> AppResult<(StatusCode, Json<Organization>)> {
    require_staff(&auth.user)?;
    let org = state.tree.add_child(id, &payload.title).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrganizationUpdateRequest>,
) -> AppResult<Json<Organization>> {
    let org = state.tree.require(id).await?;
    let allowed = state
        .engine
        .authorize(Some(&auth.user), Action::Update, AuthTarget::Resource(&org))
        .await?;
    if !allowed {
        return Err(forbidden());
    }

    sqlx::query("UPDATE organizations SET title = ? WHERE id = ?")
        .bind(&payload.title)
        .bind(org.id)
        .execute(&state.pool)
        .await?;

    state.tree.require(id).await.map(Json)
}

pub async fn move_to(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrganizationMoveRequest>,
) -> AppResult<Json<Organization>> {
    require_staff(&auth.user)?;
    let org = state.tree.move_to(id, payload.new_parent_id).await?;
    Ok(Json(org))
}

pub async fn rebuild(State(state): State<AppState>, auth: CurrentUser) -> AppResult<StatusCode> {
    require_staff(&auth.user)?;
    state.tree.rebuild().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Organization>> {
    state.tree.require(id).await.map(Json)
}

pub async fn ancestors(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Organization>>> {
    let org = state.tree.require(id).await?;
    state.tree.ancestors(&org).await.map(Json)
}

pub async fn children(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Organization>>> {
    let org = state.tree.require(id).await?;
    state.tree.children(&org).await.map(Json)
}
