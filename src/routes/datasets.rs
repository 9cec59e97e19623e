use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::authz::{Action, AuthTarget, ResourceKind};
use crate::errors::{AppError, AppResult};
use crate::models::dataset::{
    Dataset, DatasetCreateRequest, DatasetDistribution, DatasetStructure, DatasetUpdateRequest,
    DistributionCreateRequest, StructureCreateRequest,
};
use crate::routes::forbidden;

pub async fn create(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<DatasetCreateRequest>,
) -> AppResult<(StatusCode, Json<Dataset>)> {
    let organization = state.tree.require(payload.organization_id).await?;
    let allowed = state
        .engine
        .authorize(
            Some(&auth.user),
            Action::Create,
            AuthTarget::Create {
                kind: ResourceKind::Dataset,
                parent: Some(&organization),
            },
        )
        .await?;
    if !allowed {
        return Err(forbidden());
    }

    let dataset = Dataset {
        id: Uuid::new_v4(),
        title: payload.title,
        organization_id: organization.id,
        user_id: Some(auth.user.id),
        created: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO datasets (id, title, organization_id, user_id, created) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(dataset.id)
    .bind(&dataset.title)
    .bind(dataset.organization_id)
    .bind(dataset.user_id)
    .bind(dataset.created)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(dataset)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DatasetUpdateRequest>,
) -> AppResult<Json<Dataset>> {
    let dataset = fetch_dataset(&state, id).await?;
    let allowed = state
        .engine
        .authorize(Some(&auth.user), Action::Update, AuthTarget::Resource(&dataset))
        .await?;
    if !allowed {
        return Err(forbidden());
    }

    sqlx::query("UPDATE datasets SET title = ? WHERE id = ?")
        .bind(&payload.title)
        .bind(id)
        .execute(&state.pool)
        .await?;

    fetch_dataset(&state, id).await.map(Json)
}

pub async fn delete(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let dataset = fetch_dataset(&state, id).await?;
    let allowed = state
        .engine
        .authorize(Some(&auth.user), Action::Delete, AuthTarget::Resource(&dataset))
        .await?;
    if !allowed {
        return Err(forbidden());
    }

    sqlx::query("DELETE FROM datasets WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_distribution(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DistributionCreateRequest>,
) -> AppResult<(StatusCode, Json<DatasetDistribution>)> {
    let dataset = fetch_dataset(&state, id).await?;
    let allowed = state
        .engine
        .authorize(
            Some(&auth.user),
            Action::Create,
            AuthTarget::Create {
                kind: ResourceKind::Distribution,
                parent: Some(&dataset),
            },
        )
        .await?;
    if !allowed {
        return Err(forbidden());
    }

    let distribution = DatasetDistribution {
        id: Uuid::new_v4(),
        title: payload.title,
        dataset_id: dataset.id,
        user_id: Some(auth.user.id),
        created: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO dataset_distributions (id, title, dataset_id, user_id, created) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(distribution.id)
    .bind(&distribution.title)
    .bind(distribution.dataset_id)
    .bind(distribution.user_id)
    .bind(distribution.created)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(distribution)))
}

pub async fn add_structure(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StructureCreateRequest>,
) -> AppResult<(StatusCode, Json<DatasetStructure>)> {
    let dataset = fetch_dataset(&state, id).await?;
    let allowed = state
        .engine
        .authorize(
            Some(&auth.user),
            Action::Create,
            AuthTarget::Create {
                kind: ResourceKind::Structure,
                parent: Some(&dataset),
            },
        )
        .await?;
    if !allowed {
        return Err(forbidden());
    }

    let structure = DatasetStructure {
        id: Uuid::new_v4(),
        title: payload.title,
        dataset_id: dataset.id,
        user_id: Some(auth.user.id),
        created: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO dataset_structures (id, title, dataset_id, user_id, created) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(structure.id)
    .bind(&structure.title)
    .bind(structure.dataset_id)
    .bind(structure.user_id)
    .bind(structure.created)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(structure)))
}

async fn fetch_dataset(state: &AppState, id: Uuid) -> AppResult<Dataset> {
    sqlx::query_as::<_, Dataset>(
        "SELECT id, title, organization_id, user_id, created FROM datasets WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("dataset not found"))
}
