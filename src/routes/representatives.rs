use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::authz::principal::AclResource;
use crate::authz::{Action, AuthTarget, ResourceKind, Role};
use crate::errors::{AppError, AppResult};
use crate::models::dataset::Dataset;
use crate::models::project::Project;
use crate::models::representative::{DbRepresentative, Representative, RepresentativeInviteRequest};
use crate::models::request::DataRequest;
use crate::routes::forbidden;

/// Create an unconfirmed binding for an invitee. The `user_id` stays null
/// until the invitee registers and confirms.
pub async fn invite(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<RepresentativeInviteRequest>,
) -> AppResult<(StatusCode, Json<Representative>)> {
    let role = Role::parse(&payload.role)
        .filter(Role::is_binding_role)
        .ok_or_else(|| AppError::bad_request("role must be coordinator or manager"))?;
    let kind = ResourceKind::parse(&payload.principal_kind)
        .ok_or_else(|| AppError::bad_request("unknown principal kind"))?;

    let principal = load_principal(&state, kind, payload.principal_id).await?;
    let allowed = state
        .engine
        .authorize(
            Some(&auth.user),
            Action::Create,
            AuthTarget::Create {
                kind: ResourceKind::Representative,
                parent: Some(principal.as_ref()),
            },
        )
        .await?;
    if !allowed {
        return Err(forbidden());
    }

    let representative = Representative {
        id: Uuid::new_v4(),
        email: payload.email,
        role,
        user_id: None,
        principal_kind: kind,
        principal_id: payload.principal_id,
        created: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO representatives (id, email, role, user_id, principal_kind, principal_id, created) \
         VALUES (?, ?, ?, NULL, ?, ?, ?)",
    )
    .bind(representative.id)
    .bind(&representative.email)
    .bind(representative.role.as_str())
    .bind(representative.principal_kind.as_str())
    .bind(representative.principal_id)
    .bind(representative.created)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(representative)))
}

/// Attach the registered caller to a pending invite.
pub async fn confirm(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Representative>> {
    let row = sqlx::query_as::<_, DbRepresentative>(
        "SELECT id, email, role, user_id, principal_kind, principal_id, created \
         FROM representatives WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("representative not found"))?;

    if row.user_id.is_some() {
        return Err(AppError::conflict("representative is already confirmed"));
    }

    // Uniqueness is (principal_kind, principal_id, user): one binding per
    // user per principal.
    let duplicate = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM representatives \
         WHERE principal_kind = ? AND principal_id = ? AND user_id = ?)",
    )
    .bind(&row.principal_kind)
    .bind(row.principal_id)
    .bind(auth.user.id)
    .fetch_one(&state.pool)
    .await?;
    if duplicate {
        return Err(AppError::conflict("user is already bound to this principal"));
    }

    sqlx::query("UPDATE representatives SET user_id = ? WHERE id = ?")
        .bind(auth.user.id)
        .bind(id)
        .execute(&state.pool)
        .await?;

    let row = sqlx::query_as::<_, DbRepresentative>(
        "SELECT id, email, role, user_id, principal_kind, principal_id, created \
         FROM representatives WHERE id = ?",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await?;
    Ok(Json(row.try_into()?))
}

async fn load_principal(
    state: &AppState,
    kind: ResourceKind,
    id: Uuid,
) -> AppResult<Box<dyn AclResource>> {
    match kind {
        ResourceKind::Organization => Ok(Box::new(state.tree.require(id).await?)),
        ResourceKind::Dataset => {
            let dataset = sqlx::query_as::<_, Dataset>(
                "SELECT id, title, organization_id, user_id, created FROM datasets WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| AppError::not_found("dataset not found"))?;
            Ok(Box::new(dataset))
        }
        ResourceKind::Request => {
            let request = sqlx::query_as::<_, DataRequest>(
                "SELECT id, title, organization_id, user_id, created FROM requests WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| AppError::not_found("request not found"))?;
            Ok(Box::new(request))
        }
        ResourceKind::Project => {
            let project = sqlx::query_as::<_, Project>(
                "SELECT id, title, user_id, created FROM projects WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| AppError::not_found("project not found"))?;
            Ok(Box::new(project))
        }
        _ => Err(AppError::bad_request("principal kind cannot hold bindings")),
    }
}
