mod common;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

use atvira::auth::JwtConfig;
use atvira::config::Settings;
use atvira::create_app;

use common::{insert_task, insert_user, noon, setup_pool};

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Result<(StatusCode, serde_json::Value)> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body)?).await?;
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

fn id_of(value: &serde_json::Value) -> Result<Uuid> {
    let raw = value
        .get("id")
        .and_then(|v| v.as_str())
        .context("missing id in response")?;
    Ok(raw.parse()?)
}

#[tokio::test]
async fn invite_confirm_and_update_flow() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    std::env::set_var("JWT_SECRET", "test-secret");

    let app = create_app(pool.clone(), &Settings::default()).await?;
    let jwt = JwtConfig::from_env()?;

    let staff = insert_user(&pool, "admin@example.com", true).await?;
    let invitee = insert_user(&pool, "coordinator@example.com", false).await?;
    let outsider = insert_user(&pool, "outsider@example.com", false).await?;
    let staff_token = jwt.encode(staff.id)?;
    let invitee_token = jwt.encode(invitee.id)?;
    let outsider_token = jwt.encode(outsider.id)?;

    // Unauthenticated requests bounce.
    let (status, _) = send(&app, "GET", "/tasks", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Only staff manage the tree.
    let (status, _) = send(
        &app,
        "POST",
        "/organizations",
        Some(&outsider_token),
        Some(json!({ "title": "Rogue" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, ministry) = send(
        &app,
        "POST",
        "/organizations",
        Some(&staff_token),
        Some(json!({ "title": "Ministry" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let ministry_id = id_of(&ministry)?;

    let (status, agency) = send(
        &app,
        "POST",
        &format!("/organizations/{}/children", ministry_id),
        Some(&staff_token),
        Some(json!({ "title": "Agency" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let agency_id = id_of(&agency)?;
    assert_eq!(agency["path"], "00010001");

    // Staff invite a coordinator for the agency.
    let (status, invite) = send(
        &app,
        "POST",
        "/representatives",
        Some(&staff_token),
        Some(json!({
            "email": "coordinator@example.com",
            "role": "coordinator",
            "principal_kind": "organization",
            "principal_id": agency_id,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let invite_id = id_of(&invite)?;
    assert!(invite["user_id"].is_null());

    // The invitee confirms and the binding becomes active.
    let (status, confirmed) = send(
        &app,
        "POST",
        &format!("/representatives/{}/confirm", invite_id),
        Some(&invitee_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["user_id"], json!(invitee.id));

    // Confirming twice conflicts.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/representatives/{}/confirm", invite_id),
        Some(&invitee_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // The coordinator can now rename their organization; outsiders cannot.
    let (status, renamed) = send(
        &app,
        "PUT",
        &format!("/organizations/{}", agency_id),
        Some(&invitee_token),
        Some(json!({ "title": "Data Agency" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"], "Data Agency");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/organizations/{}", agency_id),
        Some(&outsider_token),
        Some(json!({ "title": "Hijacked" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // But not the parent ministry.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/organizations/{}", ministry_id),
        Some(&invitee_token),
        Some(json!({ "title": "My Ministry" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The coordinator's inbox picks up a task addressed to the agency.
    insert_task(&pool, "agency task", None, Some(agency_id), None, noon(2022, 11, 18)).await?;
    let (status, tasks) = send(&app, "GET", "/tasks?now=2022-11-18", Some(&invitee_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
    assert_eq!(tasks[0]["title"], "agency task");

    Ok(())
}

#[tokio::test]
async fn dataset_crud_respects_bindings() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    std::env::set_var("JWT_SECRET", "test-secret");

    let app = create_app(pool.clone(), &Settings::default()).await?;
    let jwt = JwtConfig::from_env()?;

    let staff = insert_user(&pool, "admin@example.com", true).await?;
    let manager = insert_user(&pool, "manager@example.com", false).await?;
    let staff_token = jwt.encode(staff.id)?;
    let manager_token = jwt.encode(manager.id)?;

    let (_, ministry) = send(
        &app,
        "POST",
        "/organizations",
        Some(&staff_token),
        Some(json!({ "title": "Ministry" })),
    )
    .await?;
    let ministry_id = id_of(&ministry)?;

    // Without a binding the manager cannot create datasets under the org.
    let (status, _) = send(
        &app,
        "POST",
        "/datasets",
        Some(&manager_token),
        Some(json!({ "title": "Budget", "organization_id": ministry_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Staff create one and bind the manager to it.
    let (status, dataset) = send(
        &app,
        "POST",
        "/datasets",
        Some(&staff_token),
        Some(json!({ "title": "Budget", "organization_id": ministry_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let dataset_id = id_of(&dataset)?;

    common::bind(&pool, manager.id, "manager", "dataset", dataset_id).await?;

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/datasets/{}", dataset_id),
        Some(&manager_token),
        Some(json!({ "title": "Budget 2023" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Budget 2023");

    // Sub-resources follow the same dataset-level bindings.
    let (status, distribution) = send(
        &app,
        "POST",
        &format!("/datasets/{}/distributions", dataset_id),
        Some(&manager_token),
        Some(json!({ "title": "CSV export" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(distribution["title"], "CSV export");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/datasets/{}", dataset_id),
        Some(&manager_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    Ok(())
}
