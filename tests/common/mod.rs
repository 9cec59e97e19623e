#![allow(dead_code)]

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use atvira::models::user::User;

/// File-backed database in a tempdir with all migrations applied. The
/// `TempDir` must stay alive for the duration of the test.
pub async fn setup_pool() -> Result<(TempDir, SqlitePool)> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    Ok((dir, pool))
}

pub async fn insert_user(pool: &SqlitePool, email: &str, is_staff: bool) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: None,
        last_name: None,
        is_staff,
        is_superuser: false,
        organization_id: None,
        created: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, email, first_name, last_name, is_staff, is_superuser, organization_id, created) \
         VALUES (?, ?, NULL, NULL, ?, 0, NULL, ?)",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(user.is_staff)
    .bind(user.created)
    .execute(pool)
    .await?;

    Ok(user)
}

/// Confirmed role binding between a user and a principal.
pub async fn bind(
    pool: &SqlitePool,
    user_id: Uuid,
    role: &str,
    principal_kind: &str,
    principal_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO representatives (id, email, role, user_id, principal_kind, principal_id, created) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(format!("{}@example.com", user_id))
    .bind(role)
    .bind(user_id)
    .bind(principal_kind)
    .bind(principal_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_task(
    pool: &SqlitePool,
    title: &str,
    user_id: Option<Uuid>,
    organization_id: Option<Uuid>,
    role: Option<&str>,
    created: DateTime<Utc>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO tasks (id, title, created, user_id, organization_id, role, status, task_type) \
         VALUES (?, ?, ?, ?, ?, ?, 'created', 'comment')",
    )
    .bind(id)
    .bind(title)
    .bind(created)
    .bind(user_id)
    .bind(organization_id)
    .bind(role)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn insert_holiday(pool: &SqlitePool, date: NaiveDate) -> Result<()> {
    sqlx::query("INSERT INTO holidays (date) VALUES (?)")
        .bind(date)
        .execute(pool)
        .await?;
    Ok(())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Midday timestamp, so date comparisons are unambiguous across time zones.
pub fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(12, 0, 0).unwrap().and_utc()
}
