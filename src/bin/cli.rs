use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use atvira::orgs::OrgTree;

#[derive(Parser, Debug)]
#[command(author, version, about = "atvira admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Load holiday dates (one ISO date per line) into the calendar
    ImportHolidays { file: String },
    /// Recompute all organization tree paths from parent links
    RebuildTree,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::ImportHolidays { file } => {
            let pool = get_pool().await?;
            let inserted = import_holidays(&pool, &file).await?;
            println!("Imported {} holidays", inserted);
        }
        Commands::RebuildTree => {
            let pool = get_pool().await?;
            let tree = OrgTree::new(pool);
            tree.rebuild().await?;
            println!("Organization tree rebuilt");
        }
    }

    Ok(())
}

async fn import_holidays(pool: &SqlitePool, file: &str) -> anyhow::Result<u64> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("failed to read holiday file {}", file))?;

    let mut inserted = 0;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let date = line
            .parse::<NaiveDate>()
            .with_context(|| format!("invalid date in holiday file: {}", line))?;

        let result = sqlx::query("INSERT OR IGNORE INTO holidays (date) VALUES (?)")
            .bind(date)
            .execute(pool)
            .await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    sqlx::migrate::Migrator::new(dir)
        .await
        .context("failed to load migrations")
}
