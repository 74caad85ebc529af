use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use courtside::access::{AccessService, SqliteDirectory};
use courtside::jwt::JwtConfig;
use courtside::models::role::CheckContext;

#[derive(Parser, Debug)]
#[command(author, version, about = "courtside access tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Mint a bearer token for a person
    IssueToken { person_id: Uuid },
    /// Check whether a person holds a capability
    Check {
        person_id: Uuid,
        capability: String,
        /// Team the action targets
        #[arg(long)]
        group: Option<Uuid>,
        /// Child the action targets
        #[arg(long)]
        child: Option<Uuid>,
    },
    /// Print the pack features of an organization
    Features { organization_id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
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
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::IssueToken { person_id } => {
            let jwt = JwtConfig::from_env()?;
            println!("{}", jwt.encode(person_id)?);
        }
        Commands::Check {
            person_id,
            capability,
            group,
            child,
        } => {
            let service = get_service().await?;
            let ctx = CheckContext {
                group_id: group,
                person_id: child,
            };
            let allowed = service.has_capability_named(person_id, &capability, &ctx).await;
            println!("{} {}", capability, if allowed { "allowed" } else { "denied" });
        }
        Commands::Features { organization_id } => {
            let service = get_service().await?;
            let features = service.pack_features(organization_id).await;
            println!("{}", serde_json::to_string_pretty(&features)?);
        }
    }

    Ok(())
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

async fn get_service() -> anyhow::Result<AccessService> {
    let pool = get_pool().await?;
    Ok(AccessService::new(Arc::new(SqliteDirectory::new(pool))))
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    let table = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}
