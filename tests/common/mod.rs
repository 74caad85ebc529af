#![allow(dead_code)]

use std::path::Path;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";

/// Fresh SQLite database in `dir` with all migrations applied.
pub async fn setup_pool(dir: &TempDir) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    Ok(pool)
}

pub async fn insert_org(pool: &SqlitePool, overlay: Option<&str>) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO organizations (id, name, overlay_version) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind("Riverside Hoops")
        .bind(overlay)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_person(pool: &SqlitePool, org: Uuid, person_type: &str) -> anyhow::Result<Uuid> {
    insert_person_with_flags(pool, org, person_type, false, false).await
}

pub async fn insert_person_with_flags(
    pool: &SqlitePool,
    org: Uuid,
    person_type: &str,
    is_admin: bool,
    is_superadmin: bool,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO persons (id, organization_id, person_type, display_name, is_admin, is_superadmin) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(org.to_string())
    .bind(person_type)
    .bind(format!("{} {}", person_type, &id.to_string()[..8]))
    .bind(is_admin)
    .bind(is_superadmin)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn insert_group(pool: &SqlitePool, org: Uuid) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO groups (id, organization_id, name) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(org.to_string())
        .bind("U14 Boys")
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn add_membership(pool: &SqlitePool, person: Uuid, group: Uuid, role: &str) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO group_memberships (person_id, group_id, role, active) VALUES (?, ?, ?, 1)")
        .bind(person.to_string())
        .bind(group.to_string())
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn link_parent(pool: &SqlitePool, parent: Uuid, child: Uuid, verified: bool) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO parent_links (parent_id, child_id, verified) VALUES (?, ?, ?)")
        .bind(parent.to_string())
        .bind(child.to_string())
        .bind(verified)
        .execute(pool)
        .await?;
    Ok(())
}

/// Secondary role row in `table` (`user_roles` or `person_roles`).
pub async fn add_role(
    pool: &SqlitePool,
    table: &str,
    person: Uuid,
    role: &str,
    org: Uuid,
    scope_type: &str,
    scope_ids: &[Uuid],
) -> anyhow::Result<()> {
    let scope_ids = serde_json::to_string(&scope_ids.iter().map(Uuid::to_string).collect::<Vec<_>>())?;
    let sql = format!(
        "INSERT INTO {} (id, person_id, role, organization_id, scope_type, scope_ids, active) VALUES (?, ?, ?, ?, ?, ?, 1)",
        table
    );
    sqlx::query(&sql)
        .bind(Uuid::new_v4().to_string())
        .bind(person.to_string())
        .bind(role)
        .bind(org.to_string())
        .bind(scope_type)
        .bind(scope_ids)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_pack(pool: &SqlitePool, version: &str, ai_enabled: bool, active: bool) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO pack_configs (id, version, schema_version, prompt_library, constraint_definitions, ai_model_config, active) VALUES (?, ?, '1', '{}', ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(version)
    .bind(r#"{"uiOverrides":{"accent":"navy"}}"#)
    .bind(serde_json::json!({ "enabled": ai_enabled, "model": "coach-assist" }).to_string())
    .bind(active)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn add_prompt_template(pool: &SqlitePool, use_case: &str, version: &str, instructions: &str) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO prompt_templates (id, use_case, version, system_instructions, active) VALUES (?, ?, ?, ?, 1)")
        .bind(Uuid::new_v4().to_string())
        .bind(use_case)
        .bind(version)
        .bind(instructions)
        .execute(pool)
        .await?;
    Ok(())
}
