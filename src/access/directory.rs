use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::AppResult;
use crate::models::pack::{PackConfig, PromptTemplate};
use crate::models::person::{Person, PersonType};
use crate::models::role::{RoleAssignment, RoleSource};

/// Read-only data layer the access engine consults.
///
/// Implementations report store failures as errors; the engine is responsible
/// for turning them into the most restrictive answer.
#[async_trait]
pub trait AccessDirectory: Send + Sync {
    async fn person_by_id(&self, person_id: Uuid) -> AppResult<Option<Person>>;

    /// Active secondary role assignments from one role table.
    async fn role_assignments(&self, person_id: Uuid, source: RoleSource) -> AppResult<Vec<RoleAssignment>>;

    /// Whether the person holds an active membership on the team with `role`.
    async fn has_team_membership(&self, person_id: Uuid, team_id: Uuid, role: PersonType) -> AppResult<bool>;

    /// Teams on which the person holds an active membership with `role`.
    async fn team_ids(&self, person_id: Uuid, role: PersonType) -> AppResult<Vec<Uuid>>;

    /// Whether a verified parent link exists from `parent_id` to `child_id`.
    async fn is_parent_of(&self, parent_id: Uuid, child_id: Uuid) -> AppResult<bool>;

    async fn organization_overlay_version(&self, organization_id: Uuid) -> AppResult<Option<String>>;

    /// Active pack configuration for an overlay version.
    async fn pack_config_by_version(&self, version: &str) -> AppResult<Option<PackConfig>>;

    async fn prompt_template(&self, use_case: &str, version: &str) -> AppResult<Option<PromptTemplate>>;
}

/// Directory backed by the application's SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteDirectory {
    pool: SqlitePool,
}

impl SqliteDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessDirectory for SqliteDirectory {
    async fn person_by_id(&self, person_id: Uuid) -> AppResult<Option<Person>> {
        let row = sqlx::query(
            "SELECT id, organization_id, person_type, display_name, is_admin, is_superadmin FROM persons WHERE id = ?",
        )
        .bind(person_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_parsers::db_person_from_row(&row)?.try_into()?)),
            None => Ok(None),
        }
    }

    async fn role_assignments(&self, person_id: Uuid, source: RoleSource) -> AppResult<Vec<RoleAssignment>> {
        let sql = format!(
            "SELECT person_id, role, organization_id, scope_type, scope_ids, active FROM {} WHERE person_id = ? AND active = 1 ORDER BY created_at",
            source.table()
        );

        let rows = sqlx::query(&sql)
            .bind(person_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row_parsers::role_assignment_from_row(row, source))
            .collect()
    }

    async fn has_team_membership(&self, person_id: Uuid, team_id: Uuid, role: PersonType) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM group_memberships WHERE person_id = ? AND group_id = ? AND role = ? AND active = 1 LIMIT 1",
        )
        .bind(person_id.to_string())
        .bind(team_id.to_string())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn team_ids(&self, person_id: Uuid, role: PersonType) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT group_id FROM group_memberships WHERE person_id = ? AND role = ? AND active = 1 ORDER BY group_id",
        )
        .bind(person_id.to_string())
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        ids.iter().map(|s| row_parsers::parse_uuid(s)).collect()
    }

    async fn is_parent_of(&self, parent_id: Uuid, child_id: Uuid) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM parent_links WHERE parent_id = ? AND child_id = ? AND verified = 1 LIMIT 1",
        )
        .bind(parent_id.to_string())
        .bind(child_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn organization_overlay_version(&self, organization_id: Uuid) -> AppResult<Option<String>> {
        let version: Option<Option<String>> =
            sqlx::query_scalar("SELECT overlay_version FROM organizations WHERE id = ?")
                .bind(organization_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        Ok(version.flatten())
    }

    async fn pack_config_by_version(&self, version: &str) -> AppResult<Option<PackConfig>> {
        let row = sqlx::query(
            "SELECT id, version, schema_version, prompt_library, constraint_definitions, ai_model_config, active FROM pack_configs WHERE version = ? AND active = 1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_parsers::pack_config_from_row).transpose()
    }

    async fn prompt_template(&self, use_case: &str, version: &str) -> AppResult<Option<PromptTemplate>> {
        let row = sqlx::query(
            "SELECT use_case, version, system_instructions FROM prompt_templates WHERE use_case = ? AND version = ? AND active = 1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(use_case)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_parsers::prompt_template_from_row).transpose()
    }
}
