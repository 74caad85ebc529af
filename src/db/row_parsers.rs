use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pack::{PackConfig, PromptTemplate};
use crate::models::person::DbPerson;
use crate::models::role::{RoleAssignment, RoleSource, ScopeType};

pub fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}

fn parse_json(s: &str, column: &str) -> Result<Value, AppError> {
    if s.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(s).map_err(|e| AppError::internal(format!("invalid json in {}: {}", column, e)))
}

/// `scope_ids` is a JSON array of uuid strings. Entries that are not uuids
/// are dropped rather than failing the whole assignment.
fn parse_scope_ids(s: &str) -> Result<Vec<Uuid>, AppError> {
    let value = parse_json(s, "scope_ids")?;
    let ids = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect(),
        Value::Null => Vec::new(),
        other => return Err(AppError::internal(format!("scope_ids must be an array, got {}", other))),
    };
    Ok(ids)
}

pub fn db_person_from_row(row: &SqliteRow) -> Result<DbPerson, AppError> {
    let id_s: String = row.try_get("id").map_err(|e| AppError::internal(format!("missing id: {}", e)))?;
    let organization_id_s: String = row.try_get("organization_id").map_err(|e| AppError::internal(format!("missing organization_id: {}", e)))?;
    let person_type: String = row.try_get("person_type").map_err(|e| AppError::internal(format!("missing person_type: {}", e)))?;
    let display_name: String = row.try_get("display_name").map_err(|e| AppError::internal(format!("missing display_name: {}", e)))?;
    let is_admin: bool = row.try_get("is_admin").map_err(|e| AppError::internal(format!("missing is_admin: {}", e)))?;
    let is_superadmin: bool = row.try_get("is_superadmin").map_err(|e| AppError::internal(format!("missing is_superadmin: {}", e)))?;

    let id = parse_uuid(&id_s)?;
    let organization_id = parse_uuid(&organization_id_s)?;

    Ok(DbPerson { id, person_type, organization_id, is_admin, is_superadmin, display_name })
}

pub fn role_assignment_from_row(row: &SqliteRow, source: RoleSource) -> Result<RoleAssignment, AppError> {
    let person_id_s: String = row.try_get("person_id").map_err(|e| AppError::internal(format!("missing person_id: {}", e)))?;
    let role: String = row.try_get("role").map_err(|e| AppError::internal(format!("missing role: {}", e)))?;
    let organization_id_s: Option<String> = row.try_get("organization_id").map_err(|e| AppError::internal(format!("missing organization_id: {}", e)))?;
    let scope_type_s: String = row.try_get("scope_type").map_err(|e| AppError::internal(format!("missing scope_type: {}", e)))?;
    let scope_ids_s: String = row.try_get("scope_ids").map_err(|e| AppError::internal(format!("missing scope_ids: {}", e)))?;
    let active: bool = row.try_get("active").map_err(|e| AppError::internal(format!("missing active: {}", e)))?;

    let person_id = parse_uuid(&person_id_s)?;
    let organization_id = match organization_id_s { Some(s) => Some(parse_uuid(&s)?), None => None };
    let scope_type = scope_type_s
        .parse::<ScopeType>()
        .map_err(|_| AppError::internal(format!("invalid scope_type: {}", scope_type_s)))?;
    let scope_ids = parse_scope_ids(&scope_ids_s)?;

    Ok(RoleAssignment { person_id, role: role.to_ascii_lowercase(), organization_id, scope_type, scope_ids, active, source })
}

pub fn pack_config_from_row(row: &SqliteRow) -> Result<PackConfig, AppError> {
    let id_s: String = row.try_get("id").map_err(|e| AppError::internal(format!("missing id: {}", e)))?;
    let version: String = row.try_get("version").map_err(|e| AppError::internal(format!("missing version: {}", e)))?;
    let schema_version: String = row.try_get("schema_version").map_err(|e| AppError::internal(format!("missing schema_version: {}", e)))?;
    let prompt_library_s: String = row.try_get("prompt_library").map_err(|e| AppError::internal(format!("missing prompt_library: {}", e)))?;
    let constraint_definitions_s: String = row.try_get("constraint_definitions").map_err(|e| AppError::internal(format!("missing constraint_definitions: {}", e)))?;
    let ai_model_config_s: String = row.try_get("ai_model_config").map_err(|e| AppError::internal(format!("missing ai_model_config: {}", e)))?;
    let active: bool = row.try_get("active").map_err(|e| AppError::internal(format!("missing active: {}", e)))?;

    let id = parse_uuid(&id_s)?;
    let prompt_library = parse_json(&prompt_library_s, "prompt_library")?;
    let constraint_definitions = parse_json(&constraint_definitions_s, "constraint_definitions")?;
    let ai_model_config = parse_json(&ai_model_config_s, "ai_model_config")?;

    Ok(PackConfig { id, version, schema_version, prompt_library, constraint_definitions, ai_model_config, active })
}

pub fn prompt_template_from_row(row: &SqliteRow) -> Result<PromptTemplate, AppError> {
    let use_case: String = row.try_get("use_case").map_err(|e| AppError::internal(format!("missing use_case: {}", e)))?;
    let version: String = row.try_get("version").map_err(|e| AppError::internal(format!("missing version: {}", e)))?;
    let system_instructions: String = row.try_get("system_instructions").map_err(|e| AppError::internal(format!("missing system_instructions: {}", e)))?;

    Ok(PromptTemplate { use_case, version, system_instructions })
}
