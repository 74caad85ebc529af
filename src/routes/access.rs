//! Access API routes
//!
//! Answers access questions about the calling person. Unknown capability,
//! feature or entity names answer with the deny value rather than an error.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{AccessLevel, RoleUiConfig};
use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthPerson;
use crate::models::role::{CheckContext, RoleWithContext};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolesResponse {
    pub person_id: Uuid,
    pub roles: Vec<String>,
    pub contexts: Vec<RoleWithContext>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CapabilityCheckRequest {
    pub capability: String,
    #[serde(default)]
    pub group_id: Option<Uuid>,
    /// Target person, e.g. the child for VIEW_CHILD_DEVELOPMENT
    #[serde(default)]
    pub person_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CapabilityCheckResponse {
    pub capability: String,
    pub allowed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessLevelResponse {
    pub entity: String,
    pub level: AccessLevel,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConditionsResponse {
    pub table: String,
    pub condition: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeatureResponse {
    pub feature: String,
    pub available: bool,
}

#[utoipa::path(
    get,
    path = "/access/me/roles",
    tag = "Access",
    responses(
        (status = 200, description = "Primary and secondary roles of the caller", body = RolesResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_roles(State(state): State<AppState>, auth: AuthPerson) -> AppResult<Json<RolesResponse>> {
    let roles = state.access.all_roles(auth.person_id).await;
    let contexts = state.access.roles_with_context(auth.person_id).await;

    Ok(Json(RolesResponse {
        person_id: auth.person_id,
        roles: roles.into_iter().collect(),
        contexts,
    }))
}

#[utoipa::path(
    get,
    path = "/access/me/ui-config",
    tag = "Access",
    responses(
        (status = 200, description = "Dashboard sections visible to the caller", body = RoleUiConfig),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_ui_config(State(state): State<AppState>, auth: AuthPerson) -> AppResult<Json<RoleUiConfig>> {
    Ok(Json(state.access.role_ui_config(auth.person_id).await))
}

#[utoipa::path(
    post,
    path = "/access/me/capabilities/check",
    tag = "Access",
    request_body = CapabilityCheckRequest,
    responses(
        (status = 200, description = "Whether the caller holds the capability", body = CapabilityCheckResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn check_capability(
    State(state): State<AppState>,
    auth: AuthPerson,
    Json(payload): Json<CapabilityCheckRequest>,
) -> AppResult<Json<CapabilityCheckResponse>> {
    let ctx = CheckContext {
        group_id: payload.group_id,
        person_id: payload.person_id,
    };
    let allowed = state
        .access
        .has_capability_named(auth.person_id, &payload.capability, &ctx)
        .await;

    Ok(Json(CapabilityCheckResponse {
        capability: payload.capability,
        allowed,
    }))
}

#[utoipa::path(
    get,
    path = "/access/me/access-level/{entity}",
    tag = "Access",
    params(("entity" = String, Path, description = "player, team, observation or plan")),
    responses(
        (status = 200, description = "Widest scope the caller may read", body = AccessLevelResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_access_level(
    State(state): State<AppState>,
    auth: AuthPerson,
    Path(entity): Path<String>,
) -> AppResult<Json<AccessLevelResponse>> {
    let level = state.access.data_access_level_named(auth.person_id, &entity).await;
    Ok(Json(AccessLevelResponse { entity, level }))
}

#[utoipa::path(
    get,
    path = "/access/me/conditions/{table}",
    tag = "Access",
    params(("table" = String, Path, description = "Table the predicate will filter")),
    responses(
        (status = 200, description = "SQL predicate limiting rows to the caller's scope", body = ConditionsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_conditions(
    State(state): State<AppState>,
    auth: AuthPerson,
    Path(table): Path<String>,
) -> AppResult<Json<ConditionsResponse>> {
    let condition = state.access.data_access_conditions(auth.person_id, &table).await;
    Ok(Json(ConditionsResponse { table, condition }))
}

#[utoipa::path(
    get,
    path = "/access/me/features/{feature}",
    tag = "Access",
    params(("feature" = String, Path, description = "Feature name, e.g. aiEnabled")),
    responses(
        (status = 200, description = "Whether the feature is usable by the caller", body = FeatureResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_feature(
    State(state): State<AppState>,
    auth: AuthPerson,
    Path(feature): Path<String>,
) -> AppResult<Json<FeatureResponse>> {
    let available = state.access.is_feature_available_named(auth.person_id, &feature).await;
    Ok(Json(FeatureResponse { feature, available }))
}
