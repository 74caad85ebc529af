use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::access::AccessMode;
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthPerson;
use crate::models::pack::{PackBehavior, PackFeatures};

/// Caller must belong to the organization or be a superadmin. In advisory
/// mode a failed check is logged and the request goes through.
async fn ensure_member(state: &AppState, auth: &AuthPerson, org_id: Uuid) -> AppResult<()> {
    let allowed = match state.access.person(auth.person_id).await {
        Some(person) => person.is_super_admin() || person.organization_id == org_id,
        None => false,
    };

    if allowed {
        return Ok(());
    }

    match state.mode {
        AccessMode::Advisory => {
            tracing::warn!(
                person_id = %auth.person_id,
                organization_id = %org_id,
                "organization access denied (advisory mode, allowing)"
            );
            Ok(())
        }
        AccessMode::Strict => {
            tracing::debug!(person_id = %auth.person_id, organization_id = %org_id, "organization access denied");
            Err(AppError::forbidden("not a member of this organization"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/organizations/{org_id}/pack",
    tag = "Organizations",
    params(("org_id" = Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Pack tier of the organization", body = PackBehavior),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a member of the organization")
    ),
    security(("bearerAuth" = []))
)]
pub async fn pack_behavior(
    State(state): State<AppState>,
    auth: AuthPerson,
    Path(org_id): Path<Uuid>,
) -> AppResult<Json<PackBehavior>> {
    ensure_member(&state, &auth, org_id).await?;
    Ok(Json(state.access.pack_behavior(org_id).await))
}

#[utoipa::path(
    get,
    path = "/organizations/{org_id}/features",
    tag = "Organizations",
    params(("org_id" = Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Feature flags of the organization", body = PackFeatures),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a member of the organization")
    ),
    security(("bearerAuth" = []))
)]
pub async fn pack_features(
    State(state): State<AppState>,
    auth: AuthPerson,
    Path(org_id): Path<Uuid>,
) -> AppResult<Json<PackFeatures>> {
    ensure_member(&state, &auth, org_id).await?;
    Ok(Json(state.access.pack_features(org_id).await))
}
