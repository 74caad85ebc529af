use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::access::{AccessMode, AccessService, SqliteDirectory};
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{access, health, organizations};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub access: AccessService,
    pub mode: AccessMode,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, mode: AccessMode) -> Self {
        let access = AccessService::new(Arc::new(SqliteDirectory::new(pool.clone())));
        Self {
            pool,
            jwt: Arc::new(jwt),
            access,
            mode,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let mode = AccessMode::from_env();
    tracing::info!(?mode, "access enforcement mode");

    Ok(router(AppState::new(pool, jwt_config, mode)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let access_routes = Router::new()
        .route("/me/roles", get(access::my_roles))
        .route("/me/ui-config", get(access::my_ui_config))
        .route("/me/capabilities/check", post(access::check_capability))
        .route("/me/access-level/:entity", get(access::my_access_level))
        .route("/me/conditions/:table", get(access::my_conditions))
        .route("/me/features/:feature", get(access::my_feature));

    let organization_routes = Router::new()
        .route("/:org_id/pack", get(organizations::pack_behavior))
        .route("/:org_id/features", get(organizations::pack_features));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/access", access_routes)
        .nest("/organizations", organization_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
