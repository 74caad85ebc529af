//! Access module - role capabilities, data scopes and pack entitlements
//!
//! This module answers "what is this person allowed to do, see and use":
//! - Capability checks with superadmin and org-admin precedence
//! - Team and parent-child contextual verification
//! - Data access levels and the SQL predicates that enforce them
//! - Organization feature packs and the role-feature gate
//!
//! Every lookup failure resolves to the most restrictive answer.

pub mod capability;
pub mod conditions;
pub mod directory;
pub mod features;
pub mod memory;
pub mod packs;
pub mod resolver;
pub mod roles;
pub mod service;
pub mod ui;

pub use capability::{Capability, Grant};
pub use directory::{AccessDirectory, SqliteDirectory};
pub use features::Feature;
pub use memory::MemoryDirectory;
pub use service::AccessService;
pub use ui::RoleUiConfig;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::person::Person;

/// Scope of records a person may see, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    None,
    Own,
    Team,
    Organization,
    All,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::None => "none",
            AccessLevel::Own => "own",
            AccessLevel::Team => "team",
            AccessLevel::Organization => "organization",
            AccessLevel::All => "all",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Player,
    Team,
    Observation,
    Plan,
}

impl FromStr for EntityType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" | "players" | "person" | "persons" => Ok(EntityType::Player),
            "team" | "teams" | "group" | "groups" => Ok(EntityType::Team),
            "observation" | "observations" => Ok(EntityType::Observation),
            "plan" | "plans" | "pdp" => Ok(EntityType::Plan),
            other => Err(AppError::bad_request(format!("unknown entity type: {other}"))),
        }
    }
}

/// How HTTP routes react to a failed scope check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Log denials but allow requests
    Advisory,
    /// Enforce 403 on denied requests
    Strict,
}

impl AccessMode {
    pub fn from_env() -> Self {
        match std::env::var("ACCESS_MODE").unwrap_or_default().to_lowercase().as_str() {
            "advisory" => AccessMode::Advisory,
            _ => AccessMode::Strict,
        }
    }
}

/// Person lookup where "not found" and "store failed" both mean no person.
pub(crate) async fn resolve_person(directory: &dyn AccessDirectory, person_id: Uuid) -> Option<Person> {
    match directory.person_by_id(person_id).await {
        Ok(Some(person)) => Some(person),
        Ok(None) => {
            tracing::debug!(person_id = %person_id, "unknown person, denying");
            None
        }
        Err(e) => {
            tracing::warn!(person_id = %person_id, error = %e, "person lookup failed, denying");
            None
        }
    }
}
