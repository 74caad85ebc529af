use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::person::PersonType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Team,
    Organization,
    System,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Team => "team",
            ScopeType::Organization => "organization",
            ScopeType::System => "system",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "team" | "group" => Ok(ScopeType::Team),
            "organization" | "org" => Ok(ScopeType::Organization),
            "system" => Ok(ScopeType::System),
            other => Err(AppError::bad_request(format!("unknown scope type: {other}"))),
        }
    }
}

/// Which table a secondary role was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleSource {
    /// Cross-domain `user_roles` table.
    Generic,
    /// Basketball-specific `person_roles` table.
    Domain,
}

impl RoleSource {
    pub const ALL: [RoleSource; 2] = [RoleSource::Generic, RoleSource::Domain];

    pub fn table(&self) -> &'static str {
        match self {
            RoleSource::Generic => "user_roles",
            RoleSource::Domain => "person_roles",
        }
    }
}

/// Secondary role record. Additive on top of the primary `PersonType`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleAssignment {
    pub person_id: Uuid,
    pub role: String,
    pub organization_id: Option<Uuid>,
    pub scope_type: ScopeType,
    pub scope_ids: Vec<Uuid>,
    pub active: bool,
    pub source: RoleSource,
}

impl RoleAssignment {
    /// The assignment's role as a known person type; `None` for roles the
    /// capability table has no rules for.
    pub fn person_type(&self) -> Option<PersonType> {
        self.role.parse().ok()
    }
}

/// Scope attached to a role: the organization and, for team roles, the team.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RoleContext {
    pub person_id: Uuid,
    pub organization_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    pub context_type: ScopeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RoleWithContext {
    pub role: String,
    pub context: RoleContext,
}

/// Optional context passed alongside a capability check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckContext {
    /// Team the action targets.
    #[serde(default)]
    pub group_id: Option<Uuid>,
    /// Other person the action targets (e.g. a parent's child).
    #[serde(default)]
    pub person_id: Option<Uuid>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group_id: Uuid) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_person(mut self, person_id: Uuid) -> Self {
        self.person_id = Some(person_id);
        self
    }
}
