//! Capabilities and the per-role rule table.
//!
//! The table is the synchronous first phase of a capability check: it says
//! whether a role can do something *at all*, and what contextual proof is
//! still needed. Every capability matches on every role with no wildcard, so
//! adding a variant to either enum forces a decision here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::person::PersonType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    // Player
    ViewOwnPlans,
    ViewOwnObservations,
    ViewOwnProgress,

    // Coach
    ViewPlayers,
    AddPlayers,
    EditPlayers,
    CreatePlan,
    AddObservation,
    ManagePractice,

    // Organization
    ManageCoaches,
    ManageTeams,
    ViewOrganizationData,
    ManagePhilosophyPack,

    // System
    ManageOrganizations,
    ManageSubscription,

    // Parent
    ViewChildDevelopment,

    // Observer
    ViewAssignedTeams,
}

/// Outcome of the pure rule table for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Deny,
    Allow,
    /// Allowed; when the check names a team, the person must hold an active
    /// membership on it with this role.
    TeamMember(PersonType),
    /// Allowed only for a child the person has a verified link to.
    LinkedChild,
}

impl Grant {
    pub fn is_possible(&self) -> bool {
        !matches!(self, Grant::Deny)
    }
}

impl Capability {
    pub const ALL: [Capability; 17] = [
        Capability::ViewOwnPlans,
        Capability::ViewOwnObservations,
        Capability::ViewOwnProgress,
        Capability::ViewPlayers,
        Capability::AddPlayers,
        Capability::EditPlayers,
        Capability::CreatePlan,
        Capability::AddObservation,
        Capability::ManagePractice,
        Capability::ManageCoaches,
        Capability::ManageTeams,
        Capability::ViewOrganizationData,
        Capability::ManagePhilosophyPack,
        Capability::ManageOrganizations,
        Capability::ManageSubscription,
        Capability::ViewChildDevelopment,
        Capability::ViewAssignedTeams,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewOwnPlans => "VIEW_OWN_PLANS",
            Capability::ViewOwnObservations => "VIEW_OWN_OBSERVATIONS",
            Capability::ViewOwnProgress => "VIEW_OWN_PROGRESS",
            Capability::ViewPlayers => "VIEW_PLAYERS",
            Capability::AddPlayers => "ADD_PLAYERS",
            Capability::EditPlayers => "EDIT_PLAYERS",
            Capability::CreatePlan => "CREATE_PLAN",
            Capability::AddObservation => "ADD_OBSERVATION",
            Capability::ManagePractice => "MANAGE_PRACTICE",
            Capability::ManageCoaches => "MANAGE_COACHES",
            Capability::ManageTeams => "MANAGE_TEAMS",
            Capability::ViewOrganizationData => "VIEW_ORGANIZATION_DATA",
            Capability::ManagePhilosophyPack => "MANAGE_PHILOSOPHY_PACK",
            Capability::ManageOrganizations => "MANAGE_ORGANIZATIONS",
            Capability::ManageSubscription => "MANAGE_SUBSCRIPTION",
            Capability::ViewChildDevelopment => "VIEW_CHILD_DEVELOPMENT",
            Capability::ViewAssignedTeams => "VIEW_ASSIGNED_TEAMS",
        }
    }

    /// Capabilities any organization admin holds.
    pub fn is_organization_level(&self) -> bool {
        matches!(
            self,
            Capability::ManageCoaches
                | Capability::ManageTeams
                | Capability::ViewOrganizationData
                | Capability::ManagePhilosophyPack
        )
    }

    /// Capabilities that depend on the organization's pack entitlement.
    pub fn requires_entitlement(&self) -> bool {
        matches!(self, Capability::ManagePhilosophyPack)
    }

    /// Pure rule table for a non-admin role.
    ///
    /// Admin and superadmin rows are `Deny`: their grants come from the admin
    /// flags, which the resolver checks before consulting this table.
    pub fn grant_for(&self, role: PersonType) -> Grant {
        use PersonType::*;

        match self {
            Capability::ViewOwnPlans | Capability::ViewOwnObservations | Capability::ViewOwnProgress => match role {
                Player => Grant::Allow,
                Coach | Admin | Superadmin | Parent | Observer => Grant::Deny,
            },
            Capability::ViewPlayers
            | Capability::AddPlayers
            | Capability::EditPlayers
            | Capability::CreatePlan
            | Capability::AddObservation
            | Capability::ManagePractice => match role {
                Coach => Grant::TeamMember(Coach),
                Player | Admin | Superadmin | Parent | Observer => Grant::Deny,
            },
            Capability::ManageCoaches
            | Capability::ManageTeams
            | Capability::ViewOrganizationData
            | Capability::ManagePhilosophyPack => match role {
                Player | Coach | Admin | Superadmin | Parent | Observer => Grant::Deny,
            },
            Capability::ManageOrganizations | Capability::ManageSubscription => match role {
                Player | Coach | Admin | Superadmin | Parent | Observer => Grant::Deny,
            },
            Capability::ViewChildDevelopment => match role {
                Parent => Grant::LinkedChild,
                Player | Coach | Admin | Superadmin | Observer => Grant::Deny,
            },
            Capability::ViewAssignedTeams => match role {
                Observer => Grant::TeamMember(Observer),
                Coach => Grant::TeamMember(Coach),
                Player | Admin | Superadmin | Parent => Grant::Deny,
            },
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['-', '.', ' '], "_").to_ascii_uppercase();
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| AppError::bad_request(format!("unknown capability: {s}")))
    }
}
