//! Role-feature gate: a feature is usable iff the organization's pack
//! includes it and the person's role is allowed to use it. Superadmins are
//! the only override.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pack::PackFeatures;
use crate::models::person::PersonType;

use super::directory::AccessDirectory;
use super::{packs, resolve_person, roles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    PlayerManagement,
    BasicObservations,
    SimplePdp,
    AiEnabled,
    PhilosophyOverlay,
    AdvancedConstraints,
    DrillRecommendations,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::PlayerManagement,
        Feature::BasicObservations,
        Feature::SimplePdp,
        Feature::AiEnabled,
        Feature::PhilosophyOverlay,
        Feature::AdvancedConstraints,
        Feature::DrillRecommendations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::PlayerManagement => "playerManagement",
            Feature::BasicObservations => "basicObservations",
            Feature::SimplePdp => "simplePdp",
            Feature::AiEnabled => "aiEnabled",
            Feature::PhilosophyOverlay => "philosophyOverlay",
            Feature::AdvancedConstraints => "advancedConstraints",
            Feature::DrillRecommendations => "drillRecommendations",
        }
    }

    /// Whether the organization's pack includes the feature.
    pub fn is_entitled(&self, features: &PackFeatures) -> bool {
        match self {
            Feature::PlayerManagement => features.player_management,
            Feature::BasicObservations => features.basic_observations,
            Feature::SimplePdp => features.simple_pdp,
            Feature::AiEnabled => features.ai_enabled,
            Feature::PhilosophyOverlay => features.philosophy_overlay,
            Feature::AdvancedConstraints => features.advanced_constraints,
            Feature::DrillRecommendations => features.drill_recommendations,
        }
    }

    /// Per-role allow-list.
    pub fn allowed_for(&self, role: PersonType) -> bool {
        use PersonType::*;

        match self {
            Feature::PlayerManagement => match role {
                Coach | Admin | Superadmin => true,
                Player | Parent | Observer => false,
            },
            Feature::BasicObservations => match role {
                Player | Coach | Admin | Superadmin | Parent | Observer => true,
            },
            Feature::SimplePdp => match role {
                Player | Coach | Admin | Superadmin | Parent => true,
                Observer => false,
            },
            Feature::AiEnabled
            | Feature::PhilosophyOverlay
            | Feature::AdvancedConstraints
            | Feature::DrillRecommendations => match role {
                Coach | Admin | Superadmin => true,
                Player | Parent | Observer => false,
            },
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| AppError::bad_request(format!("unknown feature: {s}")))
    }
}

pub async fn is_feature_available_for_role(directory: &dyn AccessDirectory, person_id: Uuid, feature: Feature) -> bool {
    let Some(person) = resolve_person(directory, person_id).await else {
        return false;
    };

    if person.is_super_admin() {
        return true;
    }

    let features = packs::pack_features(directory, person.organization_id).await;
    if !feature.is_entitled(&features) {
        tracing::debug!(person_id = %person.id, feature = %feature, "feature not in organization pack");
        return false;
    }

    if person.is_org_admin() {
        return true;
    }

    if feature.allowed_for(person.person_type) {
        return true;
    }

    let assignments = roles::secondary_assignments(directory, person.id).await;
    let allowed = roles::effective_types(&person, &assignments)
        .into_iter()
        .any(|role| feature.allowed_for(role));

    tracing::debug!(person_id = %person.id, feature = %feature, allowed, "role feature check");
    allowed
}
