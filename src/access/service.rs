use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::models::pack::{PackBehavior, PackFeatures};
use crate::models::person::Person;
use crate::models::role::{CheckContext, RoleWithContext};

use super::capability::Capability;
use super::directory::AccessDirectory;
use super::features::{self, Feature};
use super::ui::{self, RoleUiConfig};
use super::{conditions, packs, resolve_person, resolver, roles, AccessLevel, EntityType};

/// Entry point for every access question.
///
/// Stateless apart from the directory handle: nothing is cached, so role and
/// entitlement changes apply on the next call.
#[derive(Clone)]
pub struct AccessService {
    directory: Arc<dyn AccessDirectory>,
}

impl AccessService {
    pub fn new(directory: Arc<dyn AccessDirectory>) -> Self {
        Self { directory }
    }

    fn dir(&self) -> &dyn AccessDirectory {
        self.directory.as_ref()
    }

    pub async fn person(&self, person_id: Uuid) -> Option<Person> {
        resolve_person(self.dir(), person_id).await
    }

    pub async fn all_roles(&self, person_id: Uuid) -> BTreeSet<String> {
        roles::all_roles(self.dir(), person_id).await
    }

    pub async fn roles_with_context(&self, person_id: Uuid) -> Vec<RoleWithContext> {
        roles::roles_with_context(self.dir(), person_id).await
    }

    pub async fn has_capability(&self, person_id: Uuid, capability: Capability, ctx: &CheckContext) -> bool {
        resolver::has_capability(self.dir(), person_id, capability, ctx).await
    }

    /// Capability check by wire name. Unknown names are denied.
    pub async fn has_capability_named(&self, person_id: Uuid, capability: &str, ctx: &CheckContext) -> bool {
        match capability.parse::<Capability>() {
            Ok(capability) => self.has_capability(person_id, capability, ctx).await,
            Err(_) => {
                tracing::debug!(person_id = %person_id, capability = %capability, "unknown capability, denying");
                false
            }
        }
    }

    pub async fn data_access_level(&self, person_id: Uuid, entity: EntityType) -> AccessLevel {
        resolver::access_level(self.dir(), person_id, entity).await
    }

    /// Access level by entity name. Unknown entities get no access.
    pub async fn data_access_level_named(&self, person_id: Uuid, entity: &str) -> AccessLevel {
        match entity.parse::<EntityType>() {
            Ok(entity) => self.data_access_level(person_id, entity).await,
            Err(_) => AccessLevel::None,
        }
    }

    pub async fn data_access_conditions(&self, person_id: Uuid, table_name: &str) -> String {
        conditions::access_conditions(self.dir(), person_id, table_name).await
    }

    pub async fn pack_behavior(&self, organization_id: Uuid) -> PackBehavior {
        packs::pack_behavior(self.dir(), organization_id).await
    }

    pub async fn pack_features(&self, organization_id: Uuid) -> PackFeatures {
        packs::pack_features(self.dir(), organization_id).await
    }

    pub async fn augment_prompt(&self, organization_id: Uuid, use_case: &str, base_prompt: &str) -> String {
        packs::augment_prompt(self.dir(), organization_id, use_case, base_prompt).await
    }

    pub async fn is_feature_available_for_role(&self, person_id: Uuid, feature: Feature) -> bool {
        features::is_feature_available_for_role(self.dir(), person_id, feature).await
    }

    /// Feature gate by name. Unknown features are unavailable.
    pub async fn is_feature_available_named(&self, person_id: Uuid, feature: &str) -> bool {
        match feature.parse::<Feature>() {
            Ok(feature) => self.is_feature_available_for_role(person_id, feature).await,
            Err(_) => {
                tracing::debug!(person_id = %person_id, feature = %feature, "unknown feature, denying");
                false
            }
        }
    }

    pub async fn role_ui_config(&self, person_id: Uuid) -> RoleUiConfig {
        ui::role_ui_config(self.dir(), person_id).await
    }
}
