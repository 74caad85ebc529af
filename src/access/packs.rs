//! Feature-pack resolution. An organization runs on the base tier unless its
//! overlay version names an active pack configuration. Every lookup failure
//! lands on the base tier.

use uuid::Uuid;

use crate::models::pack::{PackBehavior, PackFeatures, BASIC_OVERLAY};

use super::directory::AccessDirectory;

pub async fn pack_behavior(directory: &dyn AccessDirectory, organization_id: Uuid) -> PackBehavior {
    let overlay = match directory.organization_overlay_version(organization_id).await {
        Ok(overlay) => overlay,
        Err(e) => {
            tracing::warn!(organization_id = %organization_id, error = %e, "overlay lookup failed, using base pack");
            return PackBehavior::base();
        }
    };

    let version = match overlay.as_deref().map(str::trim) {
        None | Some("") | Some(BASIC_OVERLAY) => return PackBehavior::base(),
        Some(version) => version,
    };

    match directory.pack_config_by_version(version).await {
        Ok(Some(config)) if config.active => {
            tracing::debug!(organization_id = %organization_id, version = %version, "enhanced pack");
            PackBehavior::enhanced(config)
        }
        Ok(_) => {
            tracing::warn!(
                organization_id = %organization_id,
                version = %version,
                "overlay has no active pack config, using base pack"
            );
            PackBehavior::base()
        }
        Err(e) => {
            tracing::warn!(
                organization_id = %organization_id,
                version = %version,
                error = %e,
                "pack config lookup failed, using base pack"
            );
            PackBehavior::base()
        }
    }
}

pub async fn pack_features(directory: &dyn AccessDirectory, organization_id: Uuid) -> PackFeatures {
    PackFeatures::from(&pack_behavior(directory, organization_id).await)
}

/// Prefixes `base_prompt` with the pack's system instructions for `use_case`
/// when the organization's pack has AI enabled. Otherwise, or when no
/// template exists, the base prompt is returned unchanged.
pub async fn augment_prompt(
    directory: &dyn AccessDirectory,
    organization_id: Uuid,
    use_case: &str,
    base_prompt: &str,
) -> String {
    let behavior = pack_behavior(directory, organization_id).await;
    let version = match (&behavior.version, behavior.ai_enabled) {
        (Some(version), true) => version,
        _ => return base_prompt.to_string(),
    };

    match directory.prompt_template(use_case, version).await {
        Ok(Some(template)) if !template.system_instructions.trim().is_empty() => {
            format!("{}\n\n{}", template.system_instructions.trim_end(), base_prompt)
        }
        Ok(_) => base_prompt.to_string(),
        Err(e) => {
            tracing::warn!(
                organization_id = %organization_id,
                use_case = %use_case,
                error = %e,
                "prompt template lookup failed"
            );
            base_prompt.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::access::memory::MemoryDirectory;
    use crate::errors::{AppError, AppResult};
    use crate::models::pack::{PackConfig, PackType, PromptTemplate};
    use crate::models::person::{Person, PersonType};
    use crate::models::role::{RoleAssignment, RoleSource};

    /// Counts pack-config lookups and can simulate an unavailable store.
    struct Probe {
        inner: MemoryDirectory,
        pack_lookups: AtomicUsize,
        broken: bool,
    }

    impl Probe {
        fn new(inner: MemoryDirectory) -> Self {
            Self { inner, pack_lookups: AtomicUsize::new(0), broken: false }
        }
    }

    #[async_trait]
    impl AccessDirectory for Probe {
        async fn person_by_id(&self, id: Uuid) -> AppResult<Option<Person>> {
            self.inner.person_by_id(id).await
        }
        async fn role_assignments(&self, id: Uuid, source: RoleSource) -> AppResult<Vec<RoleAssignment>> {
            self.inner.role_assignments(id, source).await
        }
        async fn has_team_membership(&self, p: Uuid, t: Uuid, r: PersonType) -> AppResult<bool> {
            self.inner.has_team_membership(p, t, r).await
        }
        async fn team_ids(&self, p: Uuid, r: PersonType) -> AppResult<Vec<Uuid>> {
            self.inner.team_ids(p, r).await
        }
        async fn is_parent_of(&self, p: Uuid, c: Uuid) -> AppResult<bool> {
            self.inner.is_parent_of(p, c).await
        }
        async fn organization_overlay_version(&self, org: Uuid) -> AppResult<Option<String>> {
            if self.broken {
                return Err(AppError::internal("store offline"));
            }
            self.inner.organization_overlay_version(org).await
        }
        async fn pack_config_by_version(&self, version: &str) -> AppResult<Option<PackConfig>> {
            self.pack_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.pack_config_by_version(version).await
        }
        async fn prompt_template(&self, use_case: &str, version: &str) -> AppResult<Option<PromptTemplate>> {
            self.inner.prompt_template(use_case, version).await
        }
    }

    fn pack(version: &str, ai: serde_json::Value) -> PackConfig {
        PackConfig {
            id: Uuid::new_v4(),
            version: version.to_string(),
            schema_version: "1".into(),
            prompt_library: json!({}),
            constraint_definitions: json!({"uiOverrides": {"accent": "#ff6600"}}),
            ai_model_config: ai,
            active: true,
        }
    }

    #[tokio::test]
    async fn base_orgs_never_touch_pack_store() {
        let dir = MemoryDirectory::new();
        let (no_overlay, basic) = (Uuid::new_v4(), Uuid::new_v4());
        dir.set_overlay(no_overlay, None);
        dir.set_overlay(basic, Some(BASIC_OVERLAY));
        let probe = Probe::new(dir);

        for org in [no_overlay, basic, Uuid::new_v4()] {
            let features = pack_features(&probe, org).await;
            assert_eq!(
                features,
                PackFeatures {
                    player_management: true,
                    basic_observations: true,
                    simple_pdp: true,
                    ai_enabled: false,
                    philosophy_overlay: false,
                    advanced_constraints: false,
                    drill_recommendations: false,
                    ui_overrides: None,
                }
            );
        }
        assert_eq!(probe.pack_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn matching_pack_enables_enhanced_tier() {
        let dir = MemoryDirectory::new();
        let org = Uuid::new_v4();
        dir.set_overlay(org, Some("elite-v2"));
        dir.add_pack_config(pack("elite-v2", json!({"enabled": "true"})));

        let behavior = pack_behavior(&dir, org).await;
        assert_eq!(behavior.pack_type, PackType::Enhanced);
        assert!(behavior.ai_enabled);
        assert_eq!(behavior.version.as_deref(), Some("elite-v2"));
        assert_eq!(behavior.ui_overrides, Some(json!({"accent": "#ff6600"})));

        let features = pack_features(&dir, org).await;
        assert!(features.ai_enabled && features.philosophy_overlay && features.drill_recommendations);
    }

    #[tokio::test]
    async fn missing_or_inactive_pack_falls_back_to_base() {
        let dir = MemoryDirectory::new();
        let (dangling, inactive) = (Uuid::new_v4(), Uuid::new_v4());
        dir.set_overlay(dangling, Some("ghost-v1"));
        dir.set_overlay(inactive, Some("retired-v1"));
        let mut retired = pack("retired-v1", json!({"enabled": true}));
        retired.active = false;
        dir.add_pack_config(retired);

        assert_eq!(pack_behavior(&dir, dangling).await.pack_type, PackType::Base);
        assert_eq!(pack_behavior(&dir, inactive).await.pack_type, PackType::Base);
    }

    #[tokio::test]
    async fn store_failure_falls_back_to_base() {
        let dir = MemoryDirectory::new();
        let org = Uuid::new_v4();
        dir.set_overlay(org, Some("elite-v2"));
        dir.add_pack_config(pack("elite-v2", json!({"enabled": true})));
        let mut probe = Probe::new(dir);
        probe.broken = true;

        let behavior = pack_behavior(&probe, org).await;
        assert_eq!(behavior.pack_type, PackType::Base);
        assert!(behavior.use_core_logic_only);
    }

    #[tokio::test]
    async fn prompt_augmented_only_with_ai() {
        let dir = MemoryDirectory::new();
        let (ai_org, quiet_org) = (Uuid::new_v4(), Uuid::new_v4());
        dir.set_overlay(ai_org, Some("elite-v2"));
        dir.set_overlay(quiet_org, Some("calm-v1"));
        dir.add_pack_config(pack("elite-v2", json!({"enabled": true})));
        dir.add_pack_config(pack("calm-v1", json!({"enabled": false})));
        for version in ["elite-v2", "calm-v1"] {
            dir.add_prompt_template(PromptTemplate {
                use_case: "pdp".into(),
                version: version.into(),
                system_instructions: "Coach with constraints first.".into(),
            });
        }

        let augmented = augment_prompt(&dir, ai_org, "pdp", "Write a plan.").await;
        assert_eq!(augmented, "Coach with constraints first.\n\nWrite a plan.");
        assert_eq!(augment_prompt(&dir, quiet_org, "pdp", "Write a plan.").await, "Write a plan.");
        assert_eq!(augment_prompt(&dir, ai_org, "drills", "List drills.").await, "List drills.");
    }
}
