use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::pack::PackFeatures;
use crate::models::person::{Person, PersonType};

use super::capability::Capability;
use super::directory::AccessDirectory;
use super::{packs, resolve_person, roles};

/// Which dashboard sections a person sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleUiConfig {
    pub show_players: bool,
    pub show_teams: bool,
    pub show_observations: bool,
    pub show_development_plans: bool,
    pub show_admin: bool,
    pub show_organization: bool,
    pub show_billing: bool,
    pub show_analytics: bool,
    pub show_child_development: bool,
    pub show_philosophy_pack: bool,
    pub navigation_items: Vec<String>,
}

impl RoleUiConfig {
    /// Everything hidden; what unknown persons get.
    pub fn hidden() -> Self {
        Self {
            show_players: false,
            show_teams: false,
            show_observations: false,
            show_development_plans: false,
            show_admin: false,
            show_organization: false,
            show_billing: false,
            show_analytics: false,
            show_child_development: false,
            show_philosophy_pack: false,
            navigation_items: vec!["dashboard".to_string()],
        }
    }
}

/// Role-level capability without contextual proof: "could this person ever
/// do X". Used for visibility only, never for authorization.
fn capable(person: &Person, roles: &[PersonType], features: &PackFeatures, capability: Capability) -> bool {
    if person.is_super_admin() {
        return true;
    }
    if person.is_org_admin() && capability.is_organization_level() {
        return !capability.requires_entitlement() || features.philosophy_overlay;
    }
    roles.iter().any(|role| capability.grant_for(*role).is_possible())
}

pub fn build(person: &Person, roles: &[PersonType], features: &PackFeatures) -> RoleUiConfig {
    let can = |capability| capable(person, roles, features, capability);
    // Org admins read every record in their organization.
    let org_wide = person.is_org_admin();

    let show_child_development = can(Capability::ViewChildDevelopment);
    let show_players = org_wide || can(Capability::ViewPlayers);
    let show_organization = can(Capability::ViewOrganizationData);

    let config = RoleUiConfig {
        show_players,
        show_teams: can(Capability::ManageTeams) || can(Capability::ViewAssignedTeams),
        show_observations: org_wide
            || can(Capability::AddObservation)
            || can(Capability::ViewOwnObservations)
            || show_child_development,
        show_development_plans: features.simple_pdp
            && (org_wide || can(Capability::CreatePlan) || can(Capability::ViewOwnPlans) || show_child_development),
        show_admin: can(Capability::ManageCoaches),
        show_organization,
        show_billing: can(Capability::ManageSubscription),
        show_analytics: show_organization || show_players,
        show_child_development,
        show_philosophy_pack: can(Capability::ManagePhilosophyPack),
        navigation_items: Vec::new(),
    };

    let mut nav = vec!["dashboard"];
    let sections = [
        (config.show_players, "players"),
        (config.show_teams, "teams"),
        (config.show_observations, "observations"),
        (config.show_development_plans, "development-plans"),
        (config.show_child_development, "children"),
        (config.show_analytics, "analytics"),
        (config.show_admin, "coaches"),
        (config.show_organization, "organization"),
        (config.show_philosophy_pack, "philosophy-pack"),
        (config.show_billing, "billing"),
        (can(Capability::ManageOrganizations), "organizations"),
    ];
    nav.extend(sections.iter().filter(|(shown, _)| *shown).map(|(_, item)| *item));

    RoleUiConfig {
        navigation_items: nav.into_iter().map(String::from).collect(),
        ..config
    }
}

pub async fn role_ui_config(directory: &dyn AccessDirectory, person_id: Uuid) -> RoleUiConfig {
    let Some(person) = resolve_person(directory, person_id).await else {
        return RoleUiConfig::hidden();
    };

    let assignments = roles::secondary_assignments(directory, person.id).await;
    let role_types = roles::effective_types(&person, &assignments);
    let features = packs::pack_features(directory, person.organization_id).await;

    build(&person, &role_types, &features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pack::PackBehavior;

    fn base() -> PackFeatures {
        PackFeatures::from(&PackBehavior::base())
    }

    #[test]
    fn player_sees_own_sections() {
        let player = Person::new(Uuid::new_v4(), PersonType::Player, Uuid::new_v4());
        let ui = build(&player, &[PersonType::Player], &base());

        assert!(!ui.show_players);
        assert!(ui.show_observations);
        assert!(ui.show_development_plans);
        assert!(!ui.show_admin);
        assert_eq!(ui.navigation_items, vec!["dashboard", "observations", "development-plans"]);
    }

    #[test]
    fn admin_sees_org_but_not_billing() {
        let admin = Person::new(Uuid::new_v4(), PersonType::Admin, Uuid::new_v4());
        let ui = build(&admin, &[PersonType::Admin], &base());

        assert!(ui.show_admin && ui.show_organization && ui.show_teams);
        assert!(ui.show_players && ui.show_observations && ui.show_development_plans);
        assert!(!ui.show_billing);
        assert!(!ui.show_philosophy_pack);
        assert!(ui.navigation_items.contains(&"coaches".to_string()));
        assert!(!ui.navigation_items.contains(&"organizations".to_string()));
    }

    #[test]
    fn admin_flag_on_player_shows_org_records() {
        let admin = Person::new(Uuid::new_v4(), PersonType::Player, Uuid::new_v4()).with_admin(true);
        let ui = build(&admin, &[PersonType::Player], &base());

        assert!(ui.show_players && ui.show_observations && ui.show_development_plans);
        assert_eq!(
            &ui.navigation_items[..5],
            &["dashboard", "players", "teams", "observations", "development-plans"]
        );
    }

    #[test]
    fn superadmin_sees_everything() {
        let sa = Person::new(Uuid::new_v4(), PersonType::Superadmin, Uuid::new_v4());
        let ui = build(&sa, &[PersonType::Superadmin], &base());

        assert!(ui.show_billing && ui.show_philosophy_pack && ui.show_child_development);
        assert_eq!(ui.navigation_items.last().map(String::as_str), Some("organizations"));
    }

    #[test]
    fn parent_sees_children() {
        let parent = Person::new(Uuid::new_v4(), PersonType::Parent, Uuid::new_v4());
        let ui = build(&parent, &[PersonType::Parent], &base());

        assert!(ui.show_child_development);
        assert!(!ui.show_players);
        assert!(ui.navigation_items.contains(&"children".to_string()));
    }

    #[test]
    fn hidden_config_only_has_dashboard() {
        assert_eq!(RoleUiConfig::hidden().navigation_items, vec!["dashboard"]);
    }
}
