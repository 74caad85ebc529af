use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::pack::{PackConfig, PromptTemplate};
use crate::models::person::{Person, PersonType};
use crate::models::role::{RoleAssignment, RoleSource};

use super::directory::AccessDirectory;

#[derive(Debug, Default)]
struct MemoryState {
    persons: HashMap<Uuid, Person>,
    /// (person, team, role) -> active
    memberships: HashMap<(Uuid, Uuid, PersonType), bool>,
    /// (parent, child) -> verified
    parent_links: HashMap<(Uuid, Uuid), bool>,
    roles: Vec<RoleAssignment>,
    overlays: HashMap<Uuid, Option<String>>,
    pack_configs: Vec<PackConfig>,
    prompt_templates: Vec<PromptTemplate>,
}

/// In-process directory for tests, demos and tooling.
///
/// All mutators take `&self` so a directory shared with an `AccessService`
/// can be changed between checks.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<MemoryState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_person(&self, person: Person) {
        self.state().persons.insert(person.id, person);
    }

    pub fn set_overlay(&self, organization_id: Uuid, overlay_version: Option<&str>) {
        self.state()
            .overlays
            .insert(organization_id, overlay_version.map(str::to_string));
    }

    pub fn set_membership(&self, person_id: Uuid, team_id: Uuid, role: PersonType, active: bool) {
        self.state().memberships.insert((person_id, team_id, role), active);
    }

    pub fn link_parent(&self, parent_id: Uuid, child_id: Uuid, verified: bool) {
        self.state().parent_links.insert((parent_id, child_id), verified);
    }

    pub fn add_role(&self, assignment: RoleAssignment) {
        self.state().roles.push(assignment);
    }

    pub fn add_pack_config(&self, config: PackConfig) {
        self.state().pack_configs.push(config);
    }

    pub fn add_prompt_template(&self, template: PromptTemplate) {
        self.state().prompt_templates.push(template);
    }
}

#[async_trait]
impl AccessDirectory for MemoryDirectory {
    async fn person_by_id(&self, person_id: Uuid) -> AppResult<Option<Person>> {
        Ok(self.state().persons.get(&person_id).cloned())
    }

    async fn role_assignments(&self, person_id: Uuid, source: RoleSource) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .state()
            .roles
            .iter()
            .filter(|r| r.person_id == person_id && r.source == source && r.active)
            .cloned()
            .collect())
    }

    async fn has_team_membership(&self, person_id: Uuid, team_id: Uuid, role: PersonType) -> AppResult<bool> {
        Ok(self
            .state()
            .memberships
            .get(&(person_id, team_id, role))
            .copied()
            .unwrap_or(false))
    }

    async fn team_ids(&self, person_id: Uuid, role: PersonType) -> AppResult<Vec<Uuid>> {
        let state = self.state();
        let mut ids: Vec<Uuid> = state
            .memberships
            .iter()
            .filter(|((p, _, r), active)| *p == person_id && *r == role && **active)
            .map(|((_, team, _), _)| *team)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn is_parent_of(&self, parent_id: Uuid, child_id: Uuid) -> AppResult<bool> {
        Ok(self
            .state()
            .parent_links
            .get(&(parent_id, child_id))
            .copied()
            .unwrap_or(false))
    }

    async fn organization_overlay_version(&self, organization_id: Uuid) -> AppResult<Option<String>> {
        Ok(self.state().overlays.get(&organization_id).cloned().flatten())
    }

    async fn pack_config_by_version(&self, version: &str) -> AppResult<Option<PackConfig>> {
        Ok(self
            .state()
            .pack_configs
            .iter()
            .rev()
            .find(|c| c.version == version && c.active)
            .cloned())
    }

    async fn prompt_template(&self, use_case: &str, version: &str) -> AppResult<Option<PromptTemplate>> {
        Ok(self
            .state()
            .prompt_templates
            .iter()
            .rev()
            .find(|t| t.use_case == use_case && t.version == version)
            .cloned())
    }
}
