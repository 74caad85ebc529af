//! Role aggregation: the primary person type plus secondary assignments from
//! every role source.

use std::collections::{BTreeSet, HashSet};

use uuid::Uuid;

use crate::models::person::{Person, PersonType};
use crate::models::role::{RoleAssignment, RoleContext, RoleSource, RoleWithContext, ScopeType};

use super::directory::AccessDirectory;
use super::resolve_person;

/// Active secondary assignments across all sources. A source that fails to
/// load is skipped; secondary roles are never required for a decision.
pub async fn secondary_assignments(directory: &dyn AccessDirectory, person_id: Uuid) -> Vec<RoleAssignment> {
    let mut assignments = Vec::new();

    for source in RoleSource::ALL {
        match directory.role_assignments(person_id, source).await {
            Ok(found) => assignments.extend(found.into_iter().filter(|a| a.active)),
            Err(e) => {
                tracing::warn!(
                    person_id = %person_id,
                    source = source.table(),
                    error = %e,
                    "failed to load secondary roles"
                );
            }
        }
    }

    assignments
}

/// Whether a secondary assignment may widen the person's rights: it must
/// belong to the person's organization (or none) and must not name an admin
/// role, since admin power only comes from the person's flags.
pub fn grants_rights(person: &Person, assignment: &RoleAssignment) -> bool {
    let same_org = assignment
        .organization_id
        .map_or(true, |org| org == person.organization_id);
    let non_admin = !matches!(
        assignment.person_type(),
        Some(PersonType::Admin | PersonType::Superadmin)
    );
    assignment.active && same_org && non_admin
}

/// Known role types the person acts as, primary first, without duplicates.
pub fn effective_types(person: &Person, assignments: &[RoleAssignment]) -> Vec<PersonType> {
    let mut seen = HashSet::new();
    std::iter::once(person.person_type)
        .chain(
            assignments
                .iter()
                .filter(|a| grants_rights(person, a))
                .filter_map(RoleAssignment::person_type),
        )
        .filter(|t| seen.insert(*t))
        .collect()
}

/// All role names of a person. Empty when the person does not exist.
pub async fn all_roles(directory: &dyn AccessDirectory, person_id: Uuid) -> BTreeSet<String> {
    let Some(person) = resolve_person(directory, person_id).await else {
        return BTreeSet::new();
    };

    let mut roles = BTreeSet::new();
    roles.insert(person.person_type.to_string());
    for assignment in secondary_assignments(directory, person_id).await {
        roles.insert(assignment.role.to_ascii_lowercase());
    }
    roles
}

/// Roles with the scope each applies in. The primary role is reported at
/// organization scope; team-scoped assignments yield one entry per team.
pub async fn roles_with_context(directory: &dyn AccessDirectory, person_id: Uuid) -> Vec<RoleWithContext> {
    let Some(person) = resolve_person(directory, person_id).await else {
        return Vec::new();
    };

    let assignments = secondary_assignments(directory, person_id).await;
    contextualize(&person, &assignments)
}

pub fn contextualize(person: &Person, assignments: &[RoleAssignment]) -> Vec<RoleWithContext> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    let primary = RoleWithContext {
        role: person.person_type.to_string(),
        context: RoleContext {
            person_id: person.id,
            organization_id: Some(person.organization_id),
            group_id: None,
            context_type: if person.is_super_admin() { ScopeType::System } else { ScopeType::Organization },
        },
    };
    seen.insert(primary.clone());
    out.push(primary);

    for assignment in assignments {
        let organization_id = assignment.organization_id.or(Some(person.organization_id));
        let groups: Vec<Option<Uuid>> = match assignment.scope_type {
            ScopeType::Team if !assignment.scope_ids.is_empty() => {
                assignment.scope_ids.iter().copied().map(Some).collect()
            }
            _ => vec![None],
        };

        for group_id in groups {
            let entry = RoleWithContext {
                role: assignment.role.to_ascii_lowercase(),
                context: RoleContext {
                    person_id: person.id,
                    organization_id,
                    group_id,
                    context_type: assignment.scope_type,
                },
            };
            if seen.insert(entry.clone()) {
                out.push(entry);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::access::capability::Capability;
    use crate::access::directory::AccessDirectory;
    use crate::access::memory::MemoryDirectory;
    use crate::access::resolver::has_capability;
    use crate::errors::{AppError, AppResult};
    use crate::models::pack::{PackConfig, PromptTemplate};
    use crate::models::role::CheckContext;

    /// Directory whose role tables are unreachable.
    struct RolesOffline(MemoryDirectory);

    #[async_trait]
    impl AccessDirectory for RolesOffline {
        async fn person_by_id(&self, id: Uuid) -> AppResult<Option<Person>> {
            self.0.person_by_id(id).await
        }
        async fn role_assignments(&self, _id: Uuid, _source: RoleSource) -> AppResult<Vec<RoleAssignment>> {
            Err(AppError::internal("role store offline"))
        }
        async fn has_team_membership(&self, p: Uuid, t: Uuid, r: PersonType) -> AppResult<bool> {
            self.0.has_team_membership(p, t, r).await
        }
        async fn team_ids(&self, p: Uuid, r: PersonType) -> AppResult<Vec<Uuid>> {
            self.0.team_ids(p, r).await
        }
        async fn is_parent_of(&self, p: Uuid, c: Uuid) -> AppResult<bool> {
            self.0.is_parent_of(p, c).await
        }
        async fn organization_overlay_version(&self, org: Uuid) -> AppResult<Option<String>> {
            self.0.organization_overlay_version(org).await
        }
        async fn pack_config_by_version(&self, version: &str) -> AppResult<Option<PackConfig>> {
            self.0.pack_config_by_version(version).await
        }
        async fn prompt_template(&self, use_case: &str, version: &str) -> AppResult<Option<PromptTemplate>> {
            self.0.prompt_template(use_case, version).await
        }
    }

    fn assignment(person: &Person, role: &str, scope_type: ScopeType, scope_ids: Vec<Uuid>, source: RoleSource) -> RoleAssignment {
        RoleAssignment {
            person_id: person.id,
            role: role.to_string(),
            organization_id: Some(person.organization_id),
            scope_type,
            scope_ids,
            active: true,
            source,
        }
    }

    #[tokio::test]
    async fn primary_role_is_always_present() {
        let dir = MemoryDirectory::new();
        let person = Person::new(Uuid::new_v4(), PersonType::Player, Uuid::new_v4());
        dir.insert_person(person.clone());

        let roles = all_roles(&dir, person.id).await;
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["player".to_string()]);
    }

    #[tokio::test]
    async fn roles_merge_both_sources_and_dedupe() {
        let dir = MemoryDirectory::new();
        let person = Person::new(Uuid::new_v4(), PersonType::Coach, Uuid::new_v4());
        dir.insert_person(person.clone());
        dir.add_role(assignment(&person, "observer", ScopeType::Team, vec![Uuid::new_v4()], RoleSource::Generic));
        dir.add_role(assignment(&person, "observer", ScopeType::Team, vec![Uuid::new_v4()], RoleSource::Domain));
        dir.add_role(assignment(&person, "coach", ScopeType::Organization, vec![], RoleSource::Domain));

        let roles = all_roles(&dir, person.id).await;
        assert_eq!(roles.len(), 2);
        assert!(roles.contains("coach"));
        assert!(roles.contains("observer"));
    }

    #[tokio::test]
    async fn failed_role_sources_fall_back_to_primary() {
        let inner = MemoryDirectory::new();
        let player = Person::new(Uuid::new_v4(), PersonType::Player, Uuid::new_v4());
        inner.insert_person(player.clone());
        inner.add_role(assignment(&player, "coach", ScopeType::Organization, vec![], RoleSource::Generic));
        let dir = RolesOffline(inner);

        let roles = all_roles(&dir, player.id).await;
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["player".to_string()]);
        assert_eq!(roles_with_context(&dir, player.id).await.len(), 1);

        let none = CheckContext::new();
        assert!(has_capability(&dir, player.id, Capability::ViewOwnPlans, &none).await);
        assert!(!has_capability(&dir, player.id, Capability::CreatePlan, &none).await);
    }

    #[tokio::test]
    async fn role_names_are_case_insensitive() {
        let dir = MemoryDirectory::new();
        let person = Person::new(Uuid::new_v4(), PersonType::Coach, Uuid::new_v4());
        dir.insert_person(person.clone());
        dir.add_role(assignment(&person, "Coach", ScopeType::Organization, vec![], RoleSource::Generic));
        dir.add_role(assignment(&person, "OBSERVER", ScopeType::Organization, vec![], RoleSource::Domain));

        let roles = all_roles(&dir, person.id).await;
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["coach".to_string(), "observer".to_string()]);
    }

    #[test]
    fn foreign_org_and_admin_assignments_grant_nothing() {
        let person = Person::new(Uuid::new_v4(), PersonType::Player, Uuid::new_v4());
        let mut foreign = assignment(&person, "coach", ScopeType::Team, vec![Uuid::new_v4()], RoleSource::Domain);
        foreign.organization_id = Some(Uuid::new_v4());
        let mut unscoped = assignment(&person, "observer", ScopeType::System, vec![], RoleSource::Generic);
        unscoped.organization_id = None;
        let assignments = vec![
            foreign,
            unscoped,
            assignment(&person, "admin", ScopeType::Organization, vec![], RoleSource::Generic),
            assignment(&person, "superadmin", ScopeType::System, vec![], RoleSource::Generic),
        ];

        assert_eq!(effective_types(&person, &assignments), vec![PersonType::Player, PersonType::Observer]);
    }

    #[tokio::test]
    async fn unknown_person_has_no_roles() {
        let dir = MemoryDirectory::new();
        assert!(all_roles(&dir, Uuid::new_v4()).await.is_empty());
        assert!(roles_with_context(&dir, Uuid::new_v4()).await.is_empty());
    }

    #[test]
    fn team_assignments_expand_per_team() {
        let person = Person::new(Uuid::new_v4(), PersonType::Coach, Uuid::new_v4());
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let assignments = vec![assignment(&person, "observer", ScopeType::Team, vec![t1, t2], RoleSource::Domain)];

        let out = contextualize(&person, &assignments);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].role, "coach");
        assert_eq!(out[0].context.context_type, ScopeType::Organization);
        assert_eq!(out[1].context.group_id, Some(t1));
        assert_eq!(out[2].context.group_id, Some(t2));
    }

    #[test]
    fn effective_types_ignore_unknown_roles() {
        let person = Person::new(Uuid::new_v4(), PersonType::Coach, Uuid::new_v4());
        let assignments = vec![
            assignment(&person, "scout", ScopeType::Organization, vec![], RoleSource::Generic),
            assignment(&person, "observer", ScopeType::Organization, vec![], RoleSource::Generic),
            assignment(&person, "coach", ScopeType::Organization, vec![], RoleSource::Domain),
        ];
        assert_eq!(effective_types(&person, &assignments), vec![PersonType::Coach, PersonType::Observer]);
    }
}
