use uuid::Uuid;

use crate::models::person::{Person, PersonType};
use crate::models::role::{CheckContext, RoleAssignment, ScopeType};

use super::capability::{Capability, Grant};
use super::directory::AccessDirectory;
use super::{packs, resolve_person, roles, AccessLevel, EntityType};

/// Decides whether a person holds `capability`, optionally scoped by `ctx`.
///
/// Evaluation order:
/// 1. superadmin -> allow
/// 2. org admin + organization-level capability -> allow (pack-gated ones
///    follow the organization's entitlement)
/// 3. rule table for the primary role, then for each secondary role, with
///    contextual verification
/// 4. deny
pub async fn has_capability(
    directory: &dyn AccessDirectory,
    person_id: Uuid,
    capability: Capability,
    ctx: &CheckContext,
) -> bool {
    let Some(person) = resolve_person(directory, person_id).await else {
        return false;
    };

    // 1. Super admin bypasses all checks
    if person.is_super_admin() {
        tracing::debug!(person_id = %person.id, capability = %capability, "super_admin bypass");
        return true;
    }

    // 2. Organization admin
    if person.is_org_admin() && capability.is_organization_level() {
        if capability.requires_entitlement() {
            let entitled = packs::pack_features(directory, person.organization_id).await.philosophy_overlay;
            tracing::debug!(
                person_id = %person.id,
                capability = %capability,
                entitled,
                "org admin entitlement-gated capability"
            );
            return entitled;
        }
        tracing::debug!(person_id = %person.id, capability = %capability, "org admin grant");
        return true;
    }

    // 3. Role table, primary role first
    let primary = capability.grant_for(person.person_type);
    if verify_grant(directory, &person, primary, ctx, &[]).await {
        tracing::debug!(person_id = %person.id, capability = %capability, role = %person.person_type, "role grant");
        return true;
    }

    let assignments = roles::secondary_assignments(directory, person.id).await;
    for role in roles::effective_types(&person, &assignments) {
        let grant = capability.grant_for(role);
        if verify_grant(directory, &person, grant, ctx, &assignments).await {
            tracing::debug!(person_id = %person.id, capability = %capability, role = %role, "contextual role grant");
            return true;
        }
    }

    // 4. Deny
    tracing::debug!(person_id = %person.id, capability = %capability, "capability denied");
    false
}

/// Second phase of a check: prove the relationship a grant depends on.
async fn verify_grant(
    directory: &dyn AccessDirectory,
    person: &Person,
    grant: Grant,
    ctx: &CheckContext,
    assignments: &[RoleAssignment],
) -> bool {
    match grant {
        Grant::Deny => false,
        Grant::Allow => true,
        Grant::TeamMember(role) => match ctx.group_id {
            None => true,
            Some(team_id) => {
                if team_scoped_assignment(person, assignments, role, team_id) {
                    return true;
                }
                match directory.has_team_membership(person.id, team_id, role).await {
                    Ok(member) => member,
                    Err(e) => {
                        tracing::warn!(person_id = %person.id, team_id = %team_id, error = %e, "membership lookup failed");
                        false
                    }
                }
            }
        },
        Grant::LinkedChild => match ctx.person_id {
            None => false,
            Some(child_id) => match directory.is_parent_of(person.id, child_id).await {
                Ok(linked) => linked,
                Err(e) => {
                    tracing::warn!(person_id = %person.id, child_id = %child_id, error = %e, "parent link lookup failed");
                    false
                }
            },
        },
    }
}

/// A secondary role scoped to the team also proves membership.
fn team_scoped_assignment(person: &Person, assignments: &[RoleAssignment], role: PersonType, team_id: Uuid) -> bool {
    assignments.iter().any(|a| {
        roles::grants_rights(person, a)
            && a.scope_type == ScopeType::Team
            && a.person_type() == Some(role)
            && a.scope_ids.contains(&team_id)
    })
}

/// Data scope of a person for an entity type. Depends on the primary role
/// only; the entity type does not change the answer today.
pub fn access_level_for(person: &Person, _entity: EntityType) -> AccessLevel {
    if person.is_super_admin() {
        return AccessLevel::All;
    }
    if person.is_org_admin() {
        return AccessLevel::Organization;
    }
    match person.person_type {
        PersonType::Player => AccessLevel::Own,
        PersonType::Coach => AccessLevel::Team,
        PersonType::Parent => AccessLevel::Own,
        PersonType::Observer => AccessLevel::Team,
        PersonType::Admin | PersonType::Superadmin => AccessLevel::None,
    }
}

pub async fn access_level(directory: &dyn AccessDirectory, person_id: Uuid, entity: EntityType) -> AccessLevel {
    match resolve_person(directory, person_id).await {
        Some(person) => access_level_for(&person, entity),
        None => AccessLevel::None,
    }
}
