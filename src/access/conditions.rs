//! SQL predicate synthesis for scope-limited queries.
//!
//! Predicates only ever interpolate `Uuid`s, never caller-supplied strings;
//! the table name selects a shape but is not written into the SQL.

use uuid::Uuid;

use crate::models::person::{Person, PersonType};

use super::directory::AccessDirectory;
use super::resolve_person;

pub const ALLOW_ALL: &str = "1=1";
pub const DENY_ALL: &str = "1=0";

/// Shape of the table a predicate will be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetTable {
    /// `persons`: rows are people, keyed by `id`
    Persons,
    /// `plans` / `observations`: rows owned by `person_id`
    PersonOwned,
    /// `groups`: rows are teams, keyed by `id`
    Groups,
    /// anything else: assumed to carry `group_id` and `person_id`
    Other,
}

impl TargetTable {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "persons" | "person" | "players" => TargetTable::Persons,
            "plans" | "plan" | "pdp" | "observations" | "observation" => TargetTable::PersonOwned,
            "groups" | "group" | "teams" | "team" => TargetTable::Groups,
            _ => TargetTable::Other,
        }
    }

    /// Column holding the owning person.
    fn owner_column(&self) -> &'static str {
        match self {
            TargetTable::Persons => "id",
            TargetTable::PersonOwned | TargetTable::Groups | TargetTable::Other => "person_id",
        }
    }
}

fn quoted_list(ids: &[Uuid]) -> String {
    ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(", ")
}

/// Predicate for a team-scoped person over the given teams.
pub fn team_condition(table: TargetTable, team_ids: &[Uuid]) -> String {
    if team_ids.is_empty() {
        return DENY_ALL.to_string();
    }
    let teams = quoted_list(team_ids);
    let members = format!("SELECT person_id FROM group_memberships WHERE group_id IN ({}) AND active = 1", teams);

    match table {
        TargetTable::Persons => format!("id IN ({})", members),
        TargetTable::PersonOwned => format!("person_id IN ({})", members),
        TargetTable::Groups => format!("id IN ({})", teams),
        TargetTable::Other => format!("group_id IN ({})", teams),
    }
}

/// Predicate restricting rows to the person's own.
pub fn own_condition(table: TargetTable, person_id: Uuid) -> String {
    match table {
        TargetTable::Groups => format!(
            "id IN (SELECT group_id FROM group_memberships WHERE person_id = '{}' AND active = 1)",
            person_id
        ),
        _ => format!("{} = '{}'", table.owner_column(), person_id),
    }
}

/// Predicate restricting rows to a parent's verified children.
pub fn children_condition(table: TargetTable, parent_id: Uuid) -> String {
    let children = format!(
        "SELECT child_id FROM parent_links WHERE parent_id = '{}' AND verified = 1",
        parent_id
    );
    match table {
        TargetTable::Groups => format!(
            "id IN (SELECT group_id FROM group_memberships WHERE person_id IN ({}) AND active = 1)",
            children
        ),
        _ => format!("{} IN ({})", table.owner_column(), children),
    }
}

/// Builds the predicate for `person` on `table_name`.
pub async fn access_conditions(directory: &dyn AccessDirectory, person_id: Uuid, table_name: &str) -> String {
    match resolve_person(directory, person_id).await {
        Some(person) => condition_for(directory, &person, TargetTable::from_name(table_name)).await,
        None => DENY_ALL.to_string(),
    }
}

async fn condition_for(directory: &dyn AccessDirectory, person: &Person, table: TargetTable) -> String {
    if person.is_super_admin() {
        return ALLOW_ALL.to_string();
    }
    if person.is_org_admin() {
        return format!("organization_id = '{}'", person.organization_id);
    }

    match person.person_type {
        PersonType::Player => own_condition(table, person.id),
        PersonType::Parent => children_condition(table, person.id),
        PersonType::Coach | PersonType::Observer => match directory.team_ids(person.id, person.person_type).await {
            Ok(teams) => team_condition(table, &teams),
            Err(e) => {
                tracing::warn!(person_id = %person.id, error = %e, "team lookup failed, denying");
                DENY_ALL.to_string()
            }
        },
        PersonType::Admin | PersonType::Superadmin => DENY_ALL.to_string(),
    }
}
