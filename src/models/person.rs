use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Primary role of a person. This is the single source of truth for
/// role-based display and logic; secondary roles never replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PersonType {
    Player,
    Coach,
    Admin,
    Superadmin,
    Parent,
    Observer,
}

impl PersonType {
    pub const ALL: [PersonType; 6] = [
        PersonType::Player,
        PersonType::Coach,
        PersonType::Admin,
        PersonType::Superadmin,
        PersonType::Parent,
        PersonType::Observer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonType::Player => "player",
            PersonType::Coach => "coach",
            PersonType::Admin => "admin",
            PersonType::Superadmin => "superadmin",
            PersonType::Parent => "parent",
            PersonType::Observer => "observer",
        }
    }
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" => Ok(PersonType::Player),
            "coach" => Ok(PersonType::Coach),
            "admin" => Ok(PersonType::Admin),
            "superadmin" | "super_admin" => Ok(PersonType::Superadmin),
            "parent" => Ok(PersonType::Parent),
            "observer" => Ok(PersonType::Observer),
            other => Err(AppError::bad_request(format!("unknown person type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Person {
    pub id: Uuid,
    pub person_type: PersonType,
    pub organization_id: Uuid,
    pub is_admin: bool,
    pub is_superadmin: bool,
    pub display_name: String,
}

impl Person {
    pub fn new(id: Uuid, person_type: PersonType, organization_id: Uuid) -> Self {
        Self {
            id,
            person_type,
            organization_id,
            is_admin: false,
            is_superadmin: false,
            display_name: String::new(),
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn with_superadmin(mut self, is_superadmin: bool) -> Self {
        self.is_superadmin = is_superadmin;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Superadmin by flag or by primary type.
    pub fn is_super_admin(&self) -> bool {
        self.is_superadmin || self.person_type == PersonType::Superadmin
    }

    /// Organization admin by flag or by primary type. Superadmins also count.
    pub fn is_org_admin(&self) -> bool {
        self.is_admin || self.person_type == PersonType::Admin || self.is_super_admin()
    }
}

/// Raw `persons` row before the person type is validated.
#[derive(Debug, Clone)]
pub struct DbPerson {
    pub id: Uuid,
    pub person_type: String,
    pub organization_id: Uuid,
    pub is_admin: bool,
    pub is_superadmin: bool,
    pub display_name: String,
}

impl TryFrom<DbPerson> for Person {
    type Error = AppError;

    fn try_from(value: DbPerson) -> Result<Self, Self::Error> {
        let person_type = value
            .person_type
            .parse::<PersonType>()
            .map_err(|_| AppError::internal(format!("invalid person_type in row: {}", value.person_type)))?;

        Ok(Person {
            id: value.id,
            person_type,
            organization_id: value.organization_id,
            is_admin: value.is_admin,
            is_superadmin: value.is_superadmin,
            display_name: value.display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_type_parses_case_insensitively() {
        assert_eq!("Coach".parse::<PersonType>().unwrap(), PersonType::Coach);
        assert_eq!("super_admin".parse::<PersonType>().unwrap(), PersonType::Superadmin);
        assert!("referee".parse::<PersonType>().is_err());
    }

    #[test]
    fn admin_flags_follow_primary_type() {
        let org = Uuid::new_v4();
        let admin = Person::new(Uuid::new_v4(), PersonType::Admin, org);
        assert!(admin.is_org_admin());
        assert!(!admin.is_super_admin());

        let flagged = Person::new(Uuid::new_v4(), PersonType::Coach, org).with_superadmin(true);
        assert!(flagged.is_super_admin());
        assert!(flagged.is_org_admin());
    }

    #[test]
    fn bad_person_type_row_is_rejected() {
        let row = DbPerson {
            id: Uuid::new_v4(),
            person_type: "mascot".into(),
            organization_id: Uuid::new_v4(),
            is_admin: false,
            is_superadmin: false,
            display_name: "Benny".into(),
        };
        assert!(Person::try_from(row).is_err());
    }
}
