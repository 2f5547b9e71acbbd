use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Administrative role carried by an authenticated profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    BuildingAdmin,
}

impl Role {
    /// Order in which roles are consulted when picking a landing route.
    pub const PRIORITY: [Role; 2] = [Role::SuperAdmin, Role::BuildingAdmin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::BuildingAdmin => "BuildingAdmin",
        }
    }

    /// Parses the role tags returned by the backend, dropping the ones this
    /// console does not know about.
    pub fn parse_set<I, S>(tags: I) -> BTreeSet<Role>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .filter_map(|tag| match tag.as_ref().parse::<Role>() {
                Ok(role) => Some(role),
                Err(unknown) => {
                    tracing::warn!("ignoring unrecognized role tag '{}'", unknown.0);
                    None
                }
            })
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SuperAdmin" | "superAdmin" | "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "BuildingAdmin" | "buildingAdmin" | "BUILDING_ADMIN" => Ok(Role::BuildingAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
