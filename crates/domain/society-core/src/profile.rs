use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credentials::ValidationError;
use crate::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(String);

impl BuildingId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || !trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::BuildingId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which login flow a request belongs to. The flows share one state machine
/// and differ only in the identifier sent along.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tenant {
    Global,
    Building(BuildingId),
}

impl Tenant {
    pub fn building_id(&self) -> Option<&BuildingId> {
        match self {
            Tenant::Global => None,
            Tenant::Building(id) => Some(id),
        }
    }

    pub fn from_building(building_id: Option<BuildingId>) -> Self {
        building_id.map(Tenant::Building).unwrap_or(Tenant::Global)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub roles: BTreeSet<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<BuildingId>,
}

impl Profile {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn tenant(&self) -> Tenant {
        Tenant::from_building(self.building_id.clone())
    }

    /// A profile is usable for a session only with at least one role.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && !self.roles.is_empty()
    }

    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(roles) = patch.roles {
            if !roles.is_empty() {
                self.roles = roles;
            }
        }
    }
}

/// Partial profile update. Building scope is fixed for the lifetime of a
/// session and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub roles: Option<BTreeSet<Role>>,
}
