//! Boundary for the CRUD screens: one slice per (resource, verb) pair.

use std::fmt;

use serde_json::Value;
use society_core::{BuildingId, Profile};
use society_infra::{encode_segment, ApiRequest, Method};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Buildings,
    Dashboard,
    Blocks,
    Floors,
    Units,
    Amenities,
    Notices,
    Complaints,
    Events,
    Visitors,
    Maintenance,
    Parking,
    Employees,
    CommitteeMembers,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 14] = [
        ResourceKind::Buildings,
        ResourceKind::Dashboard,
        ResourceKind::Blocks,
        ResourceKind::Floors,
        ResourceKind::Units,
        ResourceKind::Amenities,
        ResourceKind::Notices,
        ResourceKind::Complaints,
        ResourceKind::Events,
        ResourceKind::Visitors,
        ResourceKind::Maintenance,
        ResourceKind::Parking,
        ResourceKind::Employees,
        ResourceKind::CommitteeMembers,
    ];

    /// URL segment on the backend.
    pub fn segment(self) -> &'static str {
        match self {
            ResourceKind::Buildings => "buildings",
            ResourceKind::Dashboard => "dashboard",
            ResourceKind::Blocks => "blocks",
            ResourceKind::Floors => "floors",
            ResourceKind::Units => "units",
            ResourceKind::Amenities => "amenities",
            ResourceKind::Notices => "notices",
            ResourceKind::Complaints => "complaints",
            ResourceKind::Events => "events",
            ResourceKind::Visitors => "visitors",
            ResourceKind::Maintenance => "maintenance",
            ResourceKind::Parking => "parking",
            ResourceKind::Employees => "employees",
            ResourceKind::CommitteeMembers => "committee-members",
        }
    }

    pub fn parse(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.segment() == segment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceVerb {
    List,
    Fetch,
    Create,
    Update,
    Patch,
    Delete,
}

impl ResourceVerb {
    fn as_str(self) -> &'static str {
        match self {
            ResourceVerb::List => "list",
            ResourceVerb::Fetch => "fetch",
            ResourceVerb::Create => "create",
            ResourceVerb::Update => "update",
            ResourceVerb::Patch => "patch",
            ResourceVerb::Delete => "delete",
        }
    }

    fn method(self) -> Method {
        match self {
            ResourceVerb::List | ResourceVerb::Fetch => Method::Get,
            ResourceVerb::Create => Method::Post,
            ResourceVerb::Update => Method::Put,
            ResourceVerb::Patch => Method::Patch,
            ResourceVerb::Delete => Method::Delete,
        }
    }

    fn needs_id(self) -> bool {
        !matches!(self, ResourceVerb::List | ResourceVerb::Create)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub verb: ResourceVerb,
}

impl ResourceKey {
    pub const fn new(kind: ResourceKind, verb: ResourceVerb) -> Self {
        Self { kind, verb }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.segment(), self.verb.as_str())
    }
}

/// Payload of a resource `request` action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceRequest {
    pub id: Option<String>,
    pub params: Vec<(String, String)>,
    pub data: Option<Value>,
    pub building_id: Option<BuildingId>,
}

impl ResourceRequest {
    pub fn list() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Scopes the request to the signed-in admin's building, if any.
    pub fn scoped(mut self, profile: &Profile) -> Self {
        self.building_id = profile.building_id.clone();
        self
    }

    pub fn to_api_request(&self, key: ResourceKey) -> Result<ApiRequest, String> {
        let mut url = format!("/{}", key.kind.segment());
        if key.verb.needs_id() {
            let id = self
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| format!("{key} requires a record id"))?;
            url.push('/');
            url.push_str(&encode_segment(id));
        }

        let mut req = ApiRequest::new(key.verb.method(), url);
        req.params = self.params.clone();
        if let Some(building) = &self.building_id {
            req = req.with_param("buildingId", building.as_str());
        }
        if let Some(data) = &self.data {
            req = req.with_data(data.clone());
        }
        Ok(req)
    }
}
