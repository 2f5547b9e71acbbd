//! Static route table of the console.
//!
//! Public screens are the login and OTP entry points, optionally prefixed by a
//! building id. Everything else is private and gated on the session. Which
//! private screens a profile may open depends only on its roles.

use std::collections::BTreeSet;

use society_config::FALLBACK_ROUTE;

use crate::profile::BuildingId;
use crate::role::Role;

const SUPER_ADMIN_ROUTES: &[&str] = &["/dashboard", "/buildings", "/profile"];

const BUILDING_ADMIN_ROUTES: &[&str] = &[
    "/dashboard",
    "/building/blocks",
    "/building/floors",
    "/building/units",
    "/building/amenities",
    "/building/notices",
    "/building/complaints",
    "/building/events",
    "/building/visitors",
    "/building/maintenance",
    "/building/parking",
    "/building/employees",
    "/building/committee-members",
    "/profile",
];

/// First path segments that belong to private screens. A leading segment not
/// in this list is read as a building id.
const PRIVATE_ROOTS: &[&str] = &["dashboard", "buildings", "building", "profile"];

/// Sidebar groups whose submenu can be expanded.
const MENU_GROUPS: &[&str] = &["/building"];

pub fn visible_routes(role: Role) -> &'static [&'static str] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN_ROUTES,
        Role::BuildingAdmin => BUILDING_ADMIN_ROUTES,
    }
}

fn role_default(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => "/buildings",
        Role::BuildingAdmin => "/dashboard",
    }
}

/// Landing route for a role set: first role in priority order wins.
pub fn default_route(roles: &BTreeSet<Role>) -> &'static str {
    Role::PRIORITY
        .iter()
        .find(|role| roles.contains(role))
        .map(|role| role_default(*role))
        .unwrap_or(FALLBACK_ROUTE)
}

fn covers(route: &str, path: &str) -> bool {
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Whether any of the roles can open `path` (nested paths included).
pub fn is_reachable(path: &str, roles: &BTreeSet<Role>) -> bool {
    roles
        .iter()
        .any(|role| visible_routes(*role).iter().any(|r| covers(r, path)))
}

/// Sidebar group a path lives under, if any.
pub fn menu_group(path: &str) -> Option<&'static str> {
    MENU_GROUPS
        .iter()
        .copied()
        .find(|group| path != *group && covers(group, path))
}

pub fn login_path(tenant: Option<&BuildingId>) -> String {
    match tenant {
        Some(id) => format!("/{id}/login"),
        None => "/login".to_string(),
    }
}

pub fn otp_path(tenant: Option<&BuildingId>) -> String {
    match tenant {
        Some(id) => format!("/{id}/otp"),
        None => "/otp".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicScreen {
    Login,
    Otp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public(PublicScreen),
    Private,
    /// Matches nothing; the catch-all sends it to `/`.
    Unknown,
}

/// A parsed navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Normalized path with any building prefix removed.
    pub path: String,
    pub tenant: Option<BuildingId>,
    pub class: RouteClass,
}

fn normalize(raw: &str) -> String {
    let without_query = raw.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = without_query.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn public_screen(segment: &str) -> Option<PublicScreen> {
    match segment {
        "login" => Some(PublicScreen::Login),
        "otp" => Some(PublicScreen::Otp),
        _ => None,
    }
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let path = normalize(raw);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::private(path, None),
            [only] => {
                if let Some(screen) = public_screen(only) {
                    Self::public(screen, None)
                } else if PRIVATE_ROOTS.contains(only) {
                    Self::private(path, None)
                } else {
                    // `/{buildingId}` opens the building's console root.
                    match BuildingId::parse(only) {
                        Ok(id) => Self::private("/".into(), Some(id)),
                        Err(_) => Self::unknown(path),
                    }
                }
            }
            [first, rest @ ..] => {
                if PRIVATE_ROOTS.contains(first) {
                    return Self::private(path, None);
                }
                let Ok(tenant) = BuildingId::parse(first) else {
                    return Self::unknown(path);
                };
                if let [screen] = rest {
                    if let Some(screen) = public_screen(screen) {
                        return Self::public(screen, Some(tenant));
                    }
                }
                match rest.first() {
                    Some(root) if PRIVATE_ROOTS.contains(root) => {
                        Self::private(format!("/{}", rest.join("/")), Some(tenant))
                    }
                    _ => Self::unknown(path),
                }
            }
        }
    }

    fn public(screen: PublicScreen, tenant: Option<BuildingId>) -> Self {
        let path = match screen {
            PublicScreen::Login => "/login",
            PublicScreen::Otp => "/otp",
        };
        Self {
            path: path.to_string(),
            tenant,
            class: RouteClass::Public(screen),
        }
    }

    fn private(path: String, tenant: Option<BuildingId>) -> Self {
        Self {
            path,
            tenant,
            class: RouteClass::Private,
        }
    }

    fn unknown(path: String) -> Self {
        Self {
            path,
            tenant: None,
            class: RouteClass::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(rs: &[Role]) -> BTreeSet<Role> {
        rs.iter().copied().collect()
    }

    #[test]
    fn default_route_follows_priority() {
        assert_eq!(default_route(&roles(&[Role::BuildingAdmin])), "/dashboard");
        assert_eq!(default_route(&roles(&[Role::SuperAdmin])), "/buildings");
        assert_eq!(
            default_route(&roles(&[Role::BuildingAdmin, Role::SuperAdmin])),
            "/buildings"
        );
        assert_eq!(default_route(&roles(&[])), FALLBACK_ROUTE);
    }

    #[test]
    fn reachability_covers_nested_paths_only() {
        let admin = roles(&[Role::BuildingAdmin]);
        assert!(is_reachable("/building/units", &admin));
        assert!(is_reachable("/building/units/42", &admin));
        assert!(!is_reachable("/building/unitsx", &admin));
        assert!(!is_reachable("/buildings", &admin));
        assert!(is_reachable("/buildings/B7", &roles(&[Role::SuperAdmin])));
    }

    #[test]
    fn parses_public_entry_points() {
        let loc = Location::parse("/login");
        assert_eq!(loc.class, RouteClass::Public(PublicScreen::Login));
        assert_eq!(loc.tenant, None);

        let loc = Location::parse("/B1/otp/");
        assert_eq!(loc.class, RouteClass::Public(PublicScreen::Otp));
        assert_eq!(loc.tenant.as_ref().map(|t| t.as_str()), Some("B1"));
        assert_eq!(loc.path, "/otp");
    }

    #[test]
    fn parses_private_paths_with_and_without_tenant() {
        let loc = Location::parse("/building/units?page=2");
        assert_eq!(loc.class, RouteClass::Private);
        assert_eq!(loc.path, "/building/units");
        assert_eq!(loc.tenant, None);

        let loc = Location::parse("/B1/building/units");
        assert_eq!(loc.class, RouteClass::Private);
        assert_eq!(loc.path, "/building/units");
        assert_eq!(loc.tenant.as_ref().map(|t| t.as_str()), Some("B1"));

        let loc = Location::parse("/B1");
        assert_eq!(loc.class, RouteClass::Private);
        assert_eq!(loc.path, "/");
    }

    #[test]
    fn unmatched_paths_are_unknown() {
        assert_eq!(Location::parse("/B1/nowhere").class, RouteClass::Unknown);
        assert_eq!(Location::parse("/a b").class, RouteClass::Unknown);
    }

    #[test]
    fn menu_group_of_nested_building_screen() {
        assert_eq!(menu_group("/building/units"), Some("/building"));
        assert_eq!(menu_group("/building"), None);
        assert_eq!(menu_group("/dashboard"), None);
    }

    #[test]
    fn tenant_login_paths() {
        let b1 = BuildingId::parse("B1").unwrap();
        assert_eq!(login_path(Some(&b1)), "/B1/login");
        assert_eq!(login_path(None), "/login");
        assert_eq!(otp_path(Some(&b1)), "/B1/otp");
    }
}
