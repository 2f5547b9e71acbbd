//! Decides what a navigation target renders, given the session.

use society_core::routes::{default_route, is_reachable, login_path, otp_path, PublicScreen};
use society_core::{Location, RouteClass};

use crate::domain::SessionState;

/// Redirect chains are short (unknown -> `/` -> default); anything longer is a
/// routing bug.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Mount the screen at this canonical path.
    Render(String),
    Redirect(String),
}

/// One guard step for `raw_path`.
pub fn check(session: &SessionState, raw_path: &str) -> GuardDecision {
    let location = Location::parse(raw_path);
    let tenant = location.tenant.as_ref();

    match (location.class, session.user.as_ref()) {
        (RouteClass::Unknown, _) => GuardDecision::Redirect("/".into()),

        // Signed in users never see the login screens.
        (RouteClass::Public(_), Some(user)) if session.is_authenticated() => {
            GuardDecision::Redirect(default_route(&user.roles).into())
        }
        (RouteClass::Public(PublicScreen::Otp), _) if session.pending_otp().is_none() => {
            GuardDecision::Redirect(login_path(tenant))
        }
        (RouteClass::Public(PublicScreen::Login), _) => GuardDecision::Render(login_path(tenant)),
        (RouteClass::Public(PublicScreen::Otp), _) => GuardDecision::Render(otp_path(tenant)),

        (RouteClass::Private, Some(user)) if session.is_authenticated() => {
            if location.path == "/" || !is_reachable(&location.path, &user.roles) {
                GuardDecision::Redirect(default_route(&user.roles).into())
            } else {
                GuardDecision::Render(location.path)
            }
        }
        (RouteClass::Private, _) => GuardDecision::Redirect(login_path(tenant)),
    }
}

/// Follows redirects until a screen renders. Returns the rendered path.
pub fn resolve(session: &SessionState, raw_path: &str) -> String {
    let mut target = raw_path.to_string();
    for _ in 0..MAX_REDIRECTS {
        match check(session, &target) {
            GuardDecision::Render(path) => return path,
            GuardDecision::Redirect(next) => target = next,
        }
    }
    tracing::warn!("redirect loop starting at {raw_path}; stopping at {target}");
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionPhase;
    use society_core::{BuildingId, PhoneNumber, Profile, Role, Tenant};

    fn signed_in(roles: &[Role]) -> SessionState {
        SessionState {
            phase: SessionPhase::Authenticated,
            user: Some(Profile {
                id: "u1".into(),
                name: "Asha".into(),
                roles: roles.iter().copied().collect(),
                building_id: None,
            }),
        }
    }

    fn otp_pending() -> SessionState {
        SessionState {
            phase: SessionPhase::OtpPending {
                phone: PhoneNumber::parse("9876543210").unwrap(),
                tenant: Tenant::Building(BuildingId::parse("B1").unwrap()),
            },
            user: None,
        }
    }

    #[test]
    fn anonymous_private_access_keeps_tenant_in_login_redirect() {
        let anon = SessionState::default();
        assert_eq!(
            check(&anon, "/B1/building/units"),
            GuardDecision::Redirect("/B1/login".into())
        );
        assert_eq!(
            check(&anon, "/dashboard"),
            GuardDecision::Redirect("/login".into())
        );
        assert_eq!(resolve(&anon, "/B1"), "/B1/login");
    }

    #[test]
    fn authenticated_never_renders_public_screens() {
        let admin = signed_in(&[Role::BuildingAdmin]);
        for path in ["/login", "/otp", "/B1/login", "/B1/otp"] {
            assert_eq!(
                check(&admin, path),
                GuardDecision::Redirect("/dashboard".into()),
                "{path}"
            );
        }
        assert_eq!(resolve(&signed_in(&[Role::SuperAdmin]), "/login"), "/buildings");
    }

    #[test]
    fn role_gates_private_screens() {
        let admin = signed_in(&[Role::BuildingAdmin]);
        assert_eq!(
            check(&admin, "/building/units"),
            GuardDecision::Render("/building/units".into())
        );
        assert_eq!(
            check(&admin, "/buildings"),
            GuardDecision::Redirect("/dashboard".into())
        );
        assert_eq!(resolve(&admin, "/"), "/dashboard");
    }

    #[test]
    fn otp_screen_needs_pending_flow() {
        assert_eq!(
            check(&SessionState::default(), "/B1/otp"),
            GuardDecision::Redirect("/B1/login".into())
        );
        assert_eq!(
            check(&otp_pending(), "/B1/otp"),
            GuardDecision::Render("/B1/otp".into())
        );
    }

    #[test]
    fn unknown_paths_fall_back_to_root() {
        assert_eq!(
            check(&SessionState::default(), "/B1/nowhere"),
            GuardDecision::Redirect("/".into())
        );
        assert_eq!(resolve(&signed_in(&[Role::SuperAdmin]), "/B1/nowhere"), "/buildings");
        assert_eq!(resolve(&SessionState::default(), "/a b"), "/login");
    }
}
