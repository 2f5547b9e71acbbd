use society_core::NavigationState;

use crate::domain::{RootState, SessionPhase, SessionState};

use super::actions::{Action, NavigationAction, SessionAction, SlicePhase};

pub fn reduce(mut state: RootState, action: &Action) -> RootState {
    match action {
        Action::SendOtp(phase) => {
            let landed = state.send_otp.apply(phase, |d| Some(d.clone()));
            if let (true, SlicePhase::Success(dispatched)) = (landed, phase) {
                if !state.session.is_authenticated() {
                    state.session.phase = SessionPhase::OtpPending {
                        phone: dispatched.phone.clone(),
                        tenant: dispatched.tenant.clone(),
                    };
                }
            }
        }

        Action::VerifyOtp(phase) => {
            state.verify_otp.apply(phase, |login| Some(login.clone()));
        }

        Action::Resource(key, phase) => {
            state
                .resources
                .entry(*key)
                .or_default()
                .apply(phase, |data| data.clone());
        }

        // Logout wipes every slice, not just the session.
        Action::Session(SessionAction::LoggedOut) => return RootState::default(),

        Action::Session(ev) => apply_session(&mut state.session, ev),

        Action::Navigation(ev) => apply_navigation(&mut state.navigation, ev),
    }
    state
}

fn apply_session(session: &mut SessionState, ev: &SessionAction) {
    match ev {
        SessionAction::OtpFlowRestored { phone, tenant } => {
            if !session.is_authenticated() {
                session.phase = SessionPhase::OtpPending {
                    phone: phone.clone(),
                    tenant: tenant.clone(),
                };
            }
        }
        SessionAction::OtpFlowAbandoned => {
            if !session.is_authenticated() {
                session.phase = SessionPhase::Anonymous;
            }
        }
        SessionAction::Authenticated(profile) => {
            session.phase = SessionPhase::Authenticated;
            session.user = Some(profile.clone());
        }
        SessionAction::ProfileUpdated(profile) => {
            if session.is_authenticated() {
                session.user = Some(profile.clone());
            }
        }
        SessionAction::LoggedOut => *session = SessionState::default(),
    }
}

fn apply_navigation(nav: &mut NavigationState, ev: &NavigationAction) {
    match ev {
        NavigationAction::Restored(restored) => *nav = restored.clone(),
        NavigationAction::RouteChanged(path) => nav.visit(path),
        NavigationAction::MenuToggled(group) => {
            nav.toggle_menu(group);
        }
    }
}
