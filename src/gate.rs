//! Authentication guard consulted on every navigation.

use tracing::warn;

use crate::identity::Session;
use crate::router::{Route, RouteId};
use crate::storage::SharedCredentials;

/// Outcome of asking the gate whether a route may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Render,
    Redirect(Route),
}

#[derive(Clone)]
pub struct AuthGate {
    store: SharedCredentials,
}

impl AuthGate {
    pub fn new(store: SharedCredentials) -> Self { Self { store } }

    /// Current session when it carries a non-empty token. An unreadable store counts
    /// as signed out.
    pub fn session(&self) -> Option<Session> {
        match self.store.load() {
            Ok(s) => s.filter(|s| s.has_token()),
            Err(e) => {
                warn!(target: "escuela::gate", "credential store unreadable: {}", e);
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool { self.session().is_some() }

    /// Guard decision for `route`; `None` means the path matched no route.
    pub fn admit(&self, route: Option<Route>) -> Admission {
        let authed = self.is_authenticated();
        match route {
            None => Admission::Redirect(Route::View(RouteId::Dashboard)),
            Some(Route::Login) | Some(Route::Register) => {
                if authed { Admission::Redirect(Route::View(RouteId::Dashboard)) } else { Admission::Render }
            }
            Some(Route::Root) => {
                if authed { Admission::Redirect(Route::View(RouteId::Dashboard)) } else { Admission::Redirect(Route::Login) }
            }
            Some(Route::View(_)) => {
                if authed { Admission::Render } else { Admission::Redirect(Route::Login) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CredentialStore, MemoryCredentialStore};
    use std::sync::Arc;

    fn gate_with(session: Option<Session>) -> AuthGate {
        let store = MemoryCredentialStore::new();
        if let Some(s) = session { store.save(&s).unwrap(); }
        AuthGate::new(Arc::new(store))
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        assert!(!gate_with(None).is_authenticated());
        assert!(!gate_with(Some(Session::new("", None, None))).is_authenticated());
        assert!(!gate_with(Some(Session::new("   ", None, None))).is_authenticated());
        assert!(gate_with(Some(Session::new("t", None, None))).is_authenticated());
    }

    #[test]
    fn protected_views_redirect_to_login_when_signed_out() {
        let gate = gate_with(None);
        for id in [RouteId::Dashboard, RouteId::Profile, RouteId::Students, RouteId::Teachers] {
            assert_eq!(gate.admit(Some(Route::View(id))), Admission::Redirect(Route::Login));
        }
        assert_eq!(gate.admit(Some(Route::Login)), Admission::Render);
        assert_eq!(gate.admit(Some(Route::Register)), Admission::Render);
        assert_eq!(gate.admit(Some(Route::Root)), Admission::Redirect(Route::Login));
    }

    #[test]
    fn login_and_register_bounce_when_signed_in() {
        let gate = gate_with(Some(Session::new("t", None, None)));
        let dash = Admission::Redirect(Route::View(RouteId::Dashboard));
        assert_eq!(gate.admit(Some(Route::Login)), dash);
        assert_eq!(gate.admit(Some(Route::Register)), dash);
        assert_eq!(gate.admit(Some(Route::Root)), dash);
        assert_eq!(gate.admit(Some(Route::View(RouteId::Profile))), Admission::Render);
    }

    #[test]
    fn unmatched_paths_go_to_dashboard() {
        assert_eq!(gate_with(None).admit(None), Admission::Redirect(Route::View(RouteId::Dashboard)));
    }

    #[test]
    fn clear_revokes_immediately() {
        let store = Arc::new(MemoryCredentialStore::with_session(Session::new("t", None, None)));
        let gate = AuthGate::new(store.clone());
        assert!(gate.is_authenticated());
        store.clear().unwrap();
        assert!(!gate.is_authenticated());
    }
}
