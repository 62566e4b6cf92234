//! Routes, role permissions and the navigator that turns a requested path into the
//! screen that actually renders.

use std::collections::BTreeSet;

use tracing::debug;

use crate::gate::{Admission, AuthGate};
use crate::identity::Role;
use crate::storage::SharedCredentials;

/// Authenticated views reachable from the dashboard shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteId {
    Dashboard,
    Profile,
    Students,
    Teachers,
}

impl RouteId {
    pub const ALL: [RouteId; 4] = [RouteId::Dashboard, RouteId::Profile, RouteId::Students, RouteId::Teachers];

    pub fn path(&self) -> &'static str {
        match self {
            RouteId::Dashboard => "/dashboard",
            RouteId::Profile => "/profile",
            RouteId::Students => "/estudiantes",
            RouteId::Teachers => "/profesores",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RouteId::Dashboard => "Dashboard",
            RouteId::Profile => "Profile",
            RouteId::Students => "Manage students",
            RouteId::Teachers => "Manage teachers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Root,
    View(RouteId),
}

impl Route {
    /// Match a path against the route table. `None` for anything unknown.
    pub fn parse(path: &str) -> Option<Route> {
        match normalize_path(path).as_str() {
            "/" => Some(Route::Root),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            other => RouteId::ALL.iter().copied().find(|id| id.path() == other).map(Route::View),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Root => "/",
            Route::View(id) => id.path(),
        }
    }
}

/// Canonical form used for route matching and active-entry highlighting:
/// query and fragment dropped, leading slash added, trailing slashes removed.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed.trim_start_matches('/');
    format!("/{}", trimmed)
}

pub fn is_active(current_path: &str, candidate_path: &str) -> bool {
    normalize_path(current_path) == normalize_path(candidate_path)
}

/// Views a role may open. Admins get everything; teachers and students get the
/// dashboard and their profile; an unrecognized role gets nothing.
pub fn permitted_routes(role: Role) -> BTreeSet<RouteId> {
    match role {
        Role::Admin => RouteId::ALL.iter().copied().collect(),
        Role::Teacher | Role::Student => [RouteId::Dashboard, RouteId::Profile].into_iter().collect(),
        Role::Unknown(_) => BTreeSet::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub route: RouteId,
    pub label: &'static str,
    pub active: bool,
}

/// Sidebar entries in display order, with the current one marked active.
pub fn navigation_entries(role: Role, current_path: &str) -> Vec<NavEntry> {
    let permitted = permitted_routes(role);
    [RouteId::Dashboard, RouteId::Students, RouteId::Teachers, RouteId::Profile]
        .into_iter()
        .filter(|id| permitted.contains(id))
        .map(|id| NavEntry { route: id, label: id.label(), active: is_active(current_path, id.path()) })
        .collect()
}

/// What ends up on screen after following redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    View(RouteId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landing {
    pub path: String,
    pub screen: Screen,
    /// Paths visited before landing, starting with the requested one when it redirected.
    pub redirects: Vec<String>,
}

const MAX_REDIRECTS: usize = 4;

/// Combines the auth gate with role permissions to resolve navigation requests.
#[derive(Clone)]
pub struct Navigator {
    gate: AuthGate,
}

impl Navigator {
    pub fn new(store: SharedCredentials) -> Self { Self { gate: AuthGate::new(store) } }

    pub fn gate(&self) -> &AuthGate { &self.gate }

    /// Role-aware admission on top of the gate. The dashboard is always admitted for
    /// a signed-in user so an unrecognized role still has somewhere to land.
    fn admit(&self, route: Option<Route>) -> Admission {
        let admission = self.gate.admit(route);
        if let (Admission::Render, Some(Route::View(id))) = (admission, route) {
            if id != RouteId::Dashboard {
                let role = self.gate.session().and_then(|s| s.profile).map(|p| p.role()).unwrap_or(Role::Unknown(None));
                if !permitted_routes(role).contains(&id) {
                    debug!(target: "escuela::router", "role {} may not open {}", role, id.path());
                    return Admission::Redirect(Route::View(RouteId::Dashboard));
                }
            }
        }
        admission
    }

    pub fn resolve(&self, path: &str) -> Landing {
        let mut current = normalize_path(path);
        let mut redirects = Vec::new();
        for _ in 0..=MAX_REDIRECTS {
            let route = Route::parse(&current);
            match self.admit(route) {
                Admission::Render => {
                    let screen = match route {
                        Some(Route::Login) => Screen::Login,
                        Some(Route::Register) => Screen::Register,
                        Some(Route::View(id)) => Screen::View(id),
                        // the gate never renders root or unmatched paths
                        Some(Route::Root) | None => break,
                    };
                    return Landing { path: current, screen, redirects };
                }
                Admission::Redirect(next) => {
                    redirects.push(current);
                    current = next.path().to_string();
                }
            }
        }
        Landing { path: Route::Login.path().to_string(), screen: Screen::Login, redirects }
    }
}
