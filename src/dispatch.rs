//! Dashboard view dispatcher.
//!
//! One `ViewDispatcher` lives for one dashboard mount. It starts in `Loading`, settles
//! on the view matching the cached role, and never goes back to `Loading`.

use tracing::{debug, info};

use crate::api::{Backend, StudentAssignments, TeacherAssignments};
use crate::error::{AppError, AppResult};
use crate::identity::{Profile, Role, Session};
use crate::router::RouteId;
use crate::storage::SharedCredentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAction {
    pub label: &'static str,
    pub target: RouteId,
}

/// Administrator landing content. The figures are fixed placeholders; nothing
/// fetches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPanel {
    pub stats: Vec<StatCard>,
    pub actions: Vec<QuickAction>,
}

impl AdminPanel {
    pub fn standard() -> Self {
        Self {
            stats: vec![
                StatCard { label: "Students", value: 150 },
                StatCard { label: "Teachers", value: 25 },
                StatCard { label: "Courses", value: 45 },
            ],
            actions: vec![
                QuickAction { label: "Add student", target: RouteId::Students },
                QuickAction { label: "Add teacher", target: RouteId::Teachers },
                QuickAction { label: "Settings", target: RouteId::Profile },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    Loading,
    Teacher,
    Student,
    Admin(AdminPanel),
    /// Signed in, but the cached role id is missing or not one we know.
    Unknown { role_id: Option<i64> },
}

impl DashboardView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => DashboardView::Admin(AdminPanel::standard()),
            Role::Teacher => DashboardView::Teacher,
            Role::Student => DashboardView::Student,
            Role::Unknown(role_id) => DashboardView::Unknown { role_id },
        }
    }

    pub fn is_terminal(&self) -> bool { !matches!(self, DashboardView::Loading) }
}

pub struct ViewDispatcher {
    store: SharedCredentials,
    view: DashboardView,
    profile: Option<Profile>,
}

impl ViewDispatcher {
    pub fn new(store: SharedCredentials) -> Self {
        Self { store, view: DashboardView::Loading, profile: None }
    }

    pub fn view(&self) -> &DashboardView { &self.view }

    pub fn profile(&self) -> Option<&Profile> { self.profile.as_ref() }

    /// Read the cached session and settle on a view. Stays in `Loading` while no
    /// session is available; once settled, further calls change nothing.
    pub fn mount(&mut self) -> &DashboardView {
        if self.view.is_terminal() {
            return &self.view;
        }
        let session = match self.store.load() {
            Ok(Some(s)) if s.has_token() => s,
            Ok(_) => return &self.view,
            Err(e) => {
                debug!(target: "escuela::dispatch", "no session yet: {}", e);
                return &self.view;
            }
        };
        let role = session.profile.as_ref().map(Profile::role).unwrap_or(Role::Unknown(None));
        info!(target: "escuela::dispatch", "dashboard mounted for role {}", role);
        self.profile = session.profile;
        self.view = DashboardView::for_role(role);
        &self.view
    }
}

/// Role-specific data shown inside the teacher and student dashboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleData {
    Teacher(TeacherAssignments),
    Student(StudentAssignments),
}

/// Fetch the assignment view for the session's role. Other roles have nothing to load.
pub async fn load_role_data(backend: &dyn Backend, session: &Session) -> AppResult<Option<RoleData>> {
    if !session.has_token() {
        return Err(AppError::auth("no_session", "No authentication token. Please sign in again."));
    }
    let role = session.profile.as_ref().map(Profile::role).unwrap_or(Role::Unknown(None));
    match role {
        Role::Teacher => Ok(Some(RoleData::Teacher(backend.teacher_assignments(&session.token).await?))),
        Role::Student => Ok(Some(RoleData::Student(backend.student_assignments(&session.token).await?))),
        Role::Admin | Role::Unknown(_) => Ok(None),
    }
}
