//! Session controller: login, registration, logout and the cached profile.
//!
//! Each operation catches failures at its boundary, records a user-facing message
//! in `FormState`, and still returns the typed error so callers can branch on it.
//! Credentials are written to the store before a navigation target is returned.

use tracing::{info, warn};

use crate::api::SharedBackend;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::identity::{Profile, ProfileEdit, Session};
use crate::router::{Route, RouteId};
use crate::storage::SharedCredentials;
use crate::tprintln;
use crate::validate::{self, RegistrationForm};

const LOGIN_FALLBACK: &str = "Login failed";
const REGISTER_FALLBACK: &str = "Unknown error";
pub const NOTICE_SIGNED_UP: &str = "Registration successful! Your account has been created.";
pub const NOTICE_CAN_SIGN_IN: &str = "Registration successful! You can now sign in.";
pub const NOTICE_PROFILE_REFRESHED: &str = "Profile refreshed from the server.";
pub const NOTICE_PROFILE_LOCAL: &str = "Profile updated locally. The server has no profile update endpoint.";

/// Transient UI flags of the login/registration/profile screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub field_errors: FieldErrors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub session: Session,
    pub navigate_to: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The backend issued a token; the user is signed in.
    SignedIn { session: Session, navigate_to: Route },
    /// Account created, user must sign in.
    Confirmed { notice: String, navigate_to: Route },
}

impl RegisterOutcome {
    pub fn navigate_to(&self) -> Route {
        match self {
            RegisterOutcome::SignedIn { navigate_to, .. } | RegisterOutcome::Confirmed { navigate_to, .. } => *navigate_to,
        }
    }
}

pub struct SessionController {
    backend: SharedBackend,
    store: SharedCredentials,
    state: FormState,
}

impl SessionController {
    pub fn new(backend: SharedBackend, store: SharedCredentials) -> Self {
        Self { backend, store, state: FormState::default() }
    }

    pub fn state(&self) -> &FormState { &self.state }

    pub fn dismiss_notice(&mut self) { self.state.notice = None; }

    /// Any keystroke in a form field clears the previous error message.
    pub fn input_edited(&mut self) { self.state.error = None; }

    fn signed_in_session(&self) -> AppResult<Session> {
        self.store
            .load()?
            .filter(|s| s.has_token())
            .ok_or_else(|| AppError::auth("no_session", "No authentication token. Please sign in again."))
    }

    pub async fn login(&mut self, identifier: &str, secret: &str) -> AppResult<LoginOutcome> {
        self.state.error = None;
        self.state.field_errors.clear();
        if let Err(e) = validate::check_login(identifier, secret) {
            self.state.error = Some(e.message().to_string());
            self.state.field_errors = e.field_errors();
            return Err(e);
        }

        self.state.loading = true;
        let result = self.backend.login(identifier, secret).await;
        self.state.loading = false;

        let grant = match result {
            Ok(g) if !g.access_token.trim().is_empty() => g,
            Ok(_) => {
                let e = AppError::parse("missing_token", "login response carried no access token");
                self.state.error = Some(e.user_message());
                return Err(e);
            }
            Err(e) => {
                warn!(target: "escuela::session", "login failed for '{}': {}", identifier, e);
                self.state.error = Some(e.user_message_or(LOGIN_FALLBACK));
                return Err(e);
            }
        };

        let session = Session::new(grant.access_token, grant.token_type, grant.user);
        if let Err(e) = self.store.save(&session) {
            self.state.error = Some(e.user_message());
            return Err(e);
        }
        info!(target: "escuela::session", "signed in '{}' (profile cached: {})", identifier, session.profile.is_some());
        tprintln!("session.login user={} token_type={}", identifier, session.token_type);
        Ok(LoginOutcome { session, navigate_to: Route::View(RouteId::Dashboard) })
    }

    pub async fn register(&mut self, form: &RegistrationForm) -> AppResult<RegisterOutcome> {
        self.state.error = None;
        self.state.notice = None;
        self.state.field_errors.clear();
        let request = match form.validate().and_then(|_| form.to_request()) {
            Ok(r) => r,
            Err(e) => {
                self.state.field_errors = e.field_errors();
                return Err(e);
            }
        };

        self.state.loading = true;
        let result = self.backend.register(&request).await;
        self.state.loading = false;

        let receipt = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "escuela::session", "registration failed for '{}': {}", request.email, e);
                self.state.error = Some(e.user_message_or(REGISTER_FALLBACK));
                return Err(e);
            }
        };

        match receipt.access_token.filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                let profile = Profile {
                    name: Some(request.name.clone()),
                    surname: Some(request.surname.clone()),
                    email: Some(request.email.clone()),
                    role_name: Some(form.role.label().to_string()),
                    role_id: Some(request.rol_id),
                    ..Default::default()
                };
                let session = Session::new(token, receipt.token_type, Some(profile));
                if let Err(e) = self.store.save(&session) {
                    self.state.error = Some(e.user_message());
                    return Err(e);
                }
                info!(target: "escuela::session", "registered and signed in '{}'", request.email);
                self.state.notice = Some(NOTICE_SIGNED_UP.to_string());
                Ok(RegisterOutcome::SignedIn { session, navigate_to: Route::View(RouteId::Profile) })
            }
            None => {
                info!(target: "escuela::session", "registered '{}', sign-in required", request.email);
                self.state.notice = Some(NOTICE_CAN_SIGN_IN.to_string());
                Ok(RegisterOutcome::Confirmed { notice: NOTICE_CAN_SIGN_IN.to_string(), navigate_to: Route::Login })
            }
        }
    }

    /// Forget the session. Local only; the backend is never told.
    pub fn logout(&mut self) -> AppResult<Route> {
        self.state = FormState::default();
        self.store.clear()?;
        info!(target: "escuela::session", "signed out");
        Ok(Route::Login)
    }

    /// Pull `/auth/profile` and merge it into the cached profile. On failure the
    /// cached profile is left as it was.
    pub async fn refresh_profile(&mut self) -> AppResult<Profile> {
        self.state.error = None;
        self.state.notice = None;
        let session = match self.signed_in_session() {
            Ok(s) => s,
            Err(e) => {
                self.state.error = Some(e.user_message());
                return Err(e);
            }
        };

        self.state.loading = true;
        let result = self.backend.profile(&session.token).await;
        self.state.loading = false;

        match result {
            Ok(fresh) => {
                let mut profile = session.profile.clone().unwrap_or_default();
                profile.merge(fresh);
                let updated = Session { profile: Some(profile.clone()), ..session };
                self.store.save(&updated)?;
                self.state.notice = Some(NOTICE_PROFILE_REFRESHED.to_string());
                Ok(profile)
            }
            Err(e) => {
                warn!(target: "escuela::session", "profile refresh failed, keeping cached data: {}", e);
                self.state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn update_profile_locally(&mut self, edit: ProfileEdit) -> AppResult<Profile> {
        let session = self.signed_in_session()?;
        let mut profile = session.profile.clone().unwrap_or_default();
        profile.apply(edit);
        self.store.save(&Session { profile: Some(profile.clone()), ..session })?;
        self.state.notice = Some(NOTICE_PROFILE_LOCAL.to_string());
        Ok(profile)
    }
}
