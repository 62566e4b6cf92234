//! Route admission, role permissions and the dashboard dispatcher over a durable
//! store, plus shell-level navigation against the mock backend.

mod common;

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use reqwest::Url;
use tempfile::tempdir;

use escuela::api::HttpBackend;
use escuela::cli::{Command, Flow, Prompter, Shell};
use escuela::dispatch::{DashboardView, ViewDispatcher};
use escuela::error::{AppError, AppResult};
use escuela::identity::{Profile, Session};
use escuela::router::{Navigator, RouteId, Screen};
use escuela::storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore, SharedCredentials};

use common::*;

/// Answers prompts from a fixed script.
struct Script(VecDeque<String>);

impl Script {
    fn new(answers: &[&str]) -> Self { Self(answers.iter().map(|s| s.to_string()).collect()) }
}

impl Prompter for Script {
    fn ask(&mut self, label: &str) -> AppResult<String> {
        self.0.pop_front().ok_or_else(|| AppError::invalid_field("input", format!("unexpected prompt '{}'", label).as_str()))
    }
}

fn session(role_id: Option<i64>) -> Session {
    let profile = Profile { name: Some("Ana".into()), role_id, ..Default::default() };
    Session::new("tok", Some("bearer".into()), Some(profile))
}

#[test]
fn catch_all_follows_authentication_state() -> Result<()> {
    let dir = tempdir()?;
    let store: SharedCredentials = Arc::new(FileCredentialStore::open(dir.path(), "default")?);
    let nav = Navigator::new(store.clone());

    let out = nav.resolve("/no/such/page");
    assert_eq!(out.path, "/login");
    assert_eq!(out.screen, Screen::Login);
    assert!(!nav.gate().is_authenticated());

    store.save(&session(Some(2)))?;
    assert!(nav.gate().is_authenticated());
    let out = nav.resolve("/no/such/page");
    assert_eq!(out.path, "/dashboard");
    assert_eq!(nav.resolve("/login").screen, Screen::View(RouteId::Dashboard));
    assert_eq!(nav.resolve("/register").screen, Screen::View(RouteId::Dashboard));
    assert_eq!(nav.resolve("/").path, "/dashboard");

    store.clear()?;
    assert!(!nav.gate().is_authenticated());
    assert_eq!(nav.resolve("/profile").screen, Screen::Login);
    Ok(())
}

#[test]
fn blank_token_counts_as_signed_out() -> Result<()> {
    let store = Arc::new(MemoryCredentialStore::with_session(Session::new("  ", None, None)));
    let nav = Navigator::new(store);
    assert!(!nav.gate().is_authenticated());
    assert_eq!(nav.resolve("/dashboard").screen, Screen::Login);
    Ok(())
}

#[test]
fn store_round_trip_keeps_every_field() -> Result<()> {
    let dir = tempdir()?;
    let store = FileCredentialStore::open(dir.path(), "round/trip")?;
    let full = Session::new(
        "abc.def",
        Some("bearer".into()),
        Some(Profile {
            name: Some("María".into()),
            surname: Some("González".into()),
            email: Some("maria@escuela.com".into()),
            role_name: Some("Profesor".into()),
            role_id: Some(1),
            phone: Some("555".into()),
            address: Some("Calle 1".into()),
        }),
    );
    store.save(&full)?;
    assert_eq!(store.load()?, Some(full));
    assert!(store.document_path().starts_with(dir.path()));
    Ok(())
}

#[test]
fn dispatcher_per_role() {
    let view = |role_id| ViewDispatcher::new(Arc::new(MemoryCredentialStore::with_session(session(role_id)))).mount().clone();
    assert_eq!(view(Some(1)), DashboardView::Teacher);
    assert_eq!(view(Some(2)), DashboardView::Student);
    assert!(matches!(view(Some(3)), DashboardView::Admin(_)));
    assert_eq!(view(Some(0)), DashboardView::Unknown { role_id: Some(0) });
    assert_eq!(view(Some(4)), DashboardView::Unknown { role_id: Some(4) });
}

fn shell(base: &str, store: SharedCredentials) -> Shell {
    let api = Arc::new(HttpBackend::new(Url::parse(base).expect("base url")).expect("http backend"));
    Shell::new(api, store)
}

#[tokio::test]
async fn shell_walks_through_a_student_session() -> Result<()> {
    let (base, _mock) = spawn_backend().await;
    let store = MemoryCredentialStore::shared();
    let mut sh = shell(&base, store.clone());
    assert_eq!(sh.landing().screen, Screen::Login);

    let mut none = Script::new(&[]);
    sh.execute(Command::Login { identifier: STUDENT_EMAIL.into(), secret: Some(PASSWORD.into()) }, &mut none).await?;
    assert_eq!(sh.landing().screen, Screen::View(RouteId::Dashboard));

    // students may not open the teacher roster
    sh.execute("go /profesores".parse()?, &mut none).await?;
    assert_eq!(sh.landing().path, "/dashboard");
    sh.execute("teachers list".parse()?, &mut none).await?;
    assert_eq!(sh.landing().path, "/dashboard");

    sh.execute("profile set phone 555-1234".parse()?, &mut none).await?;
    assert_eq!(sh.landing().path, "/profile");
    assert_eq!(store.load()?.and_then(|s| s.profile).and_then(|p| p.phone).as_deref(), Some("555-1234"));

    sh.execute(Command::Logout, &mut none).await?;
    assert_eq!(sh.landing().screen, Screen::Login);
    assert_eq!(store.load()?, None);
    assert_eq!(sh.execute(Command::Quit, &mut none).await?, Flow::Quit);
    Ok(())
}

#[tokio::test]
async fn shell_prompts_for_password_and_admin_manages_students() -> Result<()> {
    let (base, mock) = spawn_backend().await;
    let store = MemoryCredentialStore::shared();
    let mut sh = shell(&base, store.clone());

    let mut script = Script::new(&[PASSWORD]);
    sh.execute("login admin@escuela.com".parse()?, &mut script).await?;
    assert_eq!(sh.landing().screen, Screen::View(RouteId::Dashboard));

    let mut script = Script::new(&["Luis", "Mora", "luis@escuela.com", "14", "Calle 2"]);
    sh.execute("students add".parse()?, &mut script).await?;
    assert_eq!(sh.landing().path, "/estudiantes");
    assert_eq!(mock.students.lock().len(), 1);

    // blank answers keep the current values
    let mut script = Script::new(&["Luisa", "", "", "", ""]);
    sh.execute("students edit 1".parse()?, &mut script).await?;
    let row = mock.students.lock()[0].clone();
    assert_eq!(row["nombre"], "Luisa");
    assert_eq!(row["correo"], "luis@escuela.com");
    assert_eq!(row["edad"], 14);

    sh.execute("students rm 1".parse()?, &mut Script::new(&[])).await?;
    assert!(mock.students.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn shell_registration_returns_to_login() -> Result<()> {
    let (base, mock) = spawn_backend().await;
    let mut sh = shell(&base, MemoryCredentialStore::shared());

    let mut script = Script::new(&["Ana", "Ruiz", "ana@escuela.com", "secret1", "secret1", "teacher", "Historia"]);
    sh.execute(Command::Register, &mut script).await?;
    assert_eq!(sh.landing().screen, Screen::Login);
    let sent = mock.registrations.lock()[0].clone();
    assert_eq!(sent["rol_id"], 1);
    assert_eq!(sent["especialidad"], "Historia");

    // a failing form stays on the registration screen and sends nothing
    let before = mock.hits();
    let mut script = Script::new(&["A", "Ruiz", "ana@escuela.com", "secret1", "secret1", "student"]);
    sh.execute(Command::Register, &mut script).await?;
    assert_eq!(sh.landing().screen, Screen::Register);
    assert_eq!(mock.hits(), before);
    assert!(sh.controller().state().field_errors.contains_key("name"));

    // the admin role is not offered for sign-up
    let mut script = Script::new(&["Eve", "Ruiz", "eve@escuela.com", "secret1", "secret1", "admin"]);
    sh.execute(Command::Register, &mut script).await?;
    assert_eq!(sh.landing().screen, Screen::Register);
    assert_eq!(mock.hits(), before);
    assert!(sh.controller().state().field_errors.contains_key("role"));
    assert_eq!(mock.registrations.lock().len(), 1);
    Ok(())
}
