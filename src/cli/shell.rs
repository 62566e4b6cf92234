//! Interactive shell.
//!
//! The shell stands in for the browser: it keeps a current path, sends every screen
//! change through `Navigator::resolve`, and prints whatever screen the user lands on.

use std::str::FromStr;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::api::{SharedBackend, Student, Teacher};
use crate::cli::outputformatter::Table;
use crate::controller::SessionController;
use crate::dispatch::{load_role_data, DashboardView, RoleData, ViewDispatcher};
use crate::error::{AppError, AppResult};
use crate::identity::{ProfileEdit, Role};
use crate::roster::{StudentRoster, TeacherRoster};
use crate::router::{navigation_entries, Landing, Navigator, Route, RouteId, Screen};
use crate::storage::SharedCredentials;
use crate::validate::{RegistrationForm, StudentForm, TeacherForm, FIELD_ROLE};

pub const HELP: &str = "Commands:
  login <email> [password]        sign in (prompts for the password when omitted)
  register                        create an account (prompts for each field)
  logout                          forget the stored session
  go <path>                       open a path, e.g. /dashboard, /estudiantes, /profile
  nav                             show the navigation entries for your role
  status                          show session and current screen
  profile [refresh]               show the profile, or reload it from the server
  profile set <field> <value>     edit name, surname, phone or address locally
  students [list|add|edit <id>|rm <id>]
  teachers [list|add|edit <id>|rm <id>]
  assignments                     your subjects (students) or courses (teachers)
  help                            show this help
  quit | exit                     leave the shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Students,
    Teachers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterAction {
    List,
    Add,
    Edit(i64),
    Remove(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    Show,
    Refresh,
    Set { field: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { identifier: String, secret: Option<String> },
    Register,
    Logout,
    Go(String),
    Nav,
    Status,
    Profile(ProfileAction),
    Roster(Entity, RosterAction),
    Assignments,
    Help,
    Quit,
}

fn usage(msg: &str) -> AppError { AppError::invalid_field("command", msg) }

fn parse_id(raw: Option<&str>) -> AppResult<i64> {
    raw.and_then(|s| s.parse::<i64>().ok()).ok_or_else(|| usage("expected a numeric id"))
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(line: &str) -> AppResult<Command> {
        let mut parts = line.split_whitespace();
        let head = parts.next().ok_or_else(|| usage("empty command"))?.to_ascii_lowercase();
        let cmd = match head.as_str() {
            "login" => {
                let identifier = parts.next().ok_or_else(|| usage("usage: login <email> [password]"))?.to_string();
                Command::Login { identifier, secret: parts.next().map(str::to_string) }
            }
            "register" => Command::Register,
            "logout" => Command::Logout,
            "go" | "open" => Command::Go(parts.next().ok_or_else(|| usage("usage: go <path>"))?.to_string()),
            "nav" => Command::Nav,
            "status" => Command::Status,
            "profile" => match parts.next() {
                None => Command::Profile(ProfileAction::Show),
                Some("refresh") => Command::Profile(ProfileAction::Refresh),
                Some("set") => {
                    let field = parts.next().ok_or_else(|| usage("usage: profile set <field> <value>"))?.to_string();
                    let value = parts.collect::<Vec<_>>().join(" ");
                    Command::Profile(ProfileAction::Set { field, value })
                }
                Some(other) => return Err(usage(format!("unknown profile action '{}'", other).as_str())),
            },
            "students" | "estudiantes" | "teachers" | "profesores" => {
                let entity = if head == "students" || head == "estudiantes" { Entity::Students } else { Entity::Teachers };
                let action = match parts.next() {
                    None | Some("list") => RosterAction::List,
                    Some("add") => RosterAction::Add,
                    Some("edit") => RosterAction::Edit(parse_id(parts.next())?),
                    Some("rm") | Some("delete") => RosterAction::Remove(parse_id(parts.next())?),
                    Some(other) => return Err(usage(format!("unknown action '{}'", other).as_str())),
                };
                Command::Roster(entity, action)
            }
            "assignments" => Command::Assignments,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(usage(format!("unknown command '{}'; type 'help'", other).as_str())),
        };
        Ok(cmd)
    }
}

/// Source of answers for interactive prompts.
pub trait Prompter {
    fn ask(&mut self, label: &str) -> AppResult<String>;
}

/// Prompts on the same line editor the REPL reads commands from.
struct EditorPrompter<'a>(&'a mut DefaultEditor);

impl Prompter for EditorPrompter<'_> {
    fn ask(&mut self, label: &str) -> AppResult<String> {
        self.0
            .readline(&format!("  {}: ", label))
            .map_err(|e| AppError::invalid_field("input", format!("prompt aborted: {}", e).as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    backend: SharedBackend,
    store: SharedCredentials,
    navigator: Navigator,
    controller: SessionController,
    students: StudentRoster,
    teachers: TeacherRoster,
    landing: Landing,
}

fn keep(answer: String, current: &str) -> String {
    if answer.trim().is_empty() { current.to_string() } else { answer }
}

fn print_error(e: &AppError) {
    let fields = e.field_errors();
    if fields.is_empty() {
        eprintln!("error: {}", e.user_message());
    } else {
        for (field, msg) in fields {
            eprintln!("  {}: {}", field, msg);
        }
    }
}

impl Shell {
    pub fn new(backend: SharedBackend, store: SharedCredentials) -> Self {
        let navigator = Navigator::new(store.clone());
        let landing = navigator.resolve(Route::Root.path());
        Self {
            controller: SessionController::new(backend.clone(), store.clone()),
            students: StudentRoster::new(backend.clone(), store.clone()),
            teachers: TeacherRoster::new(backend.clone(), store.clone()),
            backend,
            store,
            navigator,
            landing,
        }
    }

    pub fn landing(&self) -> &Landing { &self.landing }

    pub fn controller(&self) -> &SessionController { &self.controller }

    fn role(&self) -> Role {
        self.navigator
            .gate()
            .session()
            .and_then(|s| s.profile)
            .map(|p| p.role())
            .unwrap_or(Role::Unknown(None))
    }

    /// Resolve `path` and make the result the current screen. Does not print.
    pub fn navigate(&mut self, path: &str) -> &Landing {
        self.landing = self.navigator.resolve(path);
        if !self.landing.redirects.is_empty() {
            debug!(target: "escuela::shell", "{} redirected to {}", path, self.landing.path);
        }
        &self.landing
    }

    pub fn prompt(&self) -> String { format!("escuela {}> ", self.landing.path) }

    pub async fn execute(&mut self, cmd: Command, prompter: &mut dyn Prompter) -> AppResult<Flow> {
        match cmd {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => println!("{}", HELP),
            Command::Login { identifier, secret } => self.login(&identifier, secret, prompter).await?,
            Command::Register => self.register(prompter).await?,
            Command::Logout => {
                let target = self.controller.logout()?;
                println!("signed out");
                self.open(target.path()).await;
            }
            Command::Go(path) => self.open(&path).await,
            Command::Nav => {
                for entry in navigation_entries(self.role(), &self.landing.path) {
                    println!("{} {:<10} {}", if entry.active { "*" } else { " " }, entry.label, entry.route.path());
                }
            }
            Command::Status => self.status(),
            Command::Profile(action) => self.profile(action).await?,
            Command::Roster(entity, action) => self.roster(entity, action, prompter).await?,
            Command::Assignments => self.assignments().await?,
        }
        Ok(Flow::Continue)
    }

    /// Navigate and print the landing screen.
    async fn open(&mut self, path: &str) {
        let screen = self.navigate(path).screen;
        if self.landing.path != crate::router::normalize_path(path) {
            println!("-> {}", self.landing.path);
        }
        match screen {
            Screen::Login => println!("Sign in: login <email> [password]   (no account? go /register)"),
            Screen::Register => println!("Create an account: register"),
            Screen::View(RouteId::Dashboard) => self.show_dashboard().await,
            Screen::View(RouteId::Profile) => self.show_profile(),
            Screen::View(RouteId::Students) => self.list_students().await,
            Screen::View(RouteId::Teachers) => self.list_teachers().await,
        }
    }

    async fn login(&mut self, identifier: &str, secret: Option<String>, prompter: &mut dyn Prompter) -> AppResult<()> {
        if self.navigate(Route::Login.path()).screen != Screen::Login {
            println!("already signed in; use 'logout' first");
            return Ok(());
        }
        let secret = match secret {
            Some(s) => s,
            None => prompter.ask("password")?,
        };
        match self.controller.login(identifier, &secret).await {
            Ok(outcome) => {
                println!("welcome, {}", outcome.session.profile.as_ref().map(|p| p.display_name()).unwrap_or("User"));
                self.open(outcome.navigate_to.path()).await;
            }
            Err(_) => {
                eprintln!("error: {}", self.controller.state().error.as_deref().unwrap_or("Login failed"));
                self.controller.input_edited();
            }
        }
        Ok(())
    }

    async fn register(&mut self, prompter: &mut dyn Prompter) -> AppResult<()> {
        if self.navigate(Route::Register.path()).screen != Screen::Register {
            println!("already signed in; use 'logout' first");
            return Ok(());
        }
        let name = prompter.ask("name")?;
        let surname = prompter.ask("surname")?;
        let email = prompter.ask("email")?;
        let password = prompter.ask("password")?;
        let confirm_password = prompter.ask("confirm password")?;
        let role = match prompter.ask("role (student/teacher)")?.trim() {
            "" => Role::Student,
            raw => Role::from_str(raw).map_err(|e| AppError::invalid_field(FIELD_ROLE, e.as_str()))?,
        };
        let specialty = if role == Role::Teacher { Some(prompter.ask("specialty")?) } else { None };
        let form = RegistrationForm { name, surname, email, password, confirm_password, role, specialty };

        match self.controller.register(&form).await {
            Ok(outcome) => {
                if let Some(notice) = &self.controller.state().notice {
                    println!("{}", notice);
                }
                self.open(outcome.navigate_to().path()).await;
            }
            Err(e) if e.is_validation() => print_error(&e),
            Err(_) => eprintln!("error: {}", self.controller.state().error.as_deref().unwrap_or("Unknown error")),
        }
        Ok(())
    }

    fn status(&self) {
        match self.navigator.gate().session() {
            Some(s) => {
                let who = s.profile.as_ref().map(|p| format!("{} <{}>", p.full_name(), p.display_email()));
                println!("signed in as {} ({}), token type {}", who.as_deref().unwrap_or("User"), self.role(), s.token_type);
            }
            None => println!("not signed in"),
        }
        println!("screen: {}", self.landing.path);
    }

    async fn show_dashboard(&mut self) {
        let mut dispatcher = ViewDispatcher::new(self.store.clone());
        let view = dispatcher.mount().clone();
        let name = dispatcher.profile().map(|p| p.display_name().to_string()).unwrap_or_else(|| "User".into());
        match view {
            DashboardView::Loading => println!("Loading..."),
            DashboardView::Admin(panel) => {
                println!("Administrator dashboard. Welcome, {}.", name);
                let mut stats = Table::new(&["Metric", "Total"]);
                for s in &panel.stats {
                    stats.push_row(vec![s.label.to_string(), s.value.to_string()]);
                }
                stats.print();
                for a in &panel.actions {
                    println!("  {:<12} go {}", a.label, a.target.path());
                }
            }
            DashboardView::Teacher | DashboardView::Student => {
                println!("{} dashboard. Welcome, {}.", self.role(), name);
                if let Err(e) = self.assignments().await {
                    print_error(&e);
                }
            }
            DashboardView::Unknown { role_id } => {
                let shown = role_id.map(|id| id.to_string()).unwrap_or_else(|| "none".into());
                println!("Role not recognized (role id: {}). Contact the administrator.", shown);
            }
        }
    }

    fn show_profile(&self) {
        let profile = self.navigator.gate().session().and_then(|s| s.profile).unwrap_or_default();
        println!("[{}] {}", profile.initial(), profile.full_name());
        let mut t = Table::new(&["Field", "Value"]);
        t.push_row(vec!["Email".into(), profile.display_email().into()]);
        t.push_row(vec!["Role".into(), profile.role_label()]);
        t.push_row(vec!["Phone".into(), profile.phone.clone().unwrap_or_else(|| "-".into())]);
        t.push_row(vec!["Address".into(), profile.address.clone().unwrap_or_else(|| "-".into())]);
        t.print();
    }

    async fn profile(&mut self, action: ProfileAction) -> AppResult<()> {
        if self.navigate(RouteId::Profile.path()).screen != Screen::View(RouteId::Profile) {
            println!("-> {}", self.landing.path);
            return Ok(());
        }
        match action {
            ProfileAction::Show => {}
            ProfileAction::Refresh => {
                if self.controller.refresh_profile().await.is_err() {
                    eprintln!("error: {}", self.controller.state().error.as_deref().unwrap_or("refresh failed"));
                    println!("showing locally cached data");
                }
            }
            ProfileAction::Set { field, value } => {
                let mut edit = ProfileEdit::default();
                match field.as_str() {
                    "name" => edit.name = Some(value),
                    "surname" => edit.surname = Some(value),
                    "phone" => edit.phone = Some(value),
                    "address" => edit.address = Some(value),
                    other => return Err(usage(format!("unknown profile field '{}'", other).as_str())),
                }
                self.controller.update_profile_locally(edit)?;
            }
        }
        if let Some(notice) = &self.controller.state().notice {
            println!("{}", notice);
        }
        self.show_profile();
        Ok(())
    }

    async fn list_students(&mut self) {
        if self.students.fetch().await.is_ok() {
            print_students(self.students.items());
        } else {
            report_list_error(self.students.error(), self.students.retry_available());
        }
    }

    async fn list_teachers(&mut self) {
        if self.teachers.fetch().await.is_ok() {
            print_teachers(self.teachers.items());
        } else {
            report_list_error(self.teachers.error(), self.teachers.retry_available());
        }
    }

    async fn roster(&mut self, entity: Entity, action: RosterAction, prompter: &mut dyn Prompter) -> AppResult<()> {
        let route = match entity {
            Entity::Students => RouteId::Students,
            Entity::Teachers => RouteId::Teachers,
        };
        if self.navigate(route.path()).screen != Screen::View(route) {
            println!("-> {} ({} is not available)", self.landing.path, route.path());
            return Ok(());
        }
        match (entity, action) {
            (Entity::Students, RosterAction::List) => self.list_students().await,
            (Entity::Teachers, RosterAction::List) => self.list_teachers().await,
            (Entity::Students, RosterAction::Add) => {
                let form = student_form(prompter, &Student::default())?;
                let created = self.students.create(form).await;
                self.after_mutation(created.map(|_| ()), self.students.error());
                print_students(self.students.items());
            }
            (Entity::Students, RosterAction::Edit(id)) => {
                let current = self.students.find(id).cloned().ok_or_else(|| usage(format!("no student with id {}", id).as_str()))?;
                let form = student_form(prompter, &current)?;
                let updated = self.students.update(id, form).await;
                self.after_mutation(updated.map(|_| ()), self.students.error());
                print_students(self.students.items());
            }
            (Entity::Students, RosterAction::Remove(id)) => {
                let removed = self.students.delete(id).await;
                self.after_mutation(removed, self.students.error());
                print_students(self.students.items());
            }
            (Entity::Teachers, RosterAction::Add) => {
                let form = teacher_form(prompter, &Teacher::default())?;
                let created = self.teachers.create(form).await;
                self.after_mutation(created.map(|_| ()), self.teachers.error());
                print_teachers(self.teachers.items());
            }
            (Entity::Teachers, RosterAction::Edit(id)) => {
                let current = self.teachers.find(id).cloned().ok_or_else(|| usage(format!("no teacher with id {}", id).as_str()))?;
                let form = teacher_form(prompter, &current)?;
                let updated = self.teachers.update(id, form).await;
                self.after_mutation(updated.map(|_| ()), self.teachers.error());
                print_teachers(self.teachers.items());
            }
            (Entity::Teachers, RosterAction::Remove(id)) => {
                let removed = self.teachers.delete(id).await;
                self.after_mutation(removed, self.teachers.error());
                print_teachers(self.teachers.items());
            }
        }
        Ok(())
    }

    fn after_mutation(&self, result: AppResult<()>, screen_error: Option<&str>) {
        match result {
            Ok(()) => println!("saved"),
            Err(e) if e.is_validation() => print_error(&e),
            Err(e) => eprintln!("error: {}", screen_error.map(str::to_string).unwrap_or_else(|| e.user_message())),
        }
    }

    async fn assignments(&mut self) -> AppResult<()> {
        let session = self
            .navigator
            .gate()
            .session()
            .ok_or_else(|| AppError::auth("no_session", "No authentication token. Please sign in again."))?;
        match load_role_data(self.backend.as_ref(), &session).await? {
            Some(RoleData::Student(a)) => {
                let mut t = Table::new(&["Subject", "Teacher", "Enrolled"]);
                for e in &a.enrollments {
                    t.push_row(vec![
                        e.subject.name.clone(),
                        format!("{} {}", e.teacher.name, e.teacher.surname).trim().to_string(),
                        e.enrolled_on.clone().unwrap_or_else(|| "-".into()),
                    ]);
                }
                println!("Subjects ({})", t.len());
                t.print();
            }
            Some(RoleData::Teacher(a)) => {
                for course in &a.courses {
                    println!("{} ({} students)", course.name, course.students.len());
                    let mut t = Table::new(&["ID", "Name", "Email", "Age"]);
                    for s in &course.students {
                        t.push_row(vec![
                            s.id.map(|i| i.to_string()).unwrap_or_else(|| "-".into()),
                            format!("{} {}", s.name, s.surname),
                            s.email.clone(),
                            s.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
                        ]);
                    }
                    t.print();
                }
                if a.courses.is_empty() {
                    println!("No courses assigned.");
                }
            }
            None => println!("No assignments for role {}.", self.role()),
        }
        Ok(())
    }
}

fn report_list_error(error: Option<&str>, retry: bool) {
    eprintln!("error: {}", error.unwrap_or("could not load the list"));
    if retry {
        println!("run the list command again to retry");
    }
}

fn print_students(items: &[Student]) {
    match Table::from_records(items, &[("id", "ID"), ("nombre", "Name"), ("apellido", "Surname"), ("correo", "Email"), ("edad", "Age"), ("direccion", "Address")]) {
        Ok(t) => t.print(),
        Err(e) => print_error(&e),
    }
}

fn print_teachers(items: &[Teacher]) {
    match Table::from_records(items, &[("id", "ID"), ("nombre", "Name"), ("apellido", "Surname"), ("correo", "Email"), ("especialidad", "Specialty")]) {
        Ok(t) => t.print(),
        Err(e) => print_error(&e),
    }
}

/// Blank answers keep the current value when editing.
fn student_form(prompter: &mut dyn Prompter, current: &Student) -> AppResult<StudentForm> {
    Ok(StudentForm {
        name: keep(prompter.ask("name")?, &current.name),
        surname: keep(prompter.ask("surname")?, &current.surname),
        email: keep(prompter.ask("email")?, &current.email),
        age: keep(prompter.ask("age")?, &current.age.map(|a| a.to_string()).unwrap_or_default()),
        address: keep(prompter.ask("address")?, current.address.as_deref().unwrap_or("")),
    })
}

fn teacher_form(prompter: &mut dyn Prompter, current: &Teacher) -> AppResult<TeacherForm> {
    Ok(TeacherForm {
        name: keep(prompter.ask("name")?, &current.name),
        surname: keep(prompter.ask("surname")?, &current.surname),
        email: keep(prompter.ask("email")?, &current.email),
        specialty: keep(prompter.ask("specialty")?, &current.specialty),
    })
}

/// Read-eval loop on a line editor. Each command runs to completion on `rt` before
/// the next line is read.
pub fn run_repl(rt: &tokio::runtime::Runtime, shell: &mut Shell) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("escuela shell. Type 'help' for commands.");
    let start = shell.landing().path.clone();
    rt.block_on(shell.open(&start));
    loop {
        let line = match editor.readline(&shell.prompt()) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);
        let cmd = match line.parse::<Command>() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}", e.message());
                continue;
            }
        };
        let mut prompter = EditorPrompter(&mut editor);
        match rt.block_on(shell.execute(cmd, &mut prompter)) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => print_error(&e),
        }
    }
    Ok(())
}
