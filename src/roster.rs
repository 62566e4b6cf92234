//! Student and teacher management screens.
//!
//! `Roster<E>` holds the list state of one screen: items, loading flag, the last
//! error and whether a retry should be offered. Every successful mutation re-reads
//! the list from the backend.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::{Backend, SharedBackend, Student, StudentDraft, Teacher, TeacherDraft};
use crate::error::{AppError, AppResult};
use crate::storage::SharedCredentials;
use crate::validate::{StudentForm, TeacherForm};

pub const MSG_AGE_DATA: &str =
    "The student records in the database are inconsistent: the age column holds invalid values. Contact the administrator.";
const AGE_DATA_DETAIL: &str = "Error al obtener los estudiantes: 0";

/// An entity with a CRUD screen.
#[async_trait]
pub trait RosterEntity: Clone + Send + Sync + 'static {
    type Form: Send;
    type Draft: Send + Sync;

    /// Plural noun for logs and headings.
    const NOUN: &'static str;

    fn id(&self) -> Option<i64>;
    fn draft(form: Self::Form) -> AppResult<Self::Draft>;

    async fn list(backend: &dyn Backend, token: &str) -> AppResult<Vec<Self>>;
    async fn create(backend: &dyn Backend, token: &str, draft: &Self::Draft) -> AppResult<Self>;
    async fn update(backend: &dyn Backend, token: &str, id: i64, draft: &Self::Draft) -> AppResult<Self>;
    async fn delete(backend: &dyn Backend, token: &str, id: i64) -> AppResult<()>;

    /// Message shown when the list could not be loaded.
    fn fetch_error_message(err: &AppError) -> String { err.user_message() }
}

#[async_trait]
impl RosterEntity for Student {
    type Form = StudentForm;
    type Draft = StudentDraft;
    const NOUN: &'static str = "students";

    fn id(&self) -> Option<i64> { self.id }
    fn draft(form: StudentForm) -> AppResult<StudentDraft> { form.into_draft() }

    async fn list(backend: &dyn Backend, token: &str) -> AppResult<Vec<Self>> { backend.list_students(token).await }
    async fn create(backend: &dyn Backend, token: &str, draft: &StudentDraft) -> AppResult<Self> {
        backend.create_student(token, draft).await
    }
    async fn update(backend: &dyn Backend, token: &str, id: i64, draft: &StudentDraft) -> AppResult<Self> {
        backend.update_student(token, id, draft).await
    }
    async fn delete(backend: &dyn Backend, token: &str, id: i64) -> AppResult<()> { backend.delete_student(token, id).await }

    fn fetch_error_message(err: &AppError) -> String {
        match err {
            AppError::Backend { detail: Some(d), .. } if d.contains(AGE_DATA_DETAIL) => MSG_AGE_DATA.to_string(),
            other => other.user_message(),
        }
    }
}

#[async_trait]
impl RosterEntity for Teacher {
    type Form = TeacherForm;
    type Draft = TeacherDraft;
    const NOUN: &'static str = "teachers";

    fn id(&self) -> Option<i64> { self.id }
    fn draft(form: TeacherForm) -> AppResult<TeacherDraft> { form.into_draft() }

    async fn list(backend: &dyn Backend, token: &str) -> AppResult<Vec<Self>> { backend.list_teachers(token).await }
    async fn create(backend: &dyn Backend, token: &str, draft: &TeacherDraft) -> AppResult<Self> {
        backend.create_teacher(token, draft).await
    }
    async fn update(backend: &dyn Backend, token: &str, id: i64, draft: &TeacherDraft) -> AppResult<Self> {
        backend.update_teacher(token, id, draft).await
    }
    async fn delete(backend: &dyn Backend, token: &str, id: i64) -> AppResult<()> { backend.delete_teacher(token, id).await }
}

pub struct Roster<E: RosterEntity> {
    backend: SharedBackend,
    store: SharedCredentials,
    items: Vec<E>,
    loading: bool,
    error: Option<String>,
    retry_available: bool,
}

pub type StudentRoster = Roster<Student>;
pub type TeacherRoster = Roster<Teacher>;

impl<E: RosterEntity> Roster<E> {
    pub fn new(backend: SharedBackend, store: SharedCredentials) -> Self {
        Self { backend, store, items: Vec::new(), loading: false, error: None, retry_available: false }
    }

    pub fn items(&self) -> &[E] { &self.items }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }
    pub fn retry_available(&self) -> bool { self.retry_available }
    pub fn dismiss_error(&mut self) { self.error = None; }

    fn token(&self) -> AppResult<String> {
        self.store
            .load()?
            .filter(|s| s.has_token())
            .map(|s| s.token)
            .ok_or_else(|| AppError::auth("no_session", "No authentication token. Please sign in again."))
    }

    fn token_or_fail(&mut self) -> AppResult<String> {
        self.token().map_err(|e| {
            self.error = Some(e.user_message());
            e
        })
    }

    pub async fn fetch(&mut self) -> AppResult<&[E]> {
        self.error = None;
        self.retry_available = false;
        let token = self.token_or_fail()?;

        self.loading = true;
        let result = E::list(self.backend.as_ref(), &token).await;
        self.loading = false;

        match result {
            Ok(items) => {
                info!(target: "escuela::roster", "loaded {} {}", items.len(), E::NOUN);
                self.items = items;
                Ok(&self.items)
            }
            Err(e) => {
                warn!(target: "escuela::roster", "failed to load {}: {}", E::NOUN, e);
                self.items.clear();
                self.error = Some(E::fetch_error_message(&e));
                self.retry_available = true;
                Err(e)
            }
        }
    }

    /// Re-read after a mutation. A failure here lands in `error`/`retry_available`
    /// and does not undo the mutation's result.
    async fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.fetch().await {
            warn!(target: "escuela::roster", "reload of {} after change failed: {}", E::NOUN, e);
        }
    }

    fn mutation_failed(&mut self, action: &str, e: &AppError) {
        warn!(target: "escuela::roster", "{} on {} failed: {}", action, E::NOUN, e);
        self.error = Some(e.user_message());
    }

    pub async fn create(&mut self, form: E::Form) -> AppResult<E> {
        self.error = None;
        let draft = E::draft(form)?;
        let token = self.token_or_fail()?;
        let created = E::create(self.backend.as_ref(), &token, &draft).await.map_err(|e| {
            self.mutation_failed("create", &e);
            e
        })?;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    pub async fn update(&mut self, id: i64, form: E::Form) -> AppResult<E> {
        self.error = None;
        let draft = E::draft(form)?;
        let token = self.token_or_fail()?;
        let updated = E::update(self.backend.as_ref(), &token, id, &draft).await.map_err(|e| {
            self.mutation_failed("update", &e);
            e
        })?;
        self.refresh_after_mutation().await;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: i64) -> AppResult<()> {
        self.error = None;
        let token = self.token_or_fail()?;
        E::delete(self.backend.as_ref(), &token, id).await.map_err(|e| {
            self.mutation_failed("delete", &e);
            e
        })?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub fn find(&self, id: i64) -> Option<&E> { self.items.iter().find(|e| e.id() == Some(id)) }
}
