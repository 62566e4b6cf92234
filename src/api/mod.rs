//! Backend collaborator: the REST endpoints the client consumes.
//!
//! `Backend` is the seam the session controller, the dashboard and the roster
//! screens are written against; `HttpBackend` is the real implementation and tests
//! substitute their own.

mod http;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::identity::Profile;

pub use http::{HttpBackend, endpoints};
pub use models::*;

/// Backend handle shared by the controller, the dashboard and the roster screens.
pub type SharedBackend = Arc<dyn Backend>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Form-encoded credential exchange.
    async fn login(&self, username: &str, password: &str) -> AppResult<TokenGrant>;
    async fn register(&self, request: &RegistrationRequest) -> AppResult<RegistrationReceipt>;
    async fn profile(&self, token: &str) -> AppResult<Profile>;

    async fn list_students(&self, token: &str) -> AppResult<Vec<Student>>;
    async fn create_student(&self, token: &str, draft: &StudentDraft) -> AppResult<Student>;
    async fn update_student(&self, token: &str, id: i64, draft: &StudentDraft) -> AppResult<Student>;
    async fn delete_student(&self, token: &str, id: i64) -> AppResult<()>;

    async fn list_teachers(&self, token: &str) -> AppResult<Vec<Teacher>>;
    async fn create_teacher(&self, token: &str, draft: &TeacherDraft) -> AppResult<Teacher>;
    async fn update_teacher(&self, token: &str, id: i64, draft: &TeacherDraft) -> AppResult<Teacher>;
    async fn delete_teacher(&self, token: &str, id: i64) -> AppResult<()>;

    async fn student_assignments(&self, token: &str) -> AppResult<StudentAssignments>;
    async fn teacher_assignments(&self, token: &str) -> AppResult<TeacherAssignments>;
}
