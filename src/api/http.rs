use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::models::*;
use super::Backend;
use crate::error::{AppError, AppResult};
use crate::identity::Profile;

/// Endpoint paths, relative to the configured base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/usuarios/registro/";
    pub const PROFILE: &str = "/auth/profile";

    pub const STUDENTS_LIST: &str = "/estudiantes/estudiante_view";
    pub const STUDENTS_CREATE: &str = "/estudiantes/create/";
    pub const STUDENTS_UPDATE: &str = "/estudiantes/update/";
    pub const STUDENTS_DELETE: &str = "/estudiantes/delete/";

    pub const TEACHERS_LIST: &str = "/profesores/profesores_get/";
    pub const TEACHERS_CREATE: &str = "/profesores/profesores_create/";
    pub const TEACHERS_UPDATE: &str = "/profesores/profesores_update/";
    pub const TEACHERS_DELETE: &str = "/profesores/profesores_delete/";

    pub const ASSIGNMENTS_STUDENT: &str = "/asignaciones/estudiante";
    pub const ASSIGNMENTS_TEACHER: &str = "/asignaciones/profesor";
}

/// reqwest-backed client for the school REST API.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base: Url) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::config("http_client", e.to_string().as_str()))?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url { &self.base }

    /// Base URL and endpoint are concatenated as text so a base with a path prefix
    /// (`http://host/api`) keeps it.
    fn url(&self, endpoint: &str) -> AppResult<Url> {
        let joined = format!("{}{}", self.base.as_str().trim_end_matches('/'), endpoint);
        Url::parse(&joined).map_err(|e| AppError::config("invalid_url", format!("{}: {}", joined, e).as_str()))
    }

    fn authed(&self, method: Method, endpoint: &str, token: &str) -> AppResult<RequestBuilder> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self.client.request(method, self.url(endpoint)?).bearer_auth(token).headers(headers))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, token: &str) -> AppResult<T> {
        let req = self.authed(Method::GET, endpoint, token)?;
        decode(endpoint, req.send().await?).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, method: Method, endpoint: &str, token: &str, body: &B) -> AppResult<T> {
        let req = self.authed(method, endpoint, token)?.json(body);
        decode(endpoint, req.send().await?).await
    }

    async fn delete(&self, endpoint: &str, token: &str) -> AppResult<()> {
        let req = self.authed(Method::DELETE, endpoint, token)?;
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(target: "escuela::api", "DELETE {} -> {}", endpoint, status);
        if !status.is_success() {
            return Err(status_error(endpoint, status.as_u16(), &body));
        }
        Ok(())
    }
}

/// Status check first, then JSON decode of the body. JSON error bodies contribute
/// their `detail` when they have one.
async fn decode<T: DeserializeOwned>(endpoint: &str, resp: reqwest::Response) -> AppResult<T> {
    let status = resp.status();
    let body = resp.bytes().await?;
    debug!(target: "escuela::api", "{} -> {} ({} bytes)", endpoint, status, body.len());
    if !status.is_success() {
        return Err(status_error(endpoint, status.as_u16(), &body));
    }
    serde_json::from_slice(&body).map_err(|e| {
        debug!(target: "escuela::api", "{}: body is not the expected JSON: {}", endpoint, e);
        AppError::from(e)
    })
}

/// A non-2xx answer. A body that is not JSON at all (an HTML error page, an empty
/// reply) usually means the base URL points somewhere other than the API.
fn status_error(endpoint: &str, status: u16, body: &[u8]) -> AppError {
    match serde_json::from_slice::<Value>(body) {
        Ok(v) => AppError::backend(status, extract_detail(&v)),
        Err(e) => {
            debug!(target: "escuela::api", "{}: {} with a non-JSON body: {}", endpoint, status, e);
            AppError::parse("malformed_response", format!("{} answered {} with a non-JSON body", endpoint, status).as_str())
        }
    }
}

/// Pull a human-readable message out of an error body. FastAPI sends either a string
/// `detail` or, for request validation, a list of `{loc, msg, type}` objects.
pub(crate) fn extract_detail(v: &Value) -> Option<String> {
    match v.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .map(|it| match it.get("msg").and_then(|m| m.as_str()) {
                    Some(m) => m.to_string(),
                    None => it.to_string(),
                })
                .collect();
            if msgs.is_empty() { None } else { Some(msgs.join("; ")) }
        }
        other => Some(other.to_string()),
    }
}

fn with_id(prefix: &str, id: i64) -> String { format!("{}{}", prefix, id) }

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> AppResult<TokenGrant> {
        let resp = self
            .client
            .post(self.url(endpoints::LOGIN)?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        decode(endpoints::LOGIN, resp).await
    }

    async fn register(&self, request: &RegistrationRequest) -> AppResult<RegistrationReceipt> {
        let resp = self.client.post(self.url(endpoints::REGISTER)?).json(request).send().await?;
        decode(endpoints::REGISTER, resp).await
    }

    async fn profile(&self, token: &str) -> AppResult<Profile> {
        self.get_json(endpoints::PROFILE, token).await
    }

    async fn list_students(&self, token: &str) -> AppResult<Vec<Student>> {
        self.get_json(endpoints::STUDENTS_LIST, token).await
    }

    async fn create_student(&self, token: &str, draft: &StudentDraft) -> AppResult<Student> {
        self.send_json(Method::POST, endpoints::STUDENTS_CREATE, token, draft).await
    }

    async fn update_student(&self, token: &str, id: i64, draft: &StudentDraft) -> AppResult<Student> {
        self.send_json(Method::PUT, &with_id(endpoints::STUDENTS_UPDATE, id), token, draft).await
    }

    async fn delete_student(&self, token: &str, id: i64) -> AppResult<()> {
        self.delete(&with_id(endpoints::STUDENTS_DELETE, id), token).await
    }

    async fn list_teachers(&self, token: &str) -> AppResult<Vec<Teacher>> {
        self.get_json(endpoints::TEACHERS_LIST, token).await
    }

    async fn create_teacher(&self, token: &str, draft: &TeacherDraft) -> AppResult<Teacher> {
        self.send_json(Method::POST, endpoints::TEACHERS_CREATE, token, draft).await
    }

    async fn update_teacher(&self, token: &str, id: i64, draft: &TeacherDraft) -> AppResult<Teacher> {
        self.send_json(Method::PUT, &with_id(endpoints::TEACHERS_UPDATE, id), token, draft).await
    }

    async fn delete_teacher(&self, token: &str, id: i64) -> AppResult<()> {
        self.delete(&with_id(endpoints::TEACHERS_DELETE, id), token).await
    }

    async fn student_assignments(&self, token: &str) -> AppResult<StudentAssignments> {
        self.get_json(endpoints::ASSIGNMENTS_STUDENT, token).await
    }

    async fn teacher_assignments(&self, token: &str) -> AppResult<TeacherAssignments> {
        self.get_json(endpoints::ASSIGNMENTS_TEACHER, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn detail_extraction() {
        assert_eq!(extract_detail(&json!({"detail": "invalid credentials"})).as_deref(), Some("invalid credentials"));
        assert_eq!(
            extract_detail(&json!({"detail": [{"loc": ["body", "correo"], "msg": "field required"}, {"msg": "too short"}]})).as_deref(),
            Some("field required; too short")
        );
        assert_eq!(extract_detail(&json!({"error": "x"})), None);
        assert_eq!(extract_detail(&json!({"detail": ""})), None);
    }

    #[test]
    fn non_json_error_bodies_are_malformed() {
        assert!(matches!(status_error("/login", 502, b"<html>502</html>"), AppError::Parse { .. }));
        assert!(matches!(status_error("/login", 404, b""), AppError::Parse { .. }));
        match status_error("/login", 401, br#"{"detail":"invalid credentials"}"#) {
            AppError::Backend { status: 401, detail: Some(d), .. } => assert_eq!(d, "invalid credentials"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(status_error("/login", 500, br#"{"error":"x"}"#), AppError::Backend { detail: None, .. }));
    }

    #[test]
    fn urls_keep_base_prefix() {
        let b = HttpBackend::new(Url::parse("http://127.0.0.1:8000/api/").unwrap()).unwrap();
        assert_eq!(b.url(endpoints::LOGIN).unwrap().as_str(), "http://127.0.0.1:8000/api/login");
        assert_eq!(
            b.url(&with_id(endpoints::STUDENTS_DELETE, 12)).unwrap().as_str(),
            "http://127.0.0.1:8000/api/estudiantes/delete/12"
        );
        let root = HttpBackend::new(Url::parse("http://127.0.0.1:8000").unwrap()).unwrap();
        assert_eq!(root.url(endpoints::REGISTER).unwrap().as_str(), "http://127.0.0.1:8000/usuarios/registro/");
    }
}
