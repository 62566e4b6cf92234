//! In-process mock of the school backend, bound to an ephemeral 127.0.0.1 port.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Form, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@escuela.com";
pub const STUDENT_EMAIL: &str = "juan@escuela.com";
pub const TEACHER_EMAIL: &str = "maria@escuela.com";
pub const PASSWORD: &str = "123456";
/// Login with this identifier answers 200 with a non-JSON body.
pub const BROKEN_EMAIL: &str = "broken@escuela.com";

/// Headers of one request that reached the mock.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    hits: AtomicUsize,
    pub seen: Mutex<Vec<Seen>>,
    pub students: Mutex<Vec<Value>>,
    pub teachers: Mutex<Vec<Value>>,
    pub registrations: Mutex<Vec<Value>>,
}

impl MockState {
    pub fn hits(&self) -> usize { self.hits.load(Ordering::SeqCst) }

    fn record(&self, path: &str, headers: &HeaderMap) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let text = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
        self.seen.lock().push(Seen {
            path: path.to_string(),
            authorization: text(header::AUTHORIZATION),
            content_type: text(header::CONTENT_TYPE),
        });
    }
}

type Shared = Arc<MockState>;

fn token_for(email: &str) -> String { format!("tok-{}", email.split('@').next().unwrap_or("x")) }

fn user_for(email: &str) -> Option<Value> {
    match email {
        ADMIN_EMAIL => Some(json!({"nombre": "Admin", "apellido": "Sistema", "email": ADMIN_EMAIL, "rol": "Administrador", "rol_id": 3})),
        STUDENT_EMAIL => Some(json!({"nombre": "Juan", "apellido": "Pérez", "email": STUDENT_EMAIL, "rol": "Estudiante", "rol_id": 2})),
        TEACHER_EMAIL => Some(json!({"nombre": "María", "apellido": "González", "email": TEACHER_EMAIL, "rol": "Profesor", "rol_id": 1})),
        _ => None,
    }
}

fn email_for_token(headers: &HeaderMap) -> Option<&'static str> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?;
    [ADMIN_EMAIL, STUDENT_EMAIL, TEACHER_EMAIL].into_iter().find(|e| token_for(e) == token)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))).into_response()
}

async fn login(State(st): State<Shared>, headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> Response {
    st.record("/login", &headers);
    let username = form.get("username").cloned().unwrap_or_default();
    let password = form.get("password").cloned().unwrap_or_default();
    if username == BROKEN_EMAIL {
        return (StatusCode::OK, "<html>proxy error page</html>").into_response();
    }
    match user_for(&username) {
        Some(user) if password == PASSWORD => {
            Json(json!({"access_token": token_for(&username), "token_type": "bearer", "user": user})).into_response()
        }
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "invalid credentials"}))).into_response(),
    }
}

async fn register(State(st): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    st.record("/usuarios/registro/", &headers);
    let email = body.get("correo").and_then(Value::as_str).unwrap_or_default().to_string();
    if user_for(&email).is_some() {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "El correo ya está registrado"}))).into_response();
    }
    let sign_in = body.get("nombre").and_then(Value::as_str) == Some("Token");
    st.registrations.lock().push(body);
    if sign_in {
        Json(json!({"access_token": "tok-new", "token_type": "bearer"})).into_response()
    } else {
        Json(json!({"mensaje": "Usuario creado"})).into_response()
    }
}

async fn profile(State(st): State<Shared>, headers: HeaderMap) -> Response {
    st.record("/auth/profile", &headers);
    match email_for_token(&headers) {
        Some(email) => {
            let u = user_for(email).unwrap_or_default();
            Json(json!({
                "id": 7,
                "nombre": u["nombre"],
                "apellido": u["apellido"],
                "correo": email,
                "rol_id": u["rol_id"],
                "rol_nombre": u["rol"],
                "telefono": "555-0100",
            }))
            .into_response()
        }
        None => unauthorized(),
    }
}

async fn list_students(State(st): State<Shared>, headers: HeaderMap) -> Response {
    st.record("/estudiantes/estudiante_view", &headers);
    if email_for_token(&headers).is_none() {
        return unauthorized();
    }
    Json(Value::Array(st.students.lock().clone())).into_response()
}

async fn create_student(State(st): State<Shared>, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    st.record("/estudiantes/create/", &headers);
    if email_for_token(&headers).is_none() {
        return unauthorized();
    }
    let mut rows = st.students.lock();
    body["id"] = json!(rows.len() as i64 + 1);
    rows.push(body.clone());
    Json(body).into_response()
}

async fn update_student(State(st): State<Shared>, headers: HeaderMap, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    st.record("/estudiantes/update", &headers);
    let mut rows = st.students.lock();
    match rows.iter_mut().find(|r| r["id"] == json!(id)) {
        Some(row) => {
            let mut updated = body;
            updated["id"] = json!(id);
            *row = updated.clone();
            Json(updated).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Estudiante no encontrado"}))).into_response(),
    }
}

async fn delete_student(State(st): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    st.record("/estudiantes/delete", &headers);
    st.students.lock().retain(|r| r["id"] != json!(id));
    Json(json!({"mensaje": "Estudiante eliminado"})).into_response()
}

async fn list_teachers(State(st): State<Shared>, headers: HeaderMap) -> Response {
    st.record("/profesores/profesores_get/", &headers);
    if email_for_token(&headers).is_none() {
        return unauthorized();
    }
    Json(Value::Array(st.teachers.lock().clone())).into_response()
}

async fn create_teacher(State(st): State<Shared>, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    st.record("/profesores/profesores_create/", &headers);
    if email_for_token(&headers).is_none() {
        return unauthorized();
    }
    let mut rows = st.teachers.lock();
    let next = rows.iter().filter_map(|r| r["id"].as_i64()).max().unwrap_or(0) + 1;
    body["id"] = json!(next);
    rows.push(body.clone());
    Json(body).into_response()
}

async fn update_teacher(State(st): State<Shared>, headers: HeaderMap, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    st.record(&format!("/profesores/profesores_update/{}", id), &headers);
    if email_for_token(&headers).is_none() {
        return unauthorized();
    }
    let mut rows = st.teachers.lock();
    match rows.iter_mut().find(|r| r["id"] == json!(id)) {
        Some(row) => {
            let mut updated = body;
            updated["id"] = json!(id);
            *row = updated.clone();
            Json(updated).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Profesor no encontrado"}))).into_response(),
    }
}

async fn delete_teacher(State(st): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    st.record(&format!("/profesores/profesores_delete/{}", id), &headers);
    if email_for_token(&headers).is_none() {
        return unauthorized();
    }
    st.teachers.lock().retain(|r| r["id"] != json!(id));
    Json(json!({"mensaje": "Profesor eliminado"})).into_response()
}

/// Anything outside the API answers like a web server's error page.
async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "text/html")], "<html><body>404 Not Found</body></html>").into_response()
}

async fn student_assignments(State(st): State<Shared>, headers: HeaderMap) -> Response {
    st.record("/asignaciones/estudiante", &headers);
    if email_for_token(&headers) != Some(STUDENT_EMAIL) {
        return (StatusCode::FORBIDDEN, Json(json!({"detail": "Solo estudiantes"}))).into_response();
    }
    Json(json!({
        "estudiante": {"id": 9, "nombre": "Juan", "apellido": "Pérez"},
        "asignaciones": [
            {"id": 1, "fecha_inscripcion": "2024-02-01", "materia": {"id": 4, "nombre": "Álgebra"}, "profesor": {"id": 1, "nombre": "María", "apellido": "González"}}
        ]
    }))
    .into_response()
}

async fn teacher_assignments(State(st): State<Shared>, headers: HeaderMap) -> Response {
    st.record("/asignaciones/profesor", &headers);
    Json(json!({"profesor": {"id": 1, "nombre": "María", "apellido": "González"}, "materias": []})).into_response()
}

/// Start the mock and return its base URL.
pub async fn spawn_backend() -> (String, Arc<MockState>) {
    let state: Shared = Arc::new(MockState::default());
    state.teachers.lock().push(json!({"id": 1, "nombre": "María", "apellido": "González", "correo": TEACHER_EMAIL, "especialidad": "Matemáticas"}));
    let app = Router::new()
        .route("/login", post(login))
        .route("/usuarios/registro/", post(register))
        .route("/auth/profile", get(profile))
        .route("/estudiantes/estudiante_view", get(list_students))
        .route("/estudiantes/create/", post(create_student))
        .route("/estudiantes/update/{id}", put(update_student))
        .route("/estudiantes/delete/{id}", delete(delete_student))
        .route("/profesores/profesores_get/", get(list_teachers))
        .route("/profesores/profesores_create/", post(create_teacher))
        .route("/profesores/profesores_update/{id}", put(update_teacher))
        .route("/profesores/profesores_delete/{id}", delete(delete_teacher))
        .route("/asignaciones/estudiante", get(student_assignments))
        .route("/asignaciones/profesor", get(teacher_assignments))
        .fallback(not_found)
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), state)
}

/// A base URL nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind 127.0.0.1:0");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
