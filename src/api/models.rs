//! Wire types exchanged with the school backend. Rust field names are English; the
//! serde names are the backend's.

use serde::{Deserialize, Serialize};

use crate::identity::Profile;

/// Successful `/login` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<Profile>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegistrationRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "contrasena")]
    pub password: String,
    pub rol_id: i64,
    #[serde(rename = "especialidad", skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(rename = "edad", skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(rename = "direccion", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Successful registration body. The token is only present when the backend signs
/// the new user in directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationReceipt {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "apellido", default)]
    pub surname: String,
    #[serde(rename = "correo", default)]
    pub email: String,
    #[serde(rename = "edad", default)]
    pub age: Option<i64>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "usuario_id", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Create/update payload for a student.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StudentDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "edad")]
    pub age: Option<i64>,
    #[serde(rename = "direccion")]
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Teacher {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "apellido", default)]
    pub surname: String,
    #[serde(rename = "correo", default)]
    pub email: String,
    #[serde(rename = "especialidad", default)]
    pub specialty: String,
    #[serde(rename = "usuario_id", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TeacherDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "especialidad")]
    pub specialty: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "apellido", default)]
    pub surname: String,
    #[serde(rename = "correo", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "especialidad", default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

/// `GET /asignaciones/estudiante`: the subjects a student is enrolled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentAssignments {
    #[serde(rename = "estudiante", default)]
    pub student: PersonRef,
    #[serde(rename = "asignaciones", default)]
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enrollment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "fecha_inscripcion", default)]
    pub enrolled_on: Option<String>,
    #[serde(rename = "materia", default)]
    pub subject: Subject,
    #[serde(rename = "profesor", default)]
    pub teacher: PersonRef,
}

/// `GET /asignaciones/profesor`: a teacher's subjects and who is enrolled in each.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeacherAssignments {
    #[serde(rename = "profesor", default)]
    pub teacher: PersonRef,
    #[serde(rename = "materias", default)]
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "estudiantes", default)]
    pub students: Vec<EnrolledStudent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrolledStudent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "apellido", default)]
    pub surname: String,
    #[serde(rename = "correo", default)]
    pub email: String,
    #[serde(rename = "edad", default)]
    pub age: Option<i64>,
    #[serde(rename = "fecha_inscripcion", default)]
    pub enrolled_on: Option<String>,
}
