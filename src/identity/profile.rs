use serde::{Deserialize, Serialize};

use super::role::Role;

const DEFAULT_NAME: &str = "User";
const DEFAULT_EMAIL: &str = "user@example.com";

/// Cached, denormalized view of the signed-in user.
///
/// Field names on the wire follow the backend (`nombre`, `correo`, `rol_id`, ...);
/// every field is optional because the login response, the registration form and
/// `/auth/profile` each populate a different subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "apellido", default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(rename = "correo", alias = "email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "rol", alias = "rol_nombre", default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(rename = "rol_id", default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i64>,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "direccion", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Local edits to the cached profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Profile {
    pub fn role(&self) -> Role { Role::from_id(self.role_id) }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(DEFAULT_NAME)
    }

    pub fn full_name(&self) -> String {
        let first = self.name.as_deref().unwrap_or("");
        let last = self.surname.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }

    pub fn display_email(&self) -> &str {
        self.email.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(DEFAULT_EMAIL)
    }

    /// Server-provided role label, falling back to the label of the mapped role.
    pub fn role_label(&self) -> String {
        match self.role_name.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(label) => label.to_string(),
            None => self.role().label().to_string(),
        }
    }

    /// Avatar initial: first letter of the name, `U` when unknown.
    pub fn initial(&self) -> char {
        self.name
            .as_deref()
            .and_then(|n| n.trim().chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }

    /// Overlay fields present in `fresh` onto `self`; absent fields keep the cached value.
    pub fn merge(&mut self, fresh: Profile) {
        if fresh.name.is_some() { self.name = fresh.name; }
        if fresh.surname.is_some() { self.surname = fresh.surname; }
        if fresh.email.is_some() { self.email = fresh.email; }
        if fresh.role_name.is_some() { self.role_name = fresh.role_name; }
        if fresh.role_id.is_some() { self.role_id = fresh.role_id; }
        if fresh.phone.is_some() { self.phone = fresh.phone; }
        if fresh.address.is_some() { self.address = fresh.address; }
    }

    pub fn apply(&mut self, edit: ProfileEdit) {
        if let Some(v) = edit.name { self.name = Some(v); }
        if let Some(v) = edit.surname { self.surname = Some(v); }
        if let Some(v) = edit.phone { self.phone = Some(v); }
        if let Some(v) = edit.address { self.address = Some(v); }
    }
}
