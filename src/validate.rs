//! Pre-flight form checks. Nothing here touches the network; a failing form is
//! reported as `AppError::Validation` with one message per offending field.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::{RegistrationRequest, StudentDraft, TeacherDraft};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::identity::Role;

pub const FIELD_NAME: &str = "name";
pub const FIELD_SURNAME: &str = "surname";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_CONFIRM: &str = "confirm_password";
pub const FIELD_IDENTIFIER: &str = "identifier";
pub const FIELD_AGE: &str = "age";
pub const FIELD_SPECIALTY: &str = "specialty";
pub const FIELD_ROLE: &str = "role";

const MIN_NAME_CHARS: usize = 2;
const MIN_PASSWORD_CHARS: usize = 6;

/// `local@domain.tld`, no whitespace, exactly the shape the sign-up form accepts.
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex"));

pub fn is_email_shaped(s: &str) -> bool { EMAIL_SHAPE.is_match(s) }

fn finish(errors: FieldErrors) -> AppResult<()> {
    if errors.is_empty() { Ok(()) } else { Err(AppError::validation(errors)) }
}

/// Both login fields are required.
pub fn check_login(identifier: &str, secret: &str) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if identifier.trim().is_empty() {
        errors.insert(FIELD_IDENTIFIER.into(), "Please fill in all fields".into());
    }
    if secret.is_empty() {
        errors.insert(FIELD_PASSWORD.into(), "Please fill in all fields".into());
    }
    finish(errors)
}

/// Sign-up form as typed by the user.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub specialty: Option<String>,
}

impl RegistrationForm {
    /// Run every check and report all failing fields at once.
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if self.name.trim().chars().count() < MIN_NAME_CHARS {
            errors.insert(FIELD_NAME.into(), "Name must be at least 2 characters".into());
        }
        if self.surname.trim().chars().count() < MIN_NAME_CHARS {
            errors.insert(FIELD_SURNAME.into(), "Surname must be at least 2 characters".into());
        }
        if !is_email_shaped(&self.email) {
            errors.insert(FIELD_EMAIL.into(), "Enter a valid email address".into());
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.insert(FIELD_PASSWORD.into(), "Password must be at least 6 characters".into());
        }
        if self.password != self.confirm_password {
            errors.insert(FIELD_CONFIRM.into(), "Passwords do not match".into());
        }
        finish(errors)
    }

    /// Wire request. Only students and teachers can sign themselves up.
    pub fn to_request(&self) -> AppResult<RegistrationRequest> {
        let rol_id = match self.role {
            Role::Student | Role::Teacher => self.role.id(),
            Role::Admin => return Err(AppError::invalid_field(FIELD_ROLE, "Administrators cannot self-register")),
            Role::Unknown(_) => None,
        }
        .ok_or_else(|| AppError::invalid_field(FIELD_ROLE, "Choose a role"))?;
        Ok(RegistrationRequest {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            rol_id,
            specialty: self.specialty.clone().filter(|s| !s.trim().is_empty()),
            age: None,
            address: None,
        })
    }
}

/// Student create/edit form. Age arrives as text and is optional.
#[derive(Debug, Clone, Default)]
pub struct StudentForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub age: String,
    pub address: String,
}

fn required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.into(), "Please fill in the required fields".into());
    }
}

impl StudentForm {
    pub fn into_draft(self) -> AppResult<StudentDraft> {
        let mut errors = FieldErrors::new();
        required(&mut errors, FIELD_NAME, &self.name);
        required(&mut errors, FIELD_SURNAME, &self.surname);
        required(&mut errors, FIELD_EMAIL, &self.email);
        let age = match self.age.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(n) if n >= 0 => Some(n),
                _ => {
                    errors.insert(FIELD_AGE.into(), "Age must be a valid number".into());
                    None
                }
            },
        };
        finish(errors)?;
        Ok(StudentDraft {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            email: self.email.trim().to_string(),
            age,
            address: self.address.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeacherForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub specialty: String,
}

impl TeacherForm {
    pub fn into_draft(self) -> AppResult<TeacherDraft> {
        let mut errors = FieldErrors::new();
        required(&mut errors, FIELD_NAME, &self.name);
        required(&mut errors, FIELD_SURNAME, &self.surname);
        required(&mut errors, FIELD_EMAIL, &self.email);
        required(&mut errors, FIELD_SPECIALTY, &self.specialty);
        finish(errors)?;
        Ok(TeacherDraft {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            email: self.email.trim().to_string(),
            specialty: self.specialty.trim().to_string(),
        })
    }
}
