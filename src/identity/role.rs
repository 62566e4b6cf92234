use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Role of a signed-in user. Ids follow the dashboard mapping used by the backend's
/// user model: 1 = teacher, 2 = student, 3 = admin. Registration uses the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    /// Missing or unrecognized `rol_id`; carries the raw id when one was present.
    Unknown(Option<i64>),
}

pub const TEACHER_ID: i64 = 1;
pub const STUDENT_ID: i64 = 2;
pub const ADMIN_ID: i64 = 3;

impl Role {
    pub fn from_id(id: Option<i64>) -> Self {
        match id {
            Some(TEACHER_ID) => Role::Teacher,
            Some(STUDENT_ID) => Role::Student,
            Some(ADMIN_ID) => Role::Admin,
            other => Role::Unknown(other),
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Role::Teacher => Some(TEACHER_ID),
            Role::Student => Some(STUDENT_ID),
            Role::Admin => Some(ADMIN_ID),
            Role::Unknown(raw) => *raw,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
            Role::Unknown(_) => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool { !matches!(self, Role::Unknown(_)) }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses the role names accepted by the registration form (English or Spanish).
impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrador" => Ok(Role::Admin),
            "teacher" | "profesor" => Ok(Role::Teacher),
            "student" | "estudiante" => Ok(Role::Student),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
