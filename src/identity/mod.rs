//! Identity types shared by the session controller, the router and the dashboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod profile;
mod role;
mod session;

pub use profile::{Profile, ProfileEdit};
pub use role::{Role, ADMIN_ID, STUDENT_ID, TEACHER_ID};
pub use session::{Session, SessionToken, DEFAULT_TOKEN_TYPE};
