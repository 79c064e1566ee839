//! The admin API: token-guarded management of meetings, settings,
//! credentials, and the team directory.

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{hash_password, verify_password, AuthContext, Claims};
pub use handlers::{AdminState, CurrentAdmin};
