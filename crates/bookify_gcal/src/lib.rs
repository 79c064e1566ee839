//! Google Calendar integration: OAuth2 token lifecycle and event management.

pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod token_store;

pub use gateway::{GcalError, GoogleCalendarGateway};
pub use handlers::GcalState;
pub use token_store::{FileTokenStore, StoredTokens, TokenStatus};
