//! Service assembly for the booking backend.

pub mod bootstrap;

pub use bootstrap::{bootstrap, App};
