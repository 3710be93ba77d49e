//! Domain models.
//!
//! Internal models shared by the core services and the HTTP layer; the API
//! crate defines its own request/response shapes on top.

pub mod actor;
pub mod auth;
