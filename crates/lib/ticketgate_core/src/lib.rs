//! # ticketgate_core
//!
//! Actor authentication and session lifecycle for the ticketing backend:
//! token issuance/rotation, the cache-backed single live session, email and
//! phone one-time codes, and verification-gated password recovery.

pub mod auth;
pub mod cache;
pub mod migrate;
pub mod models;
pub mod otp;
pub mod store;

