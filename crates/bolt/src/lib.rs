//! Fleetdash Bolt — Fleet API integration.
//!
//! This crate owns the OAuth client-credentials token cache, the typed
//! Fleet API client with limit/offset pagination and bounded retry, and the
//! engine that upserts remote vehicles and drivers into the local store.

pub mod auth;
pub mod client;
pub mod models;
pub mod retry;
pub mod sync;
