//! Fleetdash Core — configuration, error types, fleet models, and the local store.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
