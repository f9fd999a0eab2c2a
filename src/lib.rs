//! Aether: team task board client core.
//!
//! Optimistic Kanban drag reconciliation against a remote task store, a
//! shared state machine for AI-generated artifact cards, and PDF export of
//! completed artifacts.

pub mod artifact;
pub mod board;
pub mod client;
pub mod config;
pub mod errors;
pub mod export;
pub mod logging;
pub mod server;
pub mod ui;
