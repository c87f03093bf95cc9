//! Domain types and presentation logic for the Lucid Loom dream journal.
//!
//! Nothing in this crate performs I/O. The REST/WebSocket client lives in
//! `loom-client`; this crate holds the records it exchanges, the auth
//! context it reads tokens from, the job state machine the notifier drives,
//! and the tag/icon/timeline helpers the front end renders with.

pub mod account;
pub mod analytics;
pub mod auth;
pub mod dream;
pub mod error;
pub mod filter;
pub mod icons;
pub mod job;
pub mod tags;
pub mod timeline;
pub mod types;
