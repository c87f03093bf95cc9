//! HTTP and WebSocket client for the Lucid Loom backend.
//!
//! - [`api`]: typed wrappers over the REST endpoints.
//! - [`push`] / [`messages`]: the per-dream status channel.
//! - [`notifier`]: creates dreams and races push against polling until the
//!   interpretation is ready.

pub mod api;
pub mod config;
pub mod messages;
pub mod notifier;
pub mod push;

pub use api::{LoomApi, LoomApiError};
pub use config::ClientConfig;
pub use notifier::{JobState, Notifier, NotifierConfig, NotifierError};
