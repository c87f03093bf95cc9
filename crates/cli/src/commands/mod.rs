//! Command handlers. Each one maps to a page of the journal.

pub mod account;
pub mod auth;
pub mod dreams;
pub mod insights;

use std::future::Future;

use anyhow::Context;
use loom_client::{ClientConfig, JobState, LoomApi};
use tokio_util::sync::CancellationToken;

use crate::session::{SessionStore, StoredSession};

/// Everything a command needs.
pub struct App {
    pub config: ClientConfig,
    pub api: LoomApi,
    pub sessions: SessionStore,
    /// Session found on disk at startup.
    pub stored: Option<StoredSession>,
}

impl App {
    /// Fail early with a readable message when nobody is signed in.
    pub fn require_login(&self) -> anyhow::Result<()> {
        self.api
            .auth()
            .require_token()
            .context("run `loom login` first")?;
        Ok(())
    }

    pub fn remembered_email(&self) -> Option<String> {
        self.stored.as_ref().and_then(|s| s.email.clone())
    }
}

/// Drive `work` while echoing progress lines from `state` to stderr.
/// Ctrl-C cancels `cancel`.
pub async fn with_progress<F: Future>(
    state: &JobState,
    cancel: &CancellationToken,
    work: F,
) -> F::Output {
    let mut rx = state.subscribe();
    let mut last = rx.borrow_and_update().status_message.clone();
    if let Some(line) = &last {
        eprintln!("  {line}");
    }

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Interrupted");
                cancel.cancel();
            }
        })
    };

    tokio::pin!(work);
    let output = loop {
        tokio::select! {
            output = &mut work => break output,
            Ok(()) = rx.changed() => {
                let line = rx.borrow_and_update().status_message.clone();
                if line.is_some() && line != last {
                    if let Some(text) = &line {
                        eprintln!("  {text}");
                    }
                    last = line;
                }
            }
        }
    };

    interrupt.abort();
    output
}
