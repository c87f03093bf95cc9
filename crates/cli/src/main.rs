//! `loom` -- command-line client for the Lucid Loom dream journal.
//!
//! Records dreams, waits for their AI interpretation, browses the journal,
//! and manages the account.
//!
//! # Environment variables
//!
//! | Variable                    | Default                  | Description                          |
//! |-----------------------------|--------------------------|--------------------------------------|
//! | `LOOM_API_URL`              | `http://localhost:8000`  | Backend base URL                     |
//! | `LOOM_WS_URL`               | derived from API URL     | Push channel base URL                |
//! | `LOOM_REQUEST_TIMEOUT_SECS` | `30`                     | Per-request HTTP timeout             |
//! | `LOOM_POLL_INTERVAL_MS`     | `3000`                   | Delay between completion polls       |
//! | `LOOM_MAX_POLLS`            | `20`                     | Polls before "taking longer" notice  |
//! | `LOOM_SESSION_FILE`         | `<config dir>/lucid-loom/session.json` | Remembered session |
//! | `RUST_LOG`                  | `loom_cli=info,loom_client=info` | Log filter (logs go to stderr) |

mod commands;
mod prompt;
mod render;
mod session;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use loom_client::{ClientConfig, LoomApi, LoomApiError, NotifierError};
use loom_core::auth::AuthContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{account, auth, dreams, insights, App};
use crate::session::SessionStore;

/// Lucid Loom dream journal
#[derive(Parser, Debug)]
#[command(name = "loom", version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides LOOM_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and receive a verification code by e-mail
    Register(auth::RegisterArgs),
    /// Confirm the e-mailed code and sign in
    Verify(auth::VerifyArgs),
    /// Sign in with e-mail and password
    Login(auth::LoginArgs),
    /// Forget the stored session
    Logout,
    /// Reset or change the password
    #[command(subcommand)]
    Password(auth::PasswordCommand),
    /// Record, browse, and edit dreams
    #[command(subcommand)]
    Dream(dreams::DreamCommand),
    /// Explain a dream symbol
    Symbol(insights::SymbolArgs),
    /// Journal statistics and timelines
    Analytics(insights::AnalyticsArgs),
    /// AI analysis of recurring patterns across the journal
    Patterns,
    /// Account details, export, and deletion
    #[command(subcommand)]
    User(account::UserCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = if verbose > 0 {
        "loom_cli=debug,loom_client=debug,loom_core=debug"
    } else {
        "loom_cli=info,loom_client=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        let overridden = ClientConfig::for_api_url(api_url);
        config.api_url = overridden.api_url;
        if std::env::var_os("LOOM_WS_URL").is_none() {
            config.ws_url = overridden.ws_url;
        }
    }

    tracing::debug!(api_url = %config.api_url, ws_url = %config.ws_url, "Starting loom");

    let auth = AuthContext::new();
    let sessions = SessionStore::from_env();
    let stored = sessions.restore(&auth);
    let had_session = stored.is_some();
    let api = LoomApi::new(&config, auth.clone())?;
    let app = App {
        config,
        api,
        sessions,
        stored,
    };

    let result = match cli.command {
        Command::Register(args) => auth::register(&app, args).await,
        Command::Verify(args) => auth::verify(&app, args).await,
        Command::Login(args) => auth::login(&app, args).await,
        Command::Logout => auth::logout(&app),
        Command::Password(cmd) => auth::password(&app, cmd).await,
        Command::Dream(cmd) => dreams::run(&app, cmd).await,
        Command::Symbol(args) => insights::symbol(&app, args).await,
        Command::Analytics(args) => insights::analytics(&app, args).await,
        Command::Patterns => insights::patterns(&app).await,
        Command::User(cmd) => account::run(&app, cmd).await,
    };

    // Logout, account deletion, or a 401 from a protected endpoint
    // signed the context out.
    if had_session && !auth.is_authenticated() {
        app.sessions.clear()?;
        if result.is_err() {
            tracing::info!("Stored session removed; sign in again with `loom login`");
        }
    }

    result
}

/// Print an error the way a user should see it.
fn report(error: &anyhow::Error) {
    eprintln!("Error: {error:#}");
    let api_error = error.downcast_ref::<LoomApiError>().or_else(|| {
        match error.downcast_ref::<NotifierError>()? {
            NotifierError::Create(e) | NotifierError::Regenerate(e) => Some(e),
            NotifierError::Busy => None,
        }
    });
    if let Some(api_error) = api_error {
        if api_error.is_unauthorized() {
            eprintln!("Hint: your session may have expired. Run `loom login`.");
        } else if api_error.mentions_missing_api_key() {
            eprintln!("Hint: the backend has no AI provider API key configured.");
        }
    }
}
