//! Account details, data export, and deletion.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use super::App;
use crate::{prompt, render};

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Name, e-mail, and journal statistics
    Info,
    /// Download everything the backend holds for this account
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Permanently delete the account and all dreams
    Delete {
        #[arg(long, env = "LOOM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub async fn run(app: &App, command: UserCommand) -> anyhow::Result<()> {
    app.require_login()?;
    match command {
        UserCommand::Info => {
            let (info, stats) = tokio::join!(app.api.user_info(), app.api.user_stats());
            let info = info?;
            let stats = match stats {
                Ok(stats) => Some(stats),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not load account statistics");
                    None
                }
            };
            print!("{}", render::user(&info, stats.as_ref()));
        }
        UserCommand::Export { out } => {
            let data = app.api.export_user_data().await?;
            let json = serde_json::to_string_pretty(&data)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        UserCommand::Delete { password, yes } => {
            if !yes
                && !prompt::confirm("Delete your account and every dream? This cannot be undone")?
            {
                println!("Kept.");
                return Ok(());
            }
            let password = prompt::secret(password, "Password")?;
            app.api.delete_account(&password).await?;
            app.sessions.clear()?;
            println!("Account deleted.");
        }
    }
    Ok(())
}
