//! Journal commands: record, list, show, edit, delete, regenerate, rewrite.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::bail;
use chrono::{Local, TimeZone};
use clap::Subcommand;
use loom_client::{JobState, Notifier};
use loom_core::dream::{DreamDraft, DreamUpdate, RewriteStyle};
use loom_core::filter::DreamFilter;
use loom_core::job::{JobPhase, JobSnapshot};
use loom_core::tags::tag_cloud;
use loom_core::timeline::dreams_by_month;
use loom_core::types::DreamId;
use tokio_util::sync::CancellationToken;

use super::{with_progress, App};
use crate::{prompt, render};

#[derive(Subcommand, Debug)]
pub enum DreamCommand {
    /// Record a dream and wait for its interpretation
    New {
        #[arg(long)]
        title: Option<String>,
        /// Dream text; read from stdin when omitted or `-`
        #[arg(long)]
        text: Option<String>,
        /// Also generate an image
        #[arg(long)]
        image: bool,
        /// Return right after saving instead of waiting
        #[arg(long)]
        no_wait: bool,
    },
    /// List dreams, newest first
    List {
        /// Case-insensitive text search
        #[arg(long, short)]
        search: Option<String>,
        /// Only dreams carrying this tag (repeatable)
        #[arg(long = "tag", short)]
        tags: Vec<String>,
        /// Print the tag cloud
        #[arg(long)]
        cloud: bool,
        /// Print dreams per month
        #[arg(long)]
        timeline: bool,
    },
    /// Show one dream with its interpretation
    Show { id: DreamId },
    /// Change a dream's title or text
    Edit {
        id: DreamId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Delete a dream
    Delete {
        id: DreamId,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Discard the interpretation and generate a new one
    Regenerate { id: DreamId },
    /// Retell a dream in another style
    Rewrite {
        id: DreamId,
        /// horror, sci-fi, children, fantasy, noir, or poetic
        #[arg(long)]
        style: RewriteStyle,
    },
}

pub async fn run(app: &App, command: DreamCommand) -> anyhow::Result<()> {
    app.require_login()?;
    match command {
        DreamCommand::New {
            title,
            text,
            image,
            no_wait,
        } => new(app, title, text, image, no_wait).await,
        DreamCommand::List {
            search,
            tags,
            cloud,
            timeline,
        } => list(app, search, tags, cloud, timeline).await,
        DreamCommand::Show { id } => {
            let dream = app.api.fetch_dream(id).await?;
            print!("{}", render::dream_detail(&dream, &Local));
            Ok(())
        }
        DreamCommand::Edit { id, title, text } => {
            let update = DreamUpdate {
                title,
                raw_text: text,
            };
            let dream = app.api.update_dream(id, &update).await?;
            println!("Updated #{} {}", dream.id, dream.title);
            Ok(())
        }
        DreamCommand::Delete { id, yes } => {
            if !yes && !prompt::confirm(&format!("Delete dream #{id}?"))? {
                println!("Kept.");
                return Ok(());
            }
            app.api.delete_dream(id).await?;
            println!("Deleted #{id}.");
            Ok(())
        }
        DreamCommand::Regenerate { id } => regenerate(app, id).await,
        DreamCommand::Rewrite { id, style } => {
            eprintln!("  Rewriting as {}…", style.label());
            let response = app.api.rewrite_dream(id, style).await?;
            println!("{}", render::rewrite(style, &response));
            Ok(())
        }
    }
}

async fn new(
    app: &App,
    title: Option<String>,
    text: Option<String>,
    image: bool,
    no_wait: bool,
) -> anyhow::Result<()> {
    let title = prompt::or_ask(title, "Title")?;
    let text = match text {
        Some(text) if text != "-" => text,
        _ => {
            eprintln!("Describe your dream, then press Ctrl-D:");
            prompt::all_stdin()?
        }
    };
    let draft = DreamDraft::new(title, text).with_image(image);
    draft.validate()?;

    if no_wait {
        let dream = app.api.create_dream(&draft).await?;
        println!("Saved #{}. Check later with `loom dream show {}`.", dream.id, dream.id);
        return Ok(());
    }

    let notifier = Notifier::for_backend(app.api.clone(), &app.config);
    let state = JobState::new();
    let cancel = CancellationToken::new();
    let snapshot = with_progress(&state, &cancel, notifier.submit(&draft, &state, &cancel)).await?;
    report(&snapshot)
}

async fn regenerate(app: &App, id: DreamId) -> anyhow::Result<()> {
    let dream = app.api.fetch_dream(id).await?;
    let notifier = Notifier::for_backend(app.api.clone(), &app.config);
    let state = JobState::new();
    let cancel = CancellationToken::new();
    let snapshot =
        with_progress(&state, &cancel, notifier.regenerate(dream, &state, &cancel)).await?;
    report(&snapshot)
}

/// Print the outcome of a tracked flow.
fn report(snapshot: &JobSnapshot) -> anyhow::Result<()> {
    print!("{}", outcome(snapshot, &Local)?);
    Ok(())
}

/// Final output for a tracked flow. Status lines were already echoed by
/// [`with_progress`] while waiting.
fn outcome<Tz: TimeZone>(snapshot: &JobSnapshot, tz: &Tz) -> anyhow::Result<String>
where
    Tz::Offset: fmt::Display,
{
    let id = snapshot.dream_id.unwrap_or_default();
    match snapshot.phase {
        JobPhase::Resolved => Ok(snapshot
            .dream
            .as_ref()
            .map(|dream| render::dream_detail(dream, tz))
            .unwrap_or_default()),
        JobPhase::TimedOut => Ok(format!(
            "Saved #{id}. Check later with `loom dream show {id}`.\n"
        )),
        JobPhase::Abandoned => Ok(format!(
            "Stopped waiting. #{id} keeps processing; check later with `loom dream show {id}`.\n"
        )),
        JobPhase::Failed => bail!(
            "{}",
            snapshot.error.as_deref().unwrap_or("could not save the dream")
        ),
        JobPhase::Idle | JobPhase::Creating | JobPhase::AwaitingCompletion => {
            bail!("tracking stopped unexpectedly in {:?}", snapshot.phase)
        }
    }
}

async fn list(
    app: &App,
    search: Option<String>,
    tags: Vec<String>,
    cloud: bool,
    timeline: bool,
) -> anyhow::Result<()> {
    let mut dreams = app.api.list_dreams().await?;
    dreams.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if cloud {
        println!("{}", render::tag_cloud(&tag_cloud(&dreams)));
        println!();
    }
    if timeline {
        println!("{}", render::months(&dreams_by_month(&dreams, &Local)));
        println!();
    }

    let required: BTreeSet<String> = tags.iter().map(|t| t.trim().to_lowercase()).collect();
    let filter = required
        .iter()
        .fold(DreamFilter::new(search.as_deref().unwrap_or_default()), |f, tag| {
            f.with_tag(tag)
        });
    let shown = filter.apply(&dreams);

    if dreams.is_empty() {
        println!("No dreams yet. Record one with `loom dream new`.");
    } else if shown.is_empty() {
        println!("No dreams match.");
    } else {
        for dream in &shown {
            println!("{}", render::dream_line(dream, &Local));
        }
        if !filter.is_empty() {
            eprintln!("{} of {} dreams", shown.len(), dreams.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use loom_core::dream::Dream;
    use loom_core::job::MSG_TAKING_LONGER;

    use super::*;

    fn pending() -> Dream {
        Dream {
            id: 7,
            title: "Glass staircase".into(),
            raw_text: "I climbed stairs made of glass".into(),
            created_at: DateTime::parse_from_rfc3339("2024-05-01T22:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
            interpretation: None,
        }
    }

    #[test]
    fn timed_out_outcome_does_not_repeat_status_line() {
        let mut snapshot = JobSnapshot::awaiting(pending(), "Analyzing");
        assert!(snapshot.time_out());

        let text = outcome(&snapshot, &Utc).unwrap();
        assert!(!text.contains(MSG_TAKING_LONGER));
        assert!(text.contains("loom dream show 7"));
    }

    #[test]
    fn failed_outcome_is_an_error() {
        let mut snapshot = JobSnapshot::new();
        assert!(snapshot.begin_creating(false));
        assert!(snapshot.creation_failed("Title is required"));

        let err = outcome(&snapshot, &Utc).unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }
}
