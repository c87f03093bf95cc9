//! Job-completion notifier.
//!
//! After a dream is created its interpretation runs in the background.
//! [`Notifier`] watches for completion over two paths at once:
//!
//! - the push channel (`/ws/dream-status/{id}`), which streams progress
//!   lines and a `done` marker, and
//! - a bounded poll loop that fetches the dream every period until the
//!   interpretation appears or the attempts run out.
//!
//! Both paths run as futures inside the caller's task. Whichever observes
//! completion first resolves the [`JobState`]; the other path's signal is
//! then a no-op, and both are dropped (closing the socket and the timer).
//! If polling gives up, the job is marked "taking longer than expected"
//! and the push channel remains the only way to resolve it.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use loom_core::dream::{Dream, DreamDraft};
use loom_core::job::{JobPhase, JobSnapshot, MSG_WEAVING};
use loom_core::types::DreamId;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{LoomApi, LoomApiError};
use crate::config::{ClientConfig, DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL_MS};
use crate::push::{PushConnector, WsPushConnector};

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// The REST operations the notifier needs.
#[async_trait]
pub trait DreamSource: Send + Sync {
    async fn create(&self, draft: &DreamDraft) -> Result<Dream, LoomApiError>;

    async fn fetch(&self, dream_id: DreamId) -> Result<Dream, LoomApiError>;

    /// Discard the interpretation and restart processing.
    async fn regenerate(&self, dream_id: DreamId) -> Result<(), LoomApiError>;
}

#[async_trait]
impl DreamSource for LoomApi {
    async fn create(&self, draft: &DreamDraft) -> Result<Dream, LoomApiError> {
        self.create_dream(draft).await
    }

    async fn fetch(&self, dream_id: DreamId) -> Result<Dream, LoomApiError> {
        self.fetch_dream(dream_id).await
    }

    async fn regenerate(&self, dream_id: DreamId) -> Result<(), LoomApiError> {
        self.regenerate_dream(dream_id).await.map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// State cell
// ---------------------------------------------------------------------------

/// Resolved-once state for one creation flow.
///
/// Every change goes through a [`JobSnapshot`] transition inside
/// `send_if_modified`, so the transition's own guard is the single
/// "already resolved" check for both paths. Views subscribe for updates.
#[derive(Debug)]
pub struct JobState {
    tx: watch::Sender<JobSnapshot>,
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}

impl JobState {
    /// An idle flow.
    pub fn new() -> Self {
        Self::from_snapshot(JobSnapshot::new())
    }

    /// A flow already waiting on `dream`.
    pub fn awaiting(dream: Dream, status_message: impl Into<String>) -> Self {
        Self::from_snapshot(JobSnapshot::awaiting(dream, status_message))
    }

    fn from_snapshot(snapshot: JobSnapshot) -> Self {
        Self {
            tx: watch::Sender::new(snapshot),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.tx.borrow().clone()
    }

    pub fn phase(&self) -> JobPhase {
        self.tx.borrow().phase
    }

    /// Apply a transition; observers are notified only if it changed
    /// something. Returns whether it did.
    pub fn update(&self, transition: impl FnOnce(&mut JobSnapshot) -> bool) -> bool {
        self.tx.send_if_modified(transition)
    }

    fn replace(&self, snapshot: JobSnapshot) {
        self.tx.send_replace(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Poll-loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Delay before the first poll and between polls.
    pub poll_interval: Duration,
    /// Polls attempted before reporting "taking longer than expected".
    pub max_polls: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl From<&ClientConfig> for NotifierConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// The flow is already creating or tracking a dream.
    #[error("A dream is already being processed")]
    Busy,

    /// The creation request failed; no channel was opened.
    #[error(transparent)]
    Create(LoomApiError),

    /// The regenerate request failed; no channel was opened.
    #[error(transparent)]
    Regenerate(LoomApiError),
}

/// How the push path ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PushExit {
    Resolved,
    Unavailable,
    Failed,
    Closed,
}

/// Creates dreams and tracks their interpretation to completion.
pub struct Notifier<S, P> {
    source: S,
    push: P,
    config: NotifierConfig,
}

impl Notifier<LoomApi, WsPushConnector> {
    /// Notifier talking to the backend described by `config`.
    pub fn for_backend(api: LoomApi, config: &ClientConfig) -> Self {
        Self::new(api, WsPushConnector::from_config(config), config.into())
    }
}

impl<S: DreamSource, P: PushConnector> Notifier<S, P> {
    pub fn new(source: S, push: P, config: NotifierConfig) -> Self {
        Self {
            source,
            push,
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> NotifierConfig {
        self.config
    }

    /// Create a dream and track it until it resolves, times out with the
    /// push channel gone, or `cancel` fires.
    ///
    /// Creation failure leaves the flow `Failed` and opens no channel.
    pub async fn submit(
        &self,
        draft: &DreamDraft,
        state: &JobState,
        cancel: &CancellationToken,
    ) -> Result<JobSnapshot, NotifierError> {
        if !state.update(|s| s.begin_creating(draft.generate_image)) {
            return Err(NotifierError::Busy);
        }

        let created = match draft.validate() {
            Err(e) => Err(LoomApiError::from(e)),
            Ok(()) => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    state.update(|s| s.abandon());
                    tracing::info!("Dream creation abandoned");
                    return Ok(state.snapshot());
                }
                result = self.source.create(draft) => result,
            },
        };

        let dream = match created {
            Ok(dream) => dream,
            Err(e) => {
                tracing::warn!(error = %e, "Dream creation failed");
                state.update(|s| s.creation_failed(e.to_string()));
                return Err(NotifierError::Create(e));
            }
        };

        let dream_id = dream.id;
        tracing::info!(
            dream_id,
            generate_image = draft.generate_image,
            "Dream created, awaiting interpretation",
        );

        if dream.is_interpreted() {
            state.update(|s| s.created(dream.clone()));
            state.update(|s| s.resolve(dream));
            return Ok(state.snapshot());
        }

        state.update(|s| s.created(dream));
        Ok(self.track(dream_id, state, cancel).await)
    }

    /// Restart interpretation of an existing dream and track it.
    pub async fn regenerate(
        &self,
        mut dream: Dream,
        state: &JobState,
        cancel: &CancellationToken,
    ) -> Result<JobSnapshot, NotifierError> {
        if state.phase().is_loading() {
            return Err(NotifierError::Busy);
        }
        let dream_id = dream.id;
        self.source
            .regenerate(dream_id)
            .await
            .map_err(NotifierError::Regenerate)?;

        tracing::info!(dream_id, "Regeneration started");
        dream.interpretation = None;
        state.replace(JobSnapshot::awaiting(dream, MSG_WEAVING));
        Ok(self.track(dream_id, state, cancel).await)
    }

    /// Race the push channel against the poll loop for `dream_id`.
    ///
    /// Returns once the flow is terminal, or timed out with the push
    /// channel closed. Both paths are dropped before returning.
    pub async fn track(
        &self,
        dream_id: DreamId,
        state: &JobState,
        cancel: &CancellationToken,
    ) -> JobSnapshot {
        if !state.phase().is_awaiting() {
            return state.snapshot();
        }

        let started = Instant::now();
        let push = self.run_push(dream_id, state);
        let poll = self.run_poll(dream_id, state);
        tokio::pin!(push, poll);

        let mut push_live = true;
        let mut poll_live = true;

        while !state.phase().is_terminal() && (push_live || poll_live) {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    if state.update(|s| s.abandon()) {
                        tracing::info!(dream_id, "Stopped tracking dream");
                    }
                    break;
                }
                exit = &mut push, if push_live => {
                    push_live = false;
                    tracing::debug!(dream_id, ?exit, "Push path finished");
                }
                () = &mut poll, if poll_live => {
                    poll_live = false;
                    tracing::debug!(dream_id, "Poll path finished");
                }
            }
        }

        let snapshot = state.snapshot();
        tracing::debug!(
            dream_id,
            phase = ?snapshot.phase,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tracking finished",
        );
        snapshot
    }

    // ---- completion paths ----

    async fn run_push(&self, dream_id: DreamId, state: &JobState) -> PushExit {
        let mut updates = match self.push.open(dream_id).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(dream_id, error = %e, "Push channel unavailable, relying on polling");
                return PushExit::Unavailable;
            }
        };

        while let Some(update) = updates.next().await {
            let update = match update {
                Ok(update) => update,
                Err(e) => {
                    tracing::warn!(dream_id, error = %e, "Push channel failed, relying on polling");
                    return PushExit::Failed;
                }
            };

            if !update.concerns(dream_id) {
                tracing::debug!(dream_id, other = ?update.dream_id, "Ignoring update for another dream");
                continue;
            }

            if let Some(message) = update.progress_message() {
                state.update(|s| s.apply_status(message));
            }

            if update.is_done() {
                match self.source.fetch(dream_id).await {
                    Ok(dream) => {
                        if state.update(|s| s.resolve(dream)) {
                            tracing::info!(dream_id, via = "push", "Dream interpretation ready");
                        }
                        return PushExit::Resolved;
                    }
                    Err(e) => {
                        tracing::warn!(dream_id, error = %e, "Fetch after completion notice failed");
                    }
                }
            }
        }

        tracing::debug!(dream_id, "Push channel closed");
        PushExit::Closed
    }

    async fn run_poll(&self, dream_id: DreamId, state: &JobState) {
        let period = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.config.max_polls {
            ticker.tick().await;
            if !state.phase().is_awaiting() {
                return;
            }

            match self.source.fetch(dream_id).await {
                Ok(dream) if dream.is_interpreted() => {
                    if state.update(|s| s.resolve(dream)) {
                        tracing::info!(dream_id, attempt, via = "poll", "Dream interpretation ready");
                    }
                    return;
                }
                Ok(_) => {
                    tracing::trace!(dream_id, attempt, "Interpretation not ready");
                }
                Err(e) => {
                    tracing::warn!(dream_id, attempt, error = %e, "Poll failed");
                }
            }
        }

        if state.update(|s| s.time_out()) {
            tracing::warn!(
                dream_id,
                max_polls = self.config.max_polls,
                "Interpretation taking longer than expected",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use chrono::Utc;
    use futures::stream;
    use loom_core::dream::Interpretation;
    use loom_core::job::{MSG_ANALYZING, MSG_TAKING_LONGER};

    use super::*;
    use crate::messages::PushUpdate;
    use crate::push::{PushError, PushStream};

    const ID: DreamId = 7;

    fn pending_dream() -> Dream {
        Dream {
            id: ID,
            title: "Glass staircase".into(),
            raw_text: "I climbed stairs made of glass".into(),
            created_at: Utc::now(),
            interpretation: None,
        }
    }

    fn interpreted_dream() -> Dream {
        Dream {
            interpretation: Some(Interpretation {
                meaning: Some("Fragile ambition".into()),
                ..Default::default()
            }),
            ..pending_dream()
        }
    }

    fn server_error() -> LoomApiError {
        LoomApiError::ApiError {
            status: 500,
            detail: "Internal Server Error".into(),
        }
    }

    // ---- fakes ----

    #[derive(Default)]
    struct FakeSource {
        create_fails: bool,
        /// Fetch number (1-based) from which the interpretation is present.
        ready_from: Option<usize>,
        /// Leading fetches that fail.
        failing_fetches: usize,
        creates: AtomicUsize,
        fetches: AtomicUsize,
        regenerates: AtomicUsize,
    }

    impl FakeSource {
        fn ready_from(n: usize) -> Self {
            Self {
                ready_from: Some(n),
                ..Default::default()
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DreamSource for FakeSource {
        async fn create(&self, _draft: &DreamDraft) -> Result<Dream, LoomApiError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.create_fails {
                Err(server_error())
            } else {
                Ok(pending_dream())
            }
        }

        async fn fetch(&self, _dream_id: DreamId) -> Result<Dream, LoomApiError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failing_fetches {
                return Err(server_error());
            }
            if self.ready_from.is_some_and(|from| n >= from) {
                Ok(interpreted_dream())
            } else {
                Ok(pending_dream())
            }
        }

        async fn regenerate(&self, _dream_id: DreamId) -> Result<(), LoomApiError> {
            self.regenerates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Push connector replaying a script of `(delay, update)` pairs.
    struct FakePush {
        refuse: bool,
        script: Vec<(Duration, PushUpdate)>,
        /// Keep the stream open after the script ends.
        stay_open: bool,
        opens: AtomicUsize,
        /// One clone lives inside every open stream.
        alive: Arc<()>,
    }

    impl FakePush {
        fn refusing() -> Self {
            Self::scripted(Vec::new(), false).with_refuse()
        }

        fn silent() -> Self {
            Self::scripted(Vec::new(), true)
        }

        fn scripted(script: Vec<(Duration, PushUpdate)>, stay_open: bool) -> Self {
            Self {
                refuse: false,
                script,
                stay_open,
                opens: AtomicUsize::new(0),
                alive: Arc::new(()),
            }
        }

        fn with_refuse(mut self) -> Self {
            self.refuse = true;
            self
        }

        fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }

        fn open_streams(&self) -> usize {
            Arc::strong_count(&self.alive) - 1
        }
    }

    #[async_trait]
    impl PushConnector for FakePush {
        async fn open(&self, _dream_id: DreamId) -> Result<PushStream, PushError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.refuse {
                return Err(PushError::Connection("connection refused".into()));
            }
            let queue: VecDeque<_> = self.script.iter().cloned().collect();
            let guard = Arc::clone(&self.alive);
            let stay_open = self.stay_open;
            let updates = stream::unfold((queue, guard), move |(mut queue, guard)| async move {
                let Some((delay, update)) = queue.pop_front() else {
                    if stay_open {
                        futures::future::pending::<()>().await;
                    }
                    return None;
                };
                tokio::time::sleep(delay).await;
                Some((Ok::<_, PushError>(update), (queue, guard)))
            });
            Ok(updates.boxed())
        }
    }

    fn status(status: &str, message: Option<&str>) -> PushUpdate {
        PushUpdate {
            status: Some(status.into()),
            message: message.map(str::to_string),
            dream_id: Some(ID),
        }
    }

    fn config() -> NotifierConfig {
        NotifierConfig::default()
    }

    fn draft() -> DreamDraft {
        DreamDraft::new("Glass staircase", "I climbed stairs made of glass")
    }

    // ---- scenarios ----

    #[tokio::test(start_paused = true)]
    async fn push_done_resolves_without_polling() {
        let push = FakePush::scripted(
            vec![
                (Duration::from_secs(1), status("analyzing", Some("Analyzing your dream..."))),
                (Duration::from_secs(1), status("done", None)),
            ],
            true,
        );
        let notifier = Notifier::new(FakeSource::ready_from(1), push, config());
        let state = JobState::new();
        let start = Instant::now();

        let snapshot = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshot.phase, JobPhase::Resolved);
        assert_eq!(snapshot.status_message, None);
        assert!(snapshot.dream.unwrap().is_interpreted());
        assert!(start.elapsed() < Duration::from_secs(3));
        assert_eq!(notifier.source().fetches(), 1);
        assert_eq!(notifier.push.open_streams(), 0);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(notifier.source().fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_push_polls_to_the_limit_then_times_out() {
        let notifier = Notifier::new(FakeSource::default(), FakePush::refusing(), config());
        let state = JobState::new();
        let start = Instant::now();

        let snapshot = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshot.phase, JobPhase::TimedOut);
        assert_eq!(snapshot.status_message.as_deref(), Some(MSG_TAKING_LONGER));
        assert_eq!(notifier.source().fetches(), 20);
        assert_eq!(notifier.push.opens(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_resolves_while_push_is_silent() {
        let notifier = Notifier::new(FakeSource::ready_from(3), FakePush::silent(), config());
        let state = JobState::new();
        let start = Instant::now();

        let snapshot = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshot.phase, JobPhase::Resolved);
        assert_eq!(notifier.source().fetches(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(9));
        assert_eq!(notifier.push.open_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn push_resolves_after_polling_gave_up() {
        let push = FakePush::scripted(
            vec![(Duration::from_secs(90), status("done", None))],
            true,
        );
        let notifier = Notifier::new(FakeSource::ready_from(21), push, config());
        let state = JobState::new();
        let mut rx = state.subscribe();

        let watcher = tokio::spawn(async move {
            let mut saw_timeout = false;
            while rx.changed().await.is_ok() {
                if rx.borrow_and_update().phase == JobPhase::TimedOut {
                    saw_timeout = true;
                }
            }
            saw_timeout
        });

        let snapshot = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await
            .unwrap();
        drop(state);

        assert_eq!(snapshot.phase, JobPhase::Resolved);
        assert_eq!(notifier.source().fetches(), 21);
        assert!(watcher.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_flow_ends_when_push_closes() {
        let push = FakePush::scripted(
            vec![(Duration::from_secs(70), status("analyzing", Some("Still thinking")))],
            false,
        );
        let notifier = Notifier::new(FakeSource::default(), push, config());
        let state = JobState::new();

        let snapshot = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshot.phase, JobPhase::TimedOut);
        // Late progress lines still replace the timeout notice.
        assert_eq!(snapshot.status_message.as_deref(), Some("Still thinking"));
        assert_eq!(notifier.source().fetches(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn creation_failure_opens_no_channels() {
        let source = FakeSource {
            create_fails: true,
            ..Default::default()
        };
        let notifier = Notifier::new(source, FakePush::silent(), config());
        let state = JobState::new();

        let result = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await;

        assert_matches!(result, Err(NotifierError::Create(LoomApiError::ApiError { status: 500, .. })));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, JobPhase::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("Internal Server Error"));
        assert_eq!(notifier.push.opens(), 0);
        assert_eq!(notifier.source().fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_draft_never_reaches_backend() {
        let notifier = Notifier::new(FakeSource::default(), FakePush::silent(), config());
        let state = JobState::new();

        let result = notifier
            .submit(&DreamDraft::new("  ", "text"), &state, &CancellationToken::new())
            .await;

        assert_matches!(result, Err(NotifierError::Create(LoomApiError::Core(_))));
        assert_eq!(notifier.source().creates.load(Ordering::SeqCst), 0);
        assert_eq!(state.phase(), JobPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_releases_both_paths() {
        let notifier = Notifier::new(FakeSource::default(), FakePush::silent(), config());
        let state = JobState::new();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let snapshot = notifier.submit(&draft(), &state, &cancel).await.unwrap();

        assert_eq!(snapshot.phase, JobPhase::Abandoned);
        assert_eq!(notifier.source().fetches(), 1);
        assert_eq!(notifier.push.open_streams(), 0);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(notifier.source().fetches(), 1);
        assert_eq!(state.phase(), JobPhase::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn simultaneous_signals_resolve_once() {
        let push = FakePush::scripted(vec![(Duration::from_secs(3), status("done", None))], true);
        let notifier = Notifier::new(FakeSource::ready_from(1), push, config());
        let state = JobState::new();

        let snapshot = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshot.phase, JobPhase::Resolved);
        assert!(notifier.source().fetches() <= 2);
        assert!(!state.update(|s| s.resolve(interpreted_dream())));
        assert_eq!(state.snapshot(), snapshot);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_polls_are_inconclusive() {
        let source = FakeSource {
            ready_from: Some(3),
            failing_fetches: 2,
            ..Default::default()
        };
        let notifier = Notifier::new(source, FakePush::refusing(), config());
        let state = JobState::new();

        let snapshot = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshot.phase, JobPhase::Resolved);
        assert_eq!(notifier.source().fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_lines_reach_subscribers() {
        let push = FakePush::scripted(
            vec![
                (Duration::from_secs(1), status("analyzing", Some("Analyzing your dream..."))),
                (
                    Duration::from_millis(500),
                    PushUpdate {
                        dream_id: Some(ID + 1),
                        ..status("analyzing", Some("someone else's dream"))
                    },
                ),
                (Duration::from_millis(500), status("generating_image", Some("Generating image..."))),
            ],
            true,
        );
        let notifier = Arc::new(Notifier::new(FakeSource::default(), push, config()));
        let state = Arc::new(JobState::awaiting(pending_dream(), MSG_ANALYZING));
        let rx = state.subscribe();
        let cancel = CancellationToken::new();

        let task = {
            let (notifier, state, cancel) = (notifier.clone(), state.clone(), cancel.clone());
            tokio::spawn(async move { notifier.track(ID, &state, &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(1_250)).await;
        assert_eq!(
            rx.borrow().status_message.as_deref(),
            Some("Analyzing your dream...")
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            rx.borrow().status_message.as_deref(),
            Some("Analyzing your dream...")
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            rx.borrow().status_message.as_deref(),
            Some("Generating image...")
        );

        cancel.cancel();
        let snapshot = task.await.unwrap();
        assert_eq!(snapshot.phase, JobPhase::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn regenerate_tracks_existing_dream() {
        let notifier = Notifier::new(FakeSource::ready_from(1), FakePush::refusing(), config());
        let state = JobState::new();

        let snapshot = notifier
            .regenerate(interpreted_dream(), &state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(notifier.source().regenerates.load(Ordering::SeqCst), 1);
        assert_eq!(snapshot.phase, JobPhase::Resolved);
        assert_eq!(notifier.source().fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_tracking_is_refused() {
        let notifier = Notifier::new(FakeSource::default(), FakePush::silent(), config());
        let state = JobState::awaiting(pending_dream(), MSG_ANALYZING);

        let result = notifier
            .submit(&draft(), &state, &CancellationToken::new())
            .await;

        assert_matches!(result, Err(NotifierError::Busy));
        assert_eq!(notifier.source().creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_count_never_exceeds_limit() {
        let config = NotifierConfig {
            poll_interval: Duration::from_millis(100),
            max_polls: 4,
        };
        let notifier = Notifier::new(FakeSource::default(), FakePush::silent(), config);
        let state = JobState::new();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            trigger.cancel();
        });

        let snapshot = notifier.submit(&draft(), &state, &cancel).await.unwrap();

        // Push stayed open, so tracking only ended on cancel.
        assert_eq!(snapshot.phase, JobPhase::Abandoned);
        assert_eq!(notifier.source().fetches(), 4);
    }
}
