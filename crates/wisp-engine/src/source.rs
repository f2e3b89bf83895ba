//! The capability contract every candidate source implements.
//!
//! Sources are registered with the engine and driven through this trait
//! only; the engine never inspects concrete source types. A source that
//! produces asynchronously hands its results to its own store and then
//! pings the engine back through the [`UpdateSender`] it received when
//! triggered.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::{Candidate, Context, EngineEvent, MergedItem, Result};

/// Lifecycle of a source's current production run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceStatus {
    /// No production in flight and no results cached.
    #[default]
    Idle,
    /// Production started but results are not available yet.
    Processing,
    /// Results are available via `filtered_items`.
    Completed,
    /// The last production attempt failed.
    Error,
}

/// Static per-source facts consulted during merging.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMetadata {
    /// Merge order: higher priority sources are consulted first.
    pub priority: i32,
    /// When set, a non-empty result from this source excludes all
    /// lower-priority sources from the same display cycle. Used by sources
    /// that only fire on their own trigger characters.
    pub char_exclusive: bool,
}

/// Handle a source uses to report that its asynchronous production finished.
///
/// This is the explicit event-queue form of an out-of-band callback: invoking
/// [`UpdateSender::notify`] enqueues a fresh display cycle on the engine's
/// event pump rather than re-entering the pipeline directly.
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: UnboundedSender<EngineEvent>,
    source_id: String,
}

impl UpdateSender {
    pub(crate) fn new(tx: UnboundedSender<EngineEvent>, source_id: String) -> Self {
        Self { tx, source_id }
    }

    /// Tell the engine this source's production finished. Safe to call from
    /// any task; a closed engine simply drops the notification.
    pub fn notify(&self) {
        trace!(source = %self.source_id, "source update");
        let _ = self
            .tx
            .send(EngineEvent::SourceUpdated(self.source_id.clone()));
    }
}

/// A pluggable candidate producer.
pub trait Source: Send + Sync {
    /// Unique id of this source instance.
    fn id(&self) -> &str;

    /// Configuration lookup key (several instances may share a name).
    fn name(&self) -> &str;

    /// Current production status.
    fn status(&self) -> SourceStatus;

    /// Static merge metadata.
    fn metadata(&self) -> SourceMetadata;

    /// Start (or restart) production for `ctx`. Returns true if new
    /// production was started. Sources that complete asynchronously keep
    /// `update` and call [`UpdateSender::notify`] when done.
    fn trigger(&self, ctx: &Context, update: UpdateSender) -> Result<bool>;

    /// Candidates filtered against `ctx`, valid while status is `Completed`.
    fn filtered_items(&self, ctx: &Context) -> Vec<Candidate>;

    /// Column at which this source's candidates replace text.
    fn start_offset(&self) -> usize;

    /// Time spent in the current `Processing` run.
    fn processing_time(&self) -> Duration;

    /// Apply the edit for a confirmed item. Edit semantics are the source's
    /// own business; the engine only delegates.
    fn confirm(&self, item: &MergedItem);

    /// Discard in-flight production and cached results.
    fn clear(&self);

    /// Render documentation for `item`, best effort.
    fn documentation(&self, item: &MergedItem);
}
