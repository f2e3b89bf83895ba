//! Wisp Engine
//!
//! The wisp engine crate orchestrates in-editor autocompletion:
//! - decides per keystroke whether candidate sources should start producing
//! - schedules display cycles with keyed debounce/throttle timers
//! - merges completed sources' candidates into one deduped, ranked list
//! - drives selection, confirmation and confirmation history
//!
//! The engine owns no editor state: it talks to the editor through the
//! [`Host`] trait, ranks through [`Ranker`], and defers the auto-trigger
//! decision to [`AutoTrigger`]. Sources implement [`Source`] and report
//! asynchronous production through the engine's event queue.
//!
//! Concurrency model: all entry points are cheap synchronous calls made from
//! the host's event loop. Staged work (debounced display cycles, throttled
//! merges, deferred renders) runs on tokio tasks and is invalidated by
//! staleness checks, never by cancellation hand-shakes: a newer cycle simply
//! reschedules under the same timer key and the older one no-ops.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, trace, warn};

mod candidate;
mod context;
mod error;
mod history;
mod host;
mod merge;
mod registry;
mod source;
pub mod test_support;
mod timers;

pub use candidate::{Candidate, MergedItem};
pub use context::Context;
pub use error::{Error, Result};
pub use history::History;
pub use host::{AutoTrigger, BufferKind, EditorMode, Host, Ranker, RenderMode};
pub use registry::SourceRegistry;
pub use source::{Source, SourceMetadata, SourceStatus, UpdateSender};
pub use timers::Timers;

/// Debounce key for waiting out in-flight source processing.
const PROCESSING_KEY: &str = "processing";
/// Throttle key for the merge/render pass.
const FILTER_KEY: &str = "filter";

/// Events flowing back into the engine's pump task.
pub(crate) enum EngineEvent {
    /// A source finished asynchronous production; re-evaluate the display.
    SourceUpdated(String),
    /// Deferred render, issued at the next safe scheduling point.
    Show {
        /// Left boundary column of the merged list.
        offset: usize,
        /// The merged list itself; empty means close the popup.
        items: Vec<MergedItem>,
    },
}

/// Selection request forwarded from the host's popup events.
#[derive(Debug, Clone, Copy)]
pub struct SelectRequest {
    /// Candidate index into the current merged list; the sentinel −2 means
    /// the first item, other negative values resolve to no selection.
    pub index: i32,
    /// Whether to also request documentation for the resolved item.
    pub documentation: bool,
}

/// Mutable engine state behind one lock: the previous request context, the
/// last shown list, the selection and the confirmation history. Overwritten
/// wholesale per cycle, reset fully on `close`.
struct EngineState {
    prev_ctx: Context,
    offset: usize,
    items: Vec<MergedItem>,
    selected: Option<MergedItem>,
    history: History,
}

impl EngineState {
    fn new() -> Self {
        Self {
            prev_ctx: Context::empty(),
            offset: 0,
            items: Vec::new(),
            selected: None,
            history: History::default(),
        }
    }
}

/// The autocomplete orchestration engine.
///
/// Construct via [`Engine::new`] (requires a running tokio runtime), register
/// sources, then feed host events through [`Engine::complete`],
/// [`Engine::select`], [`Engine::confirm`] and [`Engine::close`]. All entry
/// points are best-effort: when the engine should stay out of the way (wrong
/// mode, restricted buffer, manual selection in progress) or data went stale,
/// they silently do nothing rather than surface an error.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<Mutex<SourceRegistry>>,
    state: Arc<Mutex<EngineState>>,
    timers: Timers,
    host: Arc<dyn Host>,
    ranker: Arc<dyn Ranker>,
    auto: Arc<dyn AutoTrigger>,
    config: Arc<config::Config>,
    events: UnboundedSender<EngineEvent>,
}

impl Engine {
    /// Create a new engine and spawn its event pump.
    pub fn new(
        host: Arc<dyn Host>,
        ranker: Arc<dyn Ranker>,
        auto: Arc<dyn AutoTrigger>,
        config: config::Config,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = Self {
            registry: Arc::new(Mutex::new(SourceRegistry::new())),
            state: Arc::new(Mutex::new(EngineState::new())),
            timers: Timers::new(),
            host,
            ranker,
            auto,
            config: Arc::new(config),
            events: tx,
        };

        let pump = engine.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    EngineEvent::SourceUpdated(id) => {
                        trace!(source = %id, "production finished, re-evaluating");
                        pump.display(None);
                    }
                    EngineEvent::Show { offset, items } => pump.handle_show(offset, items),
                }
            }
        });

        engine
    }

    // ---- Registration and mode transitions ----

    /// Register a source. Replaces any source with the same id.
    pub fn register_source(&self, source: Arc<dyn Source>) {
        self.registry.lock().register(source);
    }

    /// Unregister a source by id. Returns true if it was present.
    pub fn unregister_source(&self, id: &str) -> bool {
        self.registry.lock().unregister(id)
    }

    /// Host entered an insert-like mode.
    pub fn enter_insert(&self) {
        self.close();
        self.registry.lock().bump_version();
    }

    /// Host left insert mode.
    pub fn leave_insert(&self) {
        self.close();
        self.registry.lock().bump_version();
    }

    // ---- Trigger coordinator ----

    /// Handle a keystroke or an explicit completion request.
    pub fn complete(&self, manual: bool) {
        if self.is_ignored() {
            self.timers.flush(FILTER_KEY);
            return;
        }
        let ctx = Context::new(
            self.host.cursor_col(),
            self.host.line_before_cursor(),
            manual,
        );
        let (prev, offset, items) = {
            let st = self.state.lock();
            (st.prev_ctx.clone(), st.offset, st.items.clone())
        };

        let was_completing = self.is_completing(&prev);
        if was_completing && !self.host.is_popup_visible() {
            // The host closed the popup out from under us; repaint what we
            // last showed before continuing the cycle.
            debug!(offset, count = items.len(), "popup lost, repainting");
            self.host.render(offset, &items);
        }

        let effective_manual = manual || (was_completing && !self.config.autocomplete);
        if effective_manual || self.auto.should_complete(&prev) {
            let started = self.trigger_sources(&ctx);
            if !started {
                self.display(Some(ctx.clone()));
            }
        } else {
            self.host.close_documentation();
        }

        self.state.lock().prev_ctx = ctx;
    }

    /// Fan a trigger out to every enabled source. Returns true if any source
    /// reports that new production started. A failing source is logged and
    /// skipped; it never aborts the loop.
    fn trigger_sources(&self, ctx: &Context) -> bool {
        if self.is_ignored() {
            return false;
        }
        let mut started = false;
        for src in self.sorted_sources() {
            let update = UpdateSender::new(self.events.clone(), src.id().to_string());
            match src.trigger(ctx, update) {
                Ok(new_production) => started |= new_production,
                Err(err) => warn!(source = src.id(), %err, "source trigger failed"),
            }
        }
        started
    }

    // ---- Display pipeline ----

    /// Schedule a display cycle for `ctx`, or for a fresh snapshot of the
    /// current host state when `ctx` is `None` (source-update re-entry).
    fn display(&self, ctx: Option<Context>) {
        if self.is_ignored() {
            self.timers.flush(FILTER_KEY);
            return;
        }
        let ctx = ctx.unwrap_or_else(|| {
            Context::new(self.host.cursor_col(), self.host.line_before_cursor(), false)
        });
        let sources = self.sorted_sources();

        // Phase A: wait out in-flight sources, bounded by their own timeout.
        let timeout = Duration::from_millis(self.config.source_timeout_ms);
        for src in &sources {
            if src.status() != SourceStatus::Processing {
                continue;
            }
            let elapsed = src.processing_time();
            if elapsed < timeout {
                let remaining = timeout - elapsed;
                trace!(
                    source = src.id(),
                    remaining_ms = remaining.as_millis() as u64,
                    "waiting for processing source"
                );
                let engine = self.clone();
                self.timers.debounce(
                    PROCESSING_KEY,
                    remaining + Duration::from_millis(1),
                    move || engine.display(Some(ctx)),
                );
                return;
            }
        }

        // Phase B: throttle the merge. First paint goes out near-immediately;
        // updates while a list is showing are rate-limited.
        let offset = Self::start_offset_of(&sources, &ctx);
        let delay = if Self::is_completing_of(&sources, &ctx) {
            Duration::from_millis(self.config.throttle_ms)
        } else {
            Duration::from_millis(1)
        };
        let engine = self.clone();
        self.timers.throttle(FILTER_KEY, delay, move || {
            engine.render_pass(&ctx, offset);
        });
    }

    /// The throttled merge/render body.
    fn render_pass(&self, ctx: &Context, scheduled_offset: usize) {
        if self.is_ignored() {
            return;
        }
        let sources = self.sorted_sources();
        if Self::start_offset_of(&sources, ctx) != scheduled_offset {
            trace!(scheduled_offset, "start offset drifted, dropping cycle");
            return;
        }
        let items = {
            let st = self.state.lock();
            merge::merge_candidates(
                &sources,
                ctx,
                scheduled_offset,
                &self.config,
                &st.history,
                self.ranker.as_ref(),
            )
        };
        let event = if items.is_empty() {
            EngineEvent::Show {
                offset: 0,
                items: Vec::new(),
            }
        } else {
            EngineEvent::Show {
                offset: scheduled_offset,
                items,
            }
        };
        let _ = self.events.send(event);
    }

    /// Deferred render handler, run on the pump task so it never executes
    /// inside the host event that triggered it.
    fn handle_show(&self, offset: usize, items: Vec<MergedItem>) {
        if self.is_ignored() {
            return;
        }
        let popup_was_visible = self.host.is_popup_visible();
        {
            let mut st = self.state.lock();
            st.offset = offset;
            st.items = items.clone();
            st.selected = None;
        }
        if !popup_was_visible && items.is_empty() {
            return;
        }

        let preselect = match self.config.preselect {
            config::Preselect::Always => true,
            config::Preselect::Enable => items.first().is_some_and(|i| i.candidate.preselect),
            config::Preselect::Disable => false,
        };

        let prior = self.host.render_mode();
        self.host.set_render_mode(if preselect {
            RenderMode::PreviewInsert
        } else {
            RenderMode::NoAutoSelect
        });
        self.host.render(offset, &items);
        self.host.set_render_mode(prior);

        if preselect && !popup_was_visible {
            self.select(SelectRequest {
                index: 0,
                documentation: true,
            });
        }
        if offset == 0 || items.is_empty() {
            self.host.close_documentation();
        }
    }

    // ---- Selection and confirmation ----

    /// Track the host's popup selection.
    pub fn select(&self, req: SelectRequest) {
        let index = if req.index == -2 { 0 } else { req.index };
        let item = {
            let mut st = self.state.lock();
            let resolved = usize::try_from(index)
                .ok()
                .and_then(|i| st.items.get(i).cloned());
            st.selected.clone_from(&resolved);
            resolved
        };
        let Some(item) = item else { return };
        if req.documentation
            && self.config.documentation
            && let Some(src) = self.source_by_id(&item.candidate.source_id)
        {
            src.documentation(&item);
        }
    }

    /// Confirm the selected candidate: count it in history, delegate the edit
    /// to the owning source, then close.
    pub fn confirm(&self) {
        let selected = self.state.lock().selected.clone();
        if let Some(item) = selected {
            let count = self.state.lock().history.record(item.history_key());
            debug!(label = item.history_key(), count, "candidate confirmed");
            if let Some(src) = self.source_by_id(&item.candidate.source_id) {
                src.confirm(&item);
            }
        }
        self.close();
    }

    /// Idempotent reset: discard all source production, clear the popup and
    /// forget context and selection.
    pub fn close(&self) {
        for src in self.sorted_sources() {
            src.clear();
        }
        {
            let mut st = self.state.lock();
            st.prev_ctx = Context::empty();
            st.offset = 0;
            st.items.clear();
            st.selected = None;
        }
        let _ = self.events.send(EngineEvent::Show {
            offset: 0,
            items: Vec::new(),
        });
    }

    // ---- Read-only helpers ----

    /// Left boundary of a merged list for `ctx`: the minimum completed
    /// source offset, capped at the context column.
    pub fn start_offset(&self, ctx: &Context) -> usize {
        Self::start_offset_of(&self.sorted_sources(), ctx)
    }

    /// True if at least one completed source has a non-empty filtered result
    /// set for `ctx`.
    pub fn is_completing(&self, ctx: &Context) -> bool {
        Self::is_completing_of(&self.sorted_sources(), ctx)
    }

    fn start_offset_of(sources: &[Arc<dyn Source>], ctx: &Context) -> usize {
        sources
            .iter()
            .filter(|s| s.status() == SourceStatus::Completed)
            .map(|s| s.start_offset())
            .chain(std::iter::once(ctx.col))
            .min()
            .unwrap_or(0)
    }

    fn is_completing_of(sources: &[Arc<dyn Source>], ctx: &Context) -> bool {
        sources
            .iter()
            .filter(|s| s.status() == SourceStatus::Completed)
            .any(|s| !s.filtered_items(ctx).is_empty())
    }

    /// True while completion must stay out of the way entirely.
    fn is_ignored(&self) -> bool {
        self.host.manual_selection_active()
            || !self.host.mode().is_insert_like()
            || self.host.buffer_kind().is_restricted()
    }

    fn sorted_sources(&self) -> Vec<Arc<dyn Source>> {
        self.registry.lock().sorted(&self.config)
    }

    fn source_by_id(&self, id: &str) -> Option<Arc<dyn Source>> {
        self.registry.lock().get(id)
    }

    // ---- Introspection (diagnostics/tests) ----

    /// The merged list currently recorded as shown.
    pub fn current_items(&self) -> Vec<MergedItem> {
        self.state.lock().items.clone()
    }

    /// The start offset currently recorded as shown.
    pub fn current_offset(&self) -> usize {
        self.state.lock().offset
    }

    /// The currently selected item, if any.
    pub fn selected_item(&self) -> Option<MergedItem> {
        self.state.lock().selected.clone()
    }

    /// Confirmation count recorded for `label`.
    pub fn history_count(&self, label: &str) -> u64 {
        self.state.lock().history.count(label)
    }

    /// The context stored by the last `complete` call.
    pub fn previous_context(&self) -> Context {
        self.state.lock().prev_ctx.clone()
    }

    /// Current registry version counter.
    pub fn registry_version(&self) -> u64 {
        self.registry.lock().version()
    }
}
