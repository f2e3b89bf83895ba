//! Scripted mocks and helpers shared by the unit and integration tests.

use std::{
    cmp::Ordering,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering},
    },
    time::Duration,
};

use parking_lot::Mutex;

use crate::{
    AutoTrigger, BufferKind, Candidate, Context, EditorMode, Host, MergedItem, Ranker, RenderMode,
    Result, Source, SourceMetadata, SourceStatus, UpdateSender,
};

/// How a [`MockSource`] responds to `trigger`.
#[derive(Debug, Clone, Copy, Default)]
pub enum TriggerBehavior {
    /// Report that new production started.
    #[default]
    Start,
    /// Report that nothing new started.
    Ignore,
    /// Fail, exercising the engine's per-source fault boundary.
    Fail,
}

#[derive(Default)]
struct MockSourceState {
    status: SourceStatus,
    items: Vec<Candidate>,
    start_offset: usize,
    processing_elapsed: Duration,
    char_exclusive: bool,
    trigger_behavior: TriggerBehavior,
    last_update: Option<UpdateSender>,
}

/// Scripted candidate source recording every engine interaction.
pub struct MockSource {
    id: String,
    priority: i32,
    state: Mutex<MockSourceState>,
    triggers: AtomicUsize,
    clears: AtomicUsize,
    confirmed: Mutex<Vec<MergedItem>>,
    documented: Mutex<Vec<MergedItem>>,
}

impl MockSource {
    /// New idle source whose id and name are both `name`.
    pub fn new(name: &str, priority: i32) -> Self {
        Self {
            id: name.to_string(),
            priority,
            state: Mutex::new(MockSourceState::default()),
            triggers: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
            confirmed: Mutex::new(Vec::new()),
            documented: Mutex::new(Vec::new()),
        }
    }

    /// Script this source as completed with `items` from `start_offset`.
    pub fn set_completed<I>(&self, start_offset: usize, items: I)
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut st = self.state.lock();
        st.status = SourceStatus::Completed;
        st.start_offset = start_offset;
        st.items = items.into_iter().collect();
    }

    /// Script this source as processing for `elapsed` so far.
    pub fn set_processing(&self, start_offset: usize, elapsed: Duration) {
        let mut st = self.state.lock();
        st.status = SourceStatus::Processing;
        st.start_offset = start_offset;
        st.processing_elapsed = elapsed;
    }

    /// Change the scripted start offset without touching anything else.
    pub fn set_start_offset(&self, start_offset: usize) {
        self.state.lock().start_offset = start_offset;
    }

    /// Mark this source as owning cycles it produces for.
    pub fn set_char_exclusive(&self, yes: bool) {
        self.state.lock().char_exclusive = yes;
    }

    /// Script the `trigger` response.
    pub fn set_trigger_behavior(&self, behavior: TriggerBehavior) {
        self.state.lock().trigger_behavior = behavior;
    }

    /// Update handle captured by the most recent `trigger`, for simulating
    /// out-of-band production completion.
    pub fn take_update(&self) -> Option<UpdateSender> {
        self.state.lock().last_update.take()
    }

    /// Number of `trigger` calls seen.
    pub fn trigger_count(&self) -> usize {
        self.triggers.load(AtomicOrdering::SeqCst)
    }

    /// Number of `clear` calls seen.
    pub fn clear_count(&self) -> usize {
        self.clears.load(AtomicOrdering::SeqCst)
    }

    /// Items confirmed through this source.
    pub fn confirmed(&self) -> Vec<MergedItem> {
        self.confirmed.lock().clone()
    }

    /// Items documentation was requested for.
    pub fn documented(&self) -> Vec<MergedItem> {
        self.documented.lock().clone()
    }
}

impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn status(&self) -> SourceStatus {
        self.state.lock().status
    }

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            priority: self.priority,
            char_exclusive: self.state.lock().char_exclusive,
        }
    }

    fn trigger(&self, _ctx: &Context, update: UpdateSender) -> Result<bool> {
        self.triggers.fetch_add(1, AtomicOrdering::SeqCst);
        let mut st = self.state.lock();
        st.last_update = Some(update);
        match st.trigger_behavior {
            TriggerBehavior::Start => Ok(true),
            TriggerBehavior::Ignore => Ok(false),
            TriggerBehavior::Fail => Err(crate::Error::Source(format!(
                "{} refused to trigger",
                self.id
            ))),
        }
    }

    fn filtered_items(&self, _ctx: &Context) -> Vec<Candidate> {
        self.state.lock().items.clone()
    }

    fn start_offset(&self) -> usize {
        self.state.lock().start_offset
    }

    fn processing_time(&self) -> Duration {
        self.state.lock().processing_elapsed
    }

    fn confirm(&self, item: &MergedItem) {
        self.confirmed.lock().push(item.clone());
    }

    fn clear(&self) {
        self.clears.fetch_add(1, AtomicOrdering::SeqCst);
        let mut st = self.state.lock();
        st.status = SourceStatus::Idle;
        st.items.clear();
    }

    fn documentation(&self, item: &MergedItem) {
        self.documented.lock().push(item.clone());
    }
}

/// Scripted host recording render traffic.
pub struct MockHost {
    popup_visible: AtomicBool,
    manual_selection: AtomicBool,
    mode: Mutex<EditorMode>,
    buffer_kind: Mutex<BufferKind>,
    render_mode: Mutex<RenderMode>,
    renders: Mutex<Vec<(usize, Vec<MergedItem>)>>,
    mode_switches: Mutex<Vec<RenderMode>>,
    doc_closes: AtomicUsize,
    cursor: Mutex<(usize, String)>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// New host in insert mode with an empty line and hidden popup.
    pub fn new() -> Self {
        Self {
            popup_visible: AtomicBool::new(false),
            manual_selection: AtomicBool::new(false),
            mode: Mutex::new(EditorMode::Insert),
            buffer_kind: Mutex::new(BufferKind::Normal),
            render_mode: Mutex::new(RenderMode::Default),
            renders: Mutex::new(Vec::new()),
            mode_switches: Mutex::new(Vec::new()),
            doc_closes: AtomicUsize::new(0),
            cursor: Mutex::new((0, String::new())),
        }
    }

    /// Place the cursor at the end of `typed`.
    pub fn set_line(&self, typed: &str) {
        *self.cursor.lock() = (typed.chars().count(), typed.to_string());
    }

    /// Script the editor mode.
    pub fn set_mode(&self, mode: EditorMode) {
        *self.mode.lock() = mode;
    }

    /// Script the buffer kind.
    pub fn set_buffer_kind(&self, kind: BufferKind) {
        *self.buffer_kind.lock() = kind;
    }

    /// Script the manual-selection flag.
    pub fn set_manual_selection(&self, active: bool) {
        self.manual_selection
            .store(active, AtomicOrdering::SeqCst);
    }

    /// Force the popup visibility flag (e.g. simulate the host closing it).
    pub fn set_popup_visible(&self, visible: bool) {
        self.popup_visible.store(visible, AtomicOrdering::SeqCst);
    }

    /// All render calls seen so far.
    pub fn renders(&self) -> Vec<(usize, Vec<MergedItem>)> {
        self.renders.lock().clone()
    }

    /// The most recent render call, if any.
    pub fn last_render(&self) -> Option<(usize, Vec<MergedItem>)> {
        self.renders.lock().last().cloned()
    }

    /// Render-mode switches in call order.
    pub fn mode_switches(&self) -> Vec<RenderMode> {
        self.mode_switches.lock().clone()
    }

    /// Number of documentation-panel close requests.
    pub fn doc_close_count(&self) -> usize {
        self.doc_closes.load(AtomicOrdering::SeqCst)
    }
}

impl Host for MockHost {
    fn is_popup_visible(&self) -> bool {
        self.popup_visible.load(AtomicOrdering::SeqCst)
    }

    fn render(&self, start_offset: usize, items: &[MergedItem]) {
        self.popup_visible
            .store(!items.is_empty(), AtomicOrdering::SeqCst);
        self.renders.lock().push((start_offset, items.to_vec()));
    }

    fn render_mode(&self) -> RenderMode {
        *self.render_mode.lock()
    }

    fn set_render_mode(&self, mode: RenderMode) {
        self.mode_switches.lock().push(mode);
        *self.render_mode.lock() = mode;
    }

    fn close_documentation(&self) {
        self.doc_closes.fetch_add(1, AtomicOrdering::SeqCst);
    }

    fn mode(&self) -> EditorMode {
        *self.mode.lock()
    }

    fn buffer_kind(&self) -> BufferKind {
        *self.buffer_kind.lock()
    }

    fn manual_selection_active(&self) -> bool {
        self.manual_selection.load(AtomicOrdering::SeqCst)
    }

    fn cursor_col(&self) -> usize {
        self.cursor.lock().0
    }

    fn line_before_cursor(&self) -> String {
        self.cursor.lock().1.clone()
    }
}

/// Ranker that treats every pair as equal, leaving merge order in place so
/// tests exercise stability and the history tie-break in isolation.
pub struct StableRanker;

impl Ranker for StableRanker {
    fn compare(&self, _a: &MergedItem, _b: &MergedItem) -> Ordering {
        Ordering::Equal
    }
}

/// Auto-trigger that always starts completion.
pub struct AlwaysComplete;

impl AutoTrigger for AlwaysComplete {
    fn should_complete(&self, _prev: &Context) -> bool {
        true
    }
}

/// Auto-trigger that never starts completion on its own.
pub struct NeverComplete;

impl AutoTrigger for NeverComplete {
    fn should_complete(&self, _prev: &Context) -> bool {
        false
    }
}

/// Build an engine wired to mocks with an always-on auto trigger.
pub fn test_engine(host: Arc<MockHost>, cfg: config::Config) -> crate::Engine {
    crate::Engine::new(host, Arc::new(StableRanker), Arc::new(AlwaysComplete), cfg)
}
