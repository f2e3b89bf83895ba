use tokio::time::Instant;

/// Immutable snapshot of cursor and line state for one completion request.
///
/// A context is built once per `complete` call and never mutated; a newer
/// context supersedes an older one, which is how stale display cycles are
/// detected without any cancellation machinery.
#[derive(Debug, Clone)]
pub struct Context {
    /// Cursor column, counted in characters from the start of the line.
    pub col: usize,
    /// Text of the current line up to the cursor.
    pub typed: String,
    /// Whether the request was started manually by the user.
    pub manual: bool,
    /// When this snapshot was taken.
    pub created: Instant,
}

impl Context {
    /// Snapshot the given cursor/line state.
    pub fn new(col: usize, typed: String, manual: bool) -> Self {
        Self {
            col,
            typed,
            manual,
            created: Instant::now(),
        }
    }

    /// Empty placeholder context, used as the reset value after `close` and
    /// before the first completion request.
    pub fn empty() -> Self {
        Self::new(0, String::new(), false)
    }

    /// True if this is the empty placeholder.
    pub fn is_empty(&self) -> bool {
        self.col == 0 && self.typed.is_empty()
    }
}
