//! Terminal stand-in for an editor: renders the popup as plain text lines.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use wisp_engine::{BufferKind, EditorMode, Host, MergedItem, RenderMode};

/// Host bridge that prints render calls to stdout.
pub struct TermHost {
    popup_visible: AtomicBool,
    render_mode: Mutex<RenderMode>,
    cursor: Mutex<(usize, String)>,
}

impl Default for TermHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TermHost {
    pub fn new() -> Self {
        Self {
            popup_visible: AtomicBool::new(false),
            render_mode: Mutex::new(RenderMode::Default),
            cursor: Mutex::new((0, String::new())),
        }
    }

    /// Move the cursor to the end of `typed`.
    pub fn set_line(&self, typed: &str) {
        *self.cursor.lock() = (typed.chars().count(), typed.to_string());
    }
}

impl Host for TermHost {
    fn is_popup_visible(&self) -> bool {
        self.popup_visible.load(Ordering::SeqCst)
    }

    fn render(&self, start_offset: usize, items: &[MergedItem]) {
        self.popup_visible
            .store(!items.is_empty(), Ordering::SeqCst);
        if items.is_empty() {
            println!("-- popup closed --");
            return;
        }
        println!("-- popup at col {start_offset} --");
        for (n, item) in items.iter().enumerate() {
            println!("  {n}: {:<20} {:<6} {}", item.label, item.kind, item.menu);
        }
    }

    fn render_mode(&self) -> RenderMode {
        *self.render_mode.lock()
    }

    fn set_render_mode(&self, mode: RenderMode) {
        *self.render_mode.lock() = mode;
    }

    fn close_documentation(&self) {}

    fn mode(&self) -> EditorMode {
        EditorMode::Insert
    }

    fn buffer_kind(&self) -> BufferKind {
        BufferKind::Normal
    }

    fn manual_selection_active(&self) -> bool {
        false
    }

    fn cursor_col(&self) -> usize {
        self.cursor.lock().0
    }

    fn line_before_cursor(&self) -> String {
        self.cursor.lock().1.clone()
    }
}
