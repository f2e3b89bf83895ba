//! Abstractions over the engine's external collaborators.
//!
//! The engine talks to the editor exclusively through [`Host`], ranks merged
//! candidates through an opaque [`Ranker`], and defers the "should typing
//! start a completion?" decision to an [`AutoTrigger`]. Tests substitute
//! mocks for all three.

use std::cmp::Ordering;

use crate::{Context, MergedItem};

/// Popup render mode requested around a render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Host default behavior.
    #[default]
    Default,
    /// Show the list without selecting anything.
    NoAutoSelect,
    /// Select the first entry and preview-insert it.
    PreviewInsert,
}

/// Editor mode as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// Regular insert mode.
    Insert,
    /// Replace mode; treated as insert-like.
    Replace,
    /// Normal/visual/etc.
    Normal,
    /// Command-line or other non-editing mode.
    Command,
}

impl EditorMode {
    /// True for modes in which completion may run.
    pub fn is_insert_like(self) -> bool {
        matches!(self, Self::Insert | Self::Replace)
    }
}

/// Kind of the buffer under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Ordinary editable buffer.
    Normal,
    /// Prompt-style buffer (search box, command palette).
    Prompt,
    /// Read-only or special-purpose buffer.
    Restricted,
}

impl BufferKind {
    /// True if completion must stay out of this buffer.
    pub fn is_restricted(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Bridge to the editor's popup, documentation panel and cursor state.
pub trait Host: Send + Sync {
    /// Whether the completion popup is currently on screen.
    fn is_popup_visible(&self) -> bool;

    /// Render `items` with their left boundary at `start_offset`.
    fn render(&self, start_offset: usize, items: &[MergedItem]);

    /// Current popup render mode.
    fn render_mode(&self) -> RenderMode;

    /// Switch the popup render mode.
    fn set_render_mode(&self, mode: RenderMode);

    /// Close the documentation panel if open.
    fn close_documentation(&self);

    /// Current editor mode.
    fn mode(&self) -> EditorMode;

    /// Kind of the buffer under the cursor.
    fn buffer_kind(&self) -> BufferKind;

    /// True while the user is moving through the popup by hand; the engine
    /// must not disturb the list then.
    fn manual_selection_active(&self) -> bool;

    /// Cursor column in characters.
    fn cursor_col(&self) -> usize;

    /// Text of the current line up to the cursor.
    fn line_before_cursor(&self) -> String;
}

/// Opaque ranking comparator over merged candidates.
///
/// The engine stable-sorts with this comparator and breaks its ties with
/// confirmation history; what "better" means is entirely the ranker's call.
pub trait Ranker: Send + Sync {
    /// Order `a` against `b`; `Ordering::Less` ranks `a` higher.
    fn compare(&self, a: &MergedItem, b: &MergedItem) -> Ordering;
}

/// Decides whether an automatic (non-manual) keystroke should start
/// completion, judged against the previous request's context.
pub trait AutoTrigger: Send + Sync {
    /// True if sources should start producing for the keystroke that
    /// followed `prev`.
    fn should_complete(&self, prev: &Context) -> bool;
}
