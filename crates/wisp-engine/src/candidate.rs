/// One completion suggestion as produced by a source, before merge rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted on confirmation; also the dedup key.
    pub word: String,
    /// Display label. May be empty, in which case the word is shown.
    pub label: String,
    /// Short kind tag (e.g. "fn", "var").
    pub kind: String,
    /// Trailing menu text (e.g. the owning source or a type signature).
    pub menu: String,
    /// When set, this candidate survives dedup even if an earlier candidate
    /// already claimed the same word.
    pub allow_dup: bool,
    /// Ask the presenter to preselect this candidate when it ranks first.
    pub preselect: bool,
    /// Id of the source that produced this candidate.
    pub source_id: String,
}

impl Candidate {
    /// Minimal candidate with only a word, attributed to `source_id`.
    pub fn word(word: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            label: String::new(),
            kind: String::new(),
            menu: String::new(),
            allow_dup: false,
            preselect: false,
            source_id: source_id.into(),
        }
    }
}

/// A candidate after merge rendering: gap-padded and width-trimmed for
/// display in one aligned list. The original candidate is retained for
/// confirmation, documentation and history bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedItem {
    /// Rendered word, left-padded so differing source offsets align.
    pub word: String,
    /// Rendered label, padded and trimmed to the configured width.
    pub label: String,
    /// Rendered kind, trimmed.
    pub kind: String,
    /// Rendered menu, trimmed.
    pub menu: String,
    /// The candidate as the source produced it.
    pub candidate: Candidate,
}

impl MergedItem {
    /// Key under which confirmations of this item are counted: the original
    /// label, or the original word when the label is empty.
    pub fn history_key(&self) -> &str {
        if self.candidate.label.is_empty() {
            &self.candidate.word
        } else {
            &self.candidate.label
        }
    }
}
