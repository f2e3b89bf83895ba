use std::collections::HashMap;

/// Confirmation counts per candidate label, kept for the engine's lifetime.
///
/// Counts only ever go up; they feed the ranking tie-break so words the user
/// actually picks float toward the top over a session.
#[derive(Debug, Default, Clone)]
pub struct History {
    counts: HashMap<String, u64>,
}

impl History {
    /// Record one confirmation of `label`, returning the new count.
    pub fn record(&mut self, label: &str) -> u64 {
        let count = self.counts.entry(label.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Confirmation count for `label` (0 if never confirmed).
    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }
}
