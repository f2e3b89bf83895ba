//! Demo candidate sources backed by static word lists.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;
use wisp_engine::{
    Candidate, Context, MergedItem, Result, Source, SourceMetadata, SourceStatus, UpdateSender,
};

/// Character column where the word under the cursor begins.
fn word_start(typed: &str) -> usize {
    let chars: Vec<char> = typed.chars().collect();
    chars
        .iter()
        .rposition(|c| !c.is_alphanumeric() && *c != '_')
        .map(|p| p + 1)
        .unwrap_or(0)
}

#[derive(Default)]
struct WordListState {
    status: SourceStatus,
    start_offset: usize,
    items: Vec<Candidate>,
    processing_since: Option<Instant>,
}

/// Word-list source. With a zero latency it completes synchronously inside
/// `trigger`; with a latency it goes `Processing` and reports back through
/// the update queue, standing in for an external producer.
pub struct WordListSource {
    id: String,
    priority: i32,
    latency: Duration,
    words: Vec<String>,
    state: Arc<Mutex<WordListState>>,
}

impl WordListSource {
    /// Build a source named `id` over `words`.
    pub fn new(id: &str, priority: i32, latency: Duration, words: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            priority,
            latency,
            words: words.iter().map(|w| w.to_string()).collect(),
            state: Arc::new(Mutex::new(WordListState::default())),
        }
    }

    fn produce(&self, ctx: &Context) -> (usize, Vec<Candidate>) {
        let offset = word_start(&ctx.typed);
        let prefix: String = ctx.typed.chars().skip(offset).collect();
        let items = self
            .words
            .iter()
            .filter(|w| !prefix.is_empty() && w.starts_with(&prefix) && **w != prefix)
            .map(|w| {
                let mut cand = Candidate::word(w.clone(), self.id.clone());
                cand.kind = "word".into();
                cand.menu = format!("[{}]", self.id);
                cand
            })
            .collect();
        (offset, items)
    }
}

impl Source for WordListSource {
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
            char_exclusive: false,
        }
    }

    fn trigger(&self, ctx: &Context, update: UpdateSender) -> Result<bool> {
        let (offset, items) = self.produce(ctx);
        if self.latency.is_zero() {
            let mut st = self.state.lock();
            st.status = SourceStatus::Completed;
            st.start_offset = offset;
            st.items = items;
            // Results are already in place; nothing asynchronous started.
            return Ok(false);
        }

        {
            let mut st = self.state.lock();
            st.status = SourceStatus::Processing;
            st.start_offset = offset;
            st.processing_since = Some(Instant::now());
        }
        let state = self.state.clone();
        let latency = self.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            {
                let mut st = state.lock();
                // A clear() while we slept wins; stay idle then.
                if st.status != SourceStatus::Processing {
                    return;
                }
                st.status = SourceStatus::Completed;
                st.items = items;
                st.processing_since = None;
            }
            update.notify();
        });
        Ok(true)
    }

    fn filtered_items(&self, ctx: &Context) -> Vec<Candidate> {
        let st = self.state.lock();
        let prefix: String = ctx.typed.chars().skip(st.start_offset).collect();
        st.items
            .iter()
            .filter(|c| c.word.starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn start_offset(&self) -> usize {
        self.state.lock().start_offset
    }

    fn processing_time(&self) -> Duration {
        self.state
            .lock()
            .processing_since
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    fn confirm(&self, item: &MergedItem) {
        println!(">> inserted '{}'", item.word);
    }

    fn clear(&self) {
        let mut st = self.state.lock();
        st.status = SourceStatus::Idle;
        st.items.clear();
        st.processing_since = None;
    }

    fn documentation(&self, item: &MergedItem) {
        println!(">> doc: '{}' comes from the {} word list", item.word, self.id);
    }
}
