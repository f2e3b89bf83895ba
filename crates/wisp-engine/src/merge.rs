//! Phase B of the display pipeline: fold completed sources' filtered
//! candidates into one aligned, deduped, ranked list.

use std::{collections::HashSet, sync::Arc};

use crate::{Candidate, Context, History, MergedItem, Ranker, Source, SourceStatus};

/// Substring of `s` between character columns `from` and `to`.
fn char_range(s: &str, from: usize, to: usize) -> String {
    s.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// Trim `s` to at most `max` characters.
fn trim_width(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

fn render(candidate: Candidate, gap: &str, cfg: &config::Config) -> MergedItem {
    let shown_label = if candidate.label.is_empty() {
        &candidate.word
    } else {
        &candidate.label
    };
    MergedItem {
        word: format!("{gap}{}", candidate.word),
        label: trim_width(&format!("{gap}{shown_label}"), cfg.max_label_width),
        kind: trim_width(&candidate.kind, cfg.max_kind_width),
        menu: trim_width(&candidate.menu, cfg.max_menu_width),
        candidate,
    }
}

/// Merge completed sources' candidates for one display cycle.
///
/// `sources` must already be the enabled, priority-sorted view and
/// `start_offset` the minimum completed offset capped at the context column.
/// Candidates from a source whose own offset sits right of `start_offset`
/// are left-padded with the text between the two offsets so the rendered
/// list lines up. Duplicate words are dropped unless the later candidate
/// carries `allow_dup`. A non-empty char-exclusive source ends the fold.
pub(crate) fn merge_candidates(
    sources: &[Arc<dyn Source>],
    ctx: &Context,
    start_offset: usize,
    cfg: &config::Config,
    history: &History,
    ranker: &dyn Ranker,
) -> Vec<MergedItem> {
    let mut merged: Vec<MergedItem> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for source in sources {
        if source.status() != SourceStatus::Completed {
            continue;
        }
        let items = source.filtered_items(ctx);
        if items.is_empty() {
            continue;
        }
        let own_offset = source.start_offset().min(ctx.col);
        let gap = char_range(&ctx.typed, start_offset, own_offset);
        for candidate in items {
            if !candidate.allow_dup && !seen.insert(candidate.word.clone()) {
                continue;
            }
            merged.push(render(candidate, &gap, cfg));
        }
        if source.metadata().char_exclusive {
            // Trigger-character sources own the cycle outright.
            break;
        }
    }

    merged.sort_by(|a, b| {
        ranker.compare(a, b).then_with(|| {
            history
                .count(b.history_key())
                .cmp(&history.count(a.history_key()))
        })
    });
    merged
}
