use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use wisp_engine::{
    BufferKind, Candidate, Context, EditorMode, Engine, Host, RenderMode, SelectRequest,
    test_support::{MockHost, MockSource, TriggerBehavior, test_engine},
};

/// Let scheduled timers fire and the event pump drain, on the paused clock.
async fn settle() {
    sleep(Duration::from_millis(5)).await;
}

fn items(words: &[&str], source: &str) -> Vec<Candidate> {
    words.iter().map(|w| Candidate::word(*w, source)).collect()
}

/// Source scripted as already completed, so `complete` falls straight
/// through to the display pipeline.
fn completed_source(name: &str, priority: i32, offset: usize, words: &[&str]) -> Arc<MockSource> {
    let src = MockSource::new(name, priority);
    src.set_trigger_behavior(TriggerBehavior::Ignore);
    src.set_completed(offset, items(words, name));
    Arc::new(src)
}

fn engine_with(host: &Arc<MockHost>, cfg: config::Config) -> Engine {
    test_engine(host.clone(), cfg)
}

#[tokio::test(start_paused = true)]
async fn complete_renders_merged_candidates() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let engine = engine_with(&host, config::Config::default());
    engine.register_source(completed_source("buffer", 1, 0, &["foo", "fob"]));

    engine.complete(false);
    settle().await;

    let (offset, rendered) = host.last_render().expect("one render");
    assert_eq!(offset, 0);
    let words: Vec<&str> = rendered.iter().map(|i| i.word.as_str()).collect();
    assert_eq!(words, vec!["foo", "fob"]);
    assert_eq!(engine.current_offset(), 0);
    assert_eq!(engine.current_items().len(), 2);
    assert!(host.is_popup_visible());
    // Scoped render-mode toggle: switch for the render, then restore.
    assert_eq!(
        host.mode_switches(),
        vec![RenderMode::NoAutoSelect, RenderMode::Default]
    );
}

#[tokio::test(start_paused = true)]
async fn ignore_predicate_blocks_every_entry_point() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    host.set_mode(EditorMode::Normal);
    let engine = engine_with(&host, config::Config::default());
    let src = completed_source("buffer", 1, 0, &["foo"]);
    engine.register_source(src.clone());

    engine.complete(false);
    settle().await;
    assert_eq!(src.trigger_count(), 0);
    assert!(host.renders().is_empty());

    host.set_mode(EditorMode::Insert);
    host.set_buffer_kind(BufferKind::Prompt);
    engine.complete(false);
    settle().await;
    assert!(host.renders().is_empty());

    host.set_buffer_kind(BufferKind::Normal);
    host.set_manual_selection(true);
    engine.complete(false);
    settle().await;
    assert!(host.renders().is_empty());
}

#[tokio::test(start_paused = true)]
async fn start_offset_is_min_of_completed_sources_capped_at_column() {
    let host = Arc::new(MockHost::new());
    host.set_line("abcd");
    let engine = engine_with(&host, config::Config::default());
    engine.register_source(completed_source("near", 1, 3, &["d"]));
    let far = MockSource::new("far", 2);
    far.set_processing(1, Duration::ZERO);
    engine.register_source(Arc::new(far));

    // Processing sources do not contribute an offset.
    assert_eq!(engine.start_offset(&Context::new(4, "abcd".into(), false)), 3);

    engine.register_source(completed_source("wide", 3, 1, &["bcd"]));
    assert_eq!(engine.start_offset(&Context::new(4, "abcd".into(), false)), 1);
    // Capped at the context column.
    assert_eq!(engine.start_offset(&Context::new(0, String::new(), false)), 0);
    assert!(engine.is_completing(&Context::new(4, "abcd".into(), false)));
}

#[tokio::test(start_paused = true)]
async fn stale_offset_drops_the_cycle() {
    let host = Arc::new(MockHost::new());
    host.set_line("abcde");
    let engine = engine_with(&host, config::Config::default());
    let src = completed_source("buffer", 1, 2, &["cdef"]);
    engine.register_source(src.clone());

    engine.complete(false);
    settle().await;
    assert_eq!(host.renders().len(), 1);

    // Second cycle lands in the open throttle window; its offset drifts
    // before the trailing edge fires, so nothing further may render.
    src.set_start_offset(3);
    engine.complete(false);
    src.set_start_offset(4);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(host.renders().len(), 1, "stale cycle must not render");
}

#[tokio::test(start_paused = true)]
async fn processing_source_postpones_rendering() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let engine = engine_with(&host, config::Config::default());
    let fast = completed_source("buffer", 1, 0, &["foo"]);
    let slow = MockSource::new("lsp", 10);
    slow.set_trigger_behavior(TriggerBehavior::Ignore);
    slow.set_processing(0, Duration::ZERO);
    let slow = Arc::new(slow);
    engine.register_source(fast.clone());
    engine.register_source(slow.clone());

    engine.complete(false);
    sleep(Duration::from_millis(50)).await;
    assert!(
        host.renders().is_empty(),
        "render must wait for the processing source"
    );

    // The source never completes, but its timeout budget runs out; rendering
    // proceeds without it.
    slow.set_processing(0, Duration::from_millis(600));
    sleep(Duration::from_millis(600)).await;
    let (_, rendered) = host.last_render().expect("render after timeout");
    let words: Vec<&str> = rendered.iter().map(|i| i.word.as_str()).collect();
    assert_eq!(words, vec!["foo"]);
}

#[tokio::test(start_paused = true)]
async fn async_production_reenters_through_the_queue() {
    let host = Arc::new(MockHost::new());
    host.set_line("pu");
    let engine = engine_with(&host, config::Config::default());
    let flaky = MockSource::new("broken", 99);
    flaky.set_trigger_behavior(TriggerBehavior::Fail);
    let flaky = Arc::new(flaky);
    let lsp = Arc::new(MockSource::new("lsp", 10));
    engine.register_source(flaky.clone());
    engine.register_source(lsp.clone());

    engine.complete(false);
    settle().await;
    // The failing source is isolated: both were triggered, nothing rendered
    // yet because production is still pending.
    assert_eq!(flaky.trigger_count(), 1);
    assert_eq!(lsp.trigger_count(), 1);
    assert!(host.renders().is_empty());

    // Production finishes out of band and pings the engine back.
    lsp.set_completed(0, items(&["push", "pull"], "lsp"));
    lsp.take_update().expect("update handle captured").notify();
    settle().await;
    let (_, rendered) = host.last_render().expect("render after update");
    assert_eq!(rendered.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn confirm_counts_history_and_delegates_to_the_source() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let engine = engine_with(&host, config::Config::default());
    let src = completed_source("buffer", 1, 0, &["foo"]);
    engine.register_source(src.clone());

    for round in 1u64..=2 {
        engine.complete(false);
        settle().await;
        engine.select(SelectRequest {
            index: 0,
            documentation: false,
        });
        engine.confirm();
        settle().await;
        assert_eq!(engine.history_count("foo"), round);
        assert_eq!(src.confirmed().len(), round as usize);
        // confirm always closes, selection included.
        assert!(engine.selected_item().is_none());
        assert_eq!(engine.current_offset(), 0);
        // Re-arm the source; close() cleared its production.
        src.set_completed(0, items(&["foo"], "buffer"));
    }
}

#[tokio::test(start_paused = true)]
async fn close_resets_everything_from_any_state() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let engine = engine_with(&host, config::Config::default());
    let src = completed_source("buffer", 1, 0, &["foo", "fob"]);
    engine.register_source(src.clone());

    engine.complete(false);
    settle().await;
    engine.select(SelectRequest {
        index: 1,
        documentation: false,
    });
    assert!(engine.selected_item().is_some());

    engine.close();
    settle().await;
    assert_eq!(engine.current_offset(), 0);
    assert!(engine.current_items().is_empty());
    assert!(engine.selected_item().is_none());
    assert!(engine.previous_context().is_empty());
    assert!(src.clear_count() >= 1);
    let (offset, rendered) = host.last_render().expect("clearing render");
    assert_eq!(offset, 0);
    assert!(rendered.is_empty());
    assert!(!host.is_popup_visible());

    // Idempotent: a second close is harmless.
    engine.close();
    settle().await;
    assert_eq!(engine.current_offset(), 0);
}

#[tokio::test(start_paused = true)]
async fn preselect_always_selects_and_documents_the_first_item() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let cfg = config::Config {
        preselect: config::Preselect::Always,
        ..config::Config::default()
    };
    let engine = engine_with(&host, cfg);
    let src = completed_source("buffer", 1, 0, &["foo", "fob"]);
    engine.register_source(src.clone());

    engine.complete(false);
    settle().await;

    assert_eq!(
        host.mode_switches(),
        vec![RenderMode::PreviewInsert, RenderMode::Default]
    );
    let selected = engine.selected_item().expect("preselected first item");
    assert_eq!(selected.candidate.word, "foo");
    assert_eq!(src.documented().len(), 1, "documentation requested");
}

#[tokio::test(start_paused = true)]
async fn select_sentinel_and_out_of_range() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let engine = engine_with(&host, config::Config::default());
    engine.register_source(completed_source("buffer", 1, 0, &["foo", "fob"]));

    engine.complete(false);
    settle().await;

    engine.select(SelectRequest {
        index: -2,
        documentation: false,
    });
    assert_eq!(
        engine.selected_item().expect("sentinel selects first").candidate.word,
        "foo"
    );

    engine.select(SelectRequest {
        index: -1,
        documentation: false,
    });
    assert!(engine.selected_item().is_none());

    engine.select(SelectRequest {
        index: 99,
        documentation: false,
    });
    assert!(engine.selected_item().is_none());
}

#[tokio::test(start_paused = true)]
async fn popup_lost_is_repainted_before_the_next_cycle() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let engine = engine_with(&host, config::Config::default());
    engine.register_source(completed_source("buffer", 1, 0, &["foo"]));

    engine.complete(false);
    settle().await;
    let shown = host.last_render().expect("initial render");

    // The host closed the popup behind our back.
    host.set_popup_visible(false);
    engine.complete(false);
    let repaint = host.renders()[1].clone();
    assert_eq!(repaint, shown, "recovery repaints the last known list");
}

#[tokio::test(start_paused = true)]
async fn empty_merge_closes_popup_and_documentation() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let engine = engine_with(&host, config::Config::default());
    let src = completed_source("buffer", 1, 0, &["foo"]);
    engine.register_source(src.clone());

    engine.complete(false);
    settle().await;
    assert!(host.is_popup_visible());
    let closes_before = host.doc_close_count();

    src.set_completed(0, Vec::new());
    engine.complete(false);
    sleep(Duration::from_millis(200)).await;
    let (offset, rendered) = host.last_render().expect("closing render");
    assert_eq!(offset, 0);
    assert!(rendered.is_empty());
    assert!(!host.is_popup_visible());
    assert!(host.doc_close_count() > closes_before);
}

#[tokio::test(start_paused = true)]
async fn insert_transitions_close_and_bump_the_registry() {
    let host = Arc::new(MockHost::new());
    let engine = engine_with(&host, config::Config::default());
    let src = completed_source("buffer", 1, 0, &["foo"]);
    engine.register_source(src.clone());

    let v0 = engine.registry_version();
    engine.enter_insert();
    assert!(engine.registry_version() > v0);
    assert!(src.clear_count() >= 1);

    let v1 = engine.registry_version();
    engine.leave_insert();
    assert!(engine.registry_version() > v1);
}

#[tokio::test(start_paused = true)]
async fn manual_override_when_autocomplete_is_disabled() {
    let host = Arc::new(MockHost::new());
    host.set_line("fo");
    let cfg = config::Config {
        autocomplete: false,
        ..config::Config::default()
    };
    let engine = Engine::new(
        host.clone(),
        Arc::new(wisp_engine::test_support::StableRanker),
        Arc::new(wisp_engine::test_support::NeverComplete),
        cfg,
    );
    let src = Arc::new(MockSource::new("buffer", 1));
    engine.register_source(src.clone());

    // Not manual, nothing completing yet, auto says no: sources stay quiet
    // and the documentation panel is told to close.
    engine.complete(false);
    settle().await;
    assert_eq!(src.trigger_count(), 0);
    assert_eq!(host.doc_close_count(), 1);

    // A manual request goes through and production finishes asynchronously.
    engine.complete(true);
    settle().await;
    assert_eq!(src.trigger_count(), 1);
    src.set_completed(0, items(&["foo"], "buffer"));
    src.take_update().expect("update handle").notify();
    settle().await;
    assert!(host.last_render().is_some());

    // With a completion visibly in flight, a plain keystroke keeps the
    // session alive even though autocomplete is off.
    engine.complete(false);
    settle().await;
    assert_eq!(src.trigger_count(), 2);
}
