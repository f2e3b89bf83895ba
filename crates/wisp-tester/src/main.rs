//! Interactive driver for the wisp engine.
//!
//! Reads lines from stdin. A plain line becomes the text before the cursor
//! and triggers a completion cycle; `:sel N`, `:confirm`, `:close` and
//! `:quit` drive selection.

use std::{cmp::Ordering, sync::Arc, time::Duration};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use wisp_engine::{AutoTrigger, Context, Engine, MergedItem, Ranker, SelectRequest};

mod host;
mod sources;

use host::TermHost;
use sources::WordListSource;

/// CLI arguments.
#[derive(Debug, Parser)]
#[command(name = "wisp-tester", about = "Exercise the wisp engine from a terminal")]
struct Args {
    /// Simulated latency of the slow demo source, in milliseconds.
    #[arg(long, default_value_t = 120)]
    slow_ms: u64,

    #[command(flatten)]
    logs: logging::LogArgs,
}

/// Shorter candidates first, alphabetical inside a length class.
struct PrefixRanker;

impl Ranker for PrefixRanker {
    fn compare(&self, a: &MergedItem, b: &MergedItem) -> Ordering {
        a.word
            .chars()
            .count()
            .cmp(&b.word.chars().count())
            .then_with(|| a.word.cmp(&b.word))
    }
}

/// Start automatically once at least one character of a word is typed.
struct TypingTrigger;

impl AutoTrigger for TypingTrigger {
    fn should_complete(&self, prev: &Context) -> bool {
        prev.col > 0
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init(&args.logs);

    let host = Arc::new(TermHost::new());
    let engine = Engine::new(
        host.clone(),
        Arc::new(PrefixRanker),
        Arc::new(TypingTrigger),
        config::Config::default(),
    );
    engine.register_source(Arc::new(WordListSource::new(
        "keywords",
        10,
        Duration::ZERO,
        &["match", "module", "mutable", "public", "private", "return", "static", "struct"],
    )));
    engine.register_source(Arc::new(WordListSource::new(
        "dictionary",
        5,
        Duration::from_millis(args.slow_ms),
        &["matcher", "matching", "returning", "structure", "publisher"],
    )));
    engine.enter_insert();
    info!("wisp-tester ready; type text, or :sel N / :confirm / :close / :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim() {
            ":quit" => break,
            ":close" => engine.close(),
            ":confirm" => engine.confirm(),
            cmd if cmd.starts_with(":sel ") => match cmd[5..].trim().parse::<i32>() {
                Ok(index) => engine.select(SelectRequest {
                    index,
                    documentation: true,
                }),
                Err(_) => println!(">> usage: :sel N"),
            },
            text => {
                host.set_line(text);
                engine.complete(false);
            }
        }
        // Give staged timers and the pump a moment so output lands before
        // the next prompt.
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    engine.leave_insert();
}
