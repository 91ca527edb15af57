//! A search box in a terminal: simulated keystrokes feed a debounced,
//! timeout-bounded and retried lookup against a slow fake backend.
//!
//! Run with `cargo run --example debounced_search`.

use std::{
  sync::atomic::{AtomicUsize, Ordering},
  sync::Arc,
};

use rxsearch::prelude::*;

const WORDS: &[&str] = &["cat", "catalog", "category", "dog", "dogma", "door"];

/// Pretends to be a remote service: every third request stalls past the
/// timeout, so some searches only succeed on a retry.
async fn lookup(query: String, request: usize) -> Result<Vec<&'static str>, String> {
  let latency = if request % 3 == 0 { 400 } else { 60 };
  tokio::time::sleep(Duration::from_millis(latency)).await;
  if query.contains('!') {
    return Err(format!("invalid query {query:?}"));
  }
  Ok(WORDS.iter().copied().filter(|w| w.starts_with(query.as_str())).collect())
}

struct Terminal;

impl ResultSink<Vec<&'static str>, CallError<String>> for Terminal {
  fn on_results(&mut self, results: Vec<&'static str>) { println!("  results: {results:?}") }

  fn on_error(&mut self, err: CallError<String>) { println!("  error: {err}") }
}

#[tokio::main]
async fn main() {
  let scheduler = TokioScheduler::current();
  let keystrokes = EventEmitter::<String>::new();
  let requests = Arc::new(AtomicUsize::new(0));

  let spawner = scheduler.clone();
  let results = observable::from_event::<_, std::convert::Infallible, _>(keystrokes.clone())
    .tap(|text| println!("typed {text:?}"))
    .call_service(
      move |query: String| {
        let requests = requests.clone();
        observable::from_async(
          move || {
            let request = requests.fetch_add(1, Ordering::Relaxed) + 1;
            println!("  -> request #{request} for {query:?}");
            lookup(query, request)
          },
          spawner.clone(),
        )
      },
      scheduler.clone(),
      ServiceCallConfig::default().with_throttle(Duration::from_millis(150)),
    );
  let binding = bind_sink(results, Terminal);

  let typing: &[(&str, u64)] = &[
    ("c", 40),
    ("ca", 40),
    ("cat", 400),
    ("d", 40),
    ("do", 300),
    ("door!", 600),
    ("dog", 600),
  ];
  for (text, pause) in typing {
    keystrokes.raise(text.to_string());
    tokio::time::sleep(Duration::from_millis(*pause)).await;
  }

  binding.unsubscribe();
  println!("handlers left: {}", keystrokes.handler_count());
}
