//! End-to-end behaviour of the search engine, driven the way a front-end
//! drives it: keystrokes with timestamps, timer ticks and key presses.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use lookahead::{
    Candidate, EngineConfig, Filter, FilterStrategy, Key, KeyOutcome, Popup, RelevanceFilter,
    SearchEngine,
};
use pretty_assertions::assert_eq;

fn technologies() -> Vec<Candidate> {
    serde_json::from_str(
        r#"[
            {"id": "1", "label": "JavaScript", "category": "Programming Language"},
            {"id": "2", "label": "TypeScript", "category": "Programming Language"},
            {"id": "3", "label": "Python", "category": "Programming Language"},
            {"id": "4", "label": "Java", "category": "Programming Language"},
            {"id": "6", "label": "React", "category": "Frontend Framework",
             "description": "JavaScript library for building user interfaces"},
            {"id": "12", "label": "PostgreSQL", "category": "Database"}
        ]"#,
    )
    .unwrap()
}

fn instant_engine() -> SearchEngine {
    SearchEngine::with_config(
        technologies(),
        EngineConfig::builder().debounce_ms(0).build(),
    )
}

fn labels(engine: &SearchEngine) -> Vec<String> {
    engine.results().iter().map(|c| c.label.clone()).collect()
}

#[test]
fn burst_of_keystrokes_emits_once_with_last_value() {
    for interval in [1, 50, 300, 1000] {
        let quiet = Duration::from_millis(interval);
        let mut engine = SearchEngine::with_config(
            technologies(),
            EngineConfig::builder().debounce_ms(interval).build(),
        );

        let emitted = Arc::new(Mutex::new(Vec::new()));
        let sink = emitted.clone();
        engine
            .on_result_set_change(move |results| sink.lock().unwrap().push(results.query().to_string()))
            .unwrap();

        let start = Instant::now();
        let mut now = start;
        for text in ["p", "py", "pyt", "pyth", "pytho", "python"] {
            engine.set_query(text, now).unwrap();
            engine.advance(now).unwrap();
            now += quiet / 2;
        }
        engine.advance(now + quiet).unwrap();
        engine.advance(now + quiet * 2).unwrap();

        assert_eq!(*emitted.lock().unwrap(), vec!["python".to_string()]);
        assert_eq!(engine.debounced_query(), "python");
    }
}

#[test]
fn filtering_is_deterministic() {
    let candidates = technologies();
    for query in ["", "a", "java", "SCRIPT", "language", "zzz"] {
        let first = RelevanceFilter.filter(&candidates, query, 10).unwrap();
        let second = RelevanceFilter.filter(&candidates, query, 10).unwrap();
        assert_eq!(first, second, "query {query:?}");
    }
}

#[test]
fn cursor_stays_in_bounds() {
    let mut engine = instant_engine();
    engine.set_query("a", Instant::now()).unwrap();
    let len = engine.results().len() as isize;
    assert!(len > 0);

    let presses = [
        Key::ArrowDown,
        Key::ArrowDown,
        Key::ArrowUp,
        Key::ArrowUp,
        Key::ArrowUp,
        Key::ArrowDown,
    ];
    for key in presses.iter().cycle().take(50) {
        engine.handle_key(*key).unwrap();
        let cursor = engine.cursor_index();
        assert!((-1..len).contains(&cursor), "cursor {cursor} out of bounds");
    }
}

#[test]
fn selecting_rewrites_query_to_label() {
    let mut engine = instant_engine();
    engine.set_query("script", Instant::now()).unwrap();
    engine.handle_key(Key::ArrowDown).unwrap();

    let KeyOutcome::Selected(candidate) = engine.handle_key(Key::Enter).unwrap() else {
        panic!("enter on a highlighted row should select it");
    };
    assert_eq!(engine.query(), candidate.label);
    assert_eq!(engine.selection(), Some(&candidate));
    assert_eq!(engine.debounced_query(), candidate.label);
}

#[test]
fn short_query_yields_nothing() {
    let mut engine = SearchEngine::with_config(
        technologies(),
        EngineConfig::builder()
            .debounce_ms(0)
            .min_query_length(2)
            .build(),
    );
    for strategy in [
        FilterStrategy::Relevance,
        FilterStrategy::Instant,
        FilterStrategy::Alphabetical,
    ] {
        engine
            .configure(
                EngineConfig::builder()
                    .debounce_ms(0)
                    .min_query_length(2)
                    .filter(strategy)
                    .build(),
            )
            .unwrap();
        engine.set_query("a", Instant::now()).unwrap();
        assert!(engine.results().is_empty(), "{strategy} returned results");
        engine.set_query("", Instant::now()).unwrap();
    }
}

#[test]
fn exact_match_beats_prefix_match() {
    let mut engine = SearchEngine::with_config(
        vec![Candidate::new("a", "Java"), Candidate::new("b", "JavaScript")],
        EngineConfig::builder().debounce_ms(0).build(),
    );
    engine.set_query("Java", Instant::now()).unwrap();
    assert_eq!(labels(&engine), vec!["Java", "JavaScript"]);
}

#[test]
fn arrow_down_wraps_from_last_row() {
    let mut engine = instant_engine();
    engine.set_query("java", Instant::now()).unwrap();
    let last = engine.results().len() - 1;

    engine.handle_key(Key::ArrowUp).unwrap();
    assert_eq!(engine.cursor(), Some(last));
    assert_eq!(engine.handle_key(Key::ArrowDown).unwrap(), KeyOutcome::Highlighted(0));
}

#[test]
fn escape_keeps_query_and_selection() {
    let mut engine = instant_engine();
    engine.set_query("python", Instant::now()).unwrap();
    engine.confirm(0).unwrap();
    engine.focus().unwrap();
    engine.handle_key(Key::ArrowDown).unwrap();
    assert_eq!(engine.popup(), Popup::Open { highlighted: Some(0) });

    let selection = engine.selection().cloned();
    let query = engine.query().to_string();
    assert_eq!(engine.handle_key(Key::Escape).unwrap(), KeyOutcome::Closed);

    assert_eq!(engine.popup(), Popup::Closed);
    assert_eq!(engine.selection().cloned(), selection);
    assert_eq!(engine.query(), query);
}

#[test]
fn empty_catalog_is_valid() {
    let mut engine = SearchEngine::with_config(
        Vec::new(),
        EngineConfig::builder().debounce_ms(0).build(),
    );
    engine.set_query("rust", Instant::now()).unwrap();
    assert!(engine.results().is_empty());
    assert_eq!(engine.handle_key(Key::ArrowDown).unwrap(), KeyOutcome::Ignored);
    assert_eq!(engine.handle_key(Key::Enter).unwrap(), KeyOutcome::Ignored);
    assert_eq!(engine.cursor_index(), -1);
}
