use std::{
    io::{Write, stdout},
    time::Instant,
};

use eyre::Result;
use lookahead::{Candidate, SearchEngine, Settings};

use crate::catalog;

pub fn run(settings: &Settings, text: &str, json: bool) -> Result<()> {
    let candidates = catalog::load(settings.catalog.as_deref())?;
    let results = rank(settings, candidates, text)?;

    let mut out = stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &results)?;
        writeln!(out)?;
    } else {
        for line in format_lines(&results) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

/// Search `candidates` for `text` once, without waiting for a quiet interval.
fn rank(settings: &Settings, candidates: Vec<Candidate>, text: &str) -> Result<Vec<Candidate>> {
    let mut engine = SearchEngine::with_config(candidates, settings.search.clone());
    engine.set_query(text, Instant::now())?;
    engine.flush()?;
    let results = engine.results().candidates().to_vec();
    engine.dispose();
    Ok(results)
}

fn format_lines(results: &[Candidate]) -> Vec<String> {
    results
        .iter()
        .map(|candidate| match &candidate.category {
            Some(category) => format!("{}\t{}", candidate.label, category),
            None => candidate.label.clone(),
        })
        .collect()
}
