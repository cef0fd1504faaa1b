use std::path::Path;

use eyre::{Context, Result};
use lookahead::Candidate;
use tracing::debug;

const BUILTIN: &str = include_str!("../assets/technologies.json");

/// The candidate list to search: the JSON file at `path` when given,
/// otherwise the built-in technology catalog.
pub fn load(path: Option<&Path>) -> Result<Vec<Candidate>> {
    let candidates = match path {
        Some(path) => from_file(path)?,
        None => builtin()?,
    };
    debug!(count = candidates.len(), "catalog loaded");
    Ok(candidates)
}

pub fn builtin() -> Result<Vec<Candidate>> {
    serde_json::from_str(BUILTIN).context("built-in catalog is not valid JSON")
}

fn from_file(path: &Path) -> Result<Vec<Candidate>> {
    let contents = fs_err::read_to_string(path)?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse catalog {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_catalog_parses() {
        let candidates = builtin().unwrap();
        assert_eq!(candidates.len(), 20);
        assert_eq!(candidates[0].label, "JavaScript");
        assert!(candidates.iter().all(|c| c.category.is_some()));
    }

    #[test]
    fn loads_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "rs", "label": "Rust"}}]"#).unwrap();

        let candidates = load(Some(file.path())).unwrap();
        assert_eq!(candidates, vec![Candidate::new("rs", "Rust")]);
    }

    #[test]
    fn reports_bad_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("failed to parse catalog"));
    }
}
