//! Engine configuration and layered settings loading.
//!
//! Settings are resolved from, in increasing precedence:
//!
//! 1. built-in defaults
//! 2. a TOML file (`config.toml` in the platform config directory, or an
//!    explicit path)
//! 3. `LOOKAHEAD_*` environment variables, with `__` separating sections,
//!    e.g. `LOOKAHEAD_SEARCH__DEBOUNCE_MS=150`

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{
    Config, ConfigError, Environment, File, FileFormat,
    builder::{ConfigBuilder, DefaultState},
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::filter::FilterStrategy;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_MIN_QUERY_LENGTH: usize = 1;
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Tunables of a [`SearchEngine`](crate::SearchEngine).
///
/// Every field is optional in configuration files; anything left out takes
/// its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet interval before a query is searched. Zero searches on every
    /// keystroke.
    #[builder(default = DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,
    /// Queries shorter than this (in characters) produce no results.
    #[builder(default = DEFAULT_MIN_QUERY_LENGTH)]
    pub min_query_length: usize,
    /// Upper bound handed to the filter.
    #[builder(default = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,
    /// Built-in filter to rank with, unless a custom one is installed.
    #[builder(default)]
    pub filter: FilterStrategy,
}

impl EngineConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: EngineConfig,
    /// JSON file with the candidate list. A built-in catalog is used when
    /// unset.
    pub catalog: Option<PathBuf>,
}

impl Settings {
    /// Location of the default settings file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lookahead").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// A builder with the file and environment sources attached.
    ///
    /// An explicit `path` must exist; the default path is optional. Further
    /// overrides can be applied before calling `build()`.
    pub fn builder(path: Option<&Path>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Self::builder_with_env(path, environment())
    }

    fn builder_with_env(
        path: Option<&Path>,
        env: Environment,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    builder = builder.add_source(
                        File::from(path.as_path())
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        Ok(builder.add_source(env))
    }

    /// Load settings from the default locations.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load settings, reading `path` instead of the default file when given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Self::builder(path)?.build()?.try_deserialize()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("LOOKAHEAD")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use super::*;
    use pretty_assertions::assert_eq;

    fn load_with_env(path: Option<&Path>, vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::builder_with_env(path, environment().source(Some(vars)))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.min_query_length, 1);
        assert_eq!(config.max_results, 10);
        assert_eq!(config.filter, FilterStrategy::Relevance);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "catalog = \"/tmp/langs.json\"\n\n[search]\ndebounce_ms = 0\nfilter = \"instant\""
        )
        .unwrap();

        let settings = load_with_env(Some(file.path()), &[]);
        assert_eq!(settings.search.debounce_ms, 0);
        assert_eq!(settings.search.filter, FilterStrategy::Instant);
        assert_eq!(settings.search.max_results, 10);
        assert_eq!(settings.catalog, Some(PathBuf::from("/tmp/langs.json")));
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[search]\nmax_results = 4").unwrap();

        let settings = load_with_env(
            Some(file.path()),
            &[
                ("LOOKAHEAD_SEARCH__MAX_RESULTS", "6"),
                ("LOOKAHEAD_SEARCH__MIN_QUERY_LENGTH", "2"),
            ],
        );
        assert_eq!(settings.search.max_results, 6);
        assert_eq!(settings.search.min_query_length, 2);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = Settings::builder_with_env(Some(&missing), environment())
            .unwrap()
            .build();
        assert!(result.is_err());
    }
}
