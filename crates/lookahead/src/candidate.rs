//! Selectable search candidates.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// One selectable item offered by the engine.
///
/// Candidates are supplied wholesale by the caller and are never mutated by
/// the engine. `id` is expected to be unique within a candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TypedBuilder)]
pub struct Candidate {
    #[builder(setter(into))]
    pub id: String,
    #[builder(setter(into))]
    pub label: String,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Candidate {
    /// Shorthand for a candidate with only an id and a label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: None,
            description: None,
        }
    }

    /// The searchable fields, label first.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.label.as_str())
            .chain(self.category.as_deref())
            .chain(self.description.as_deref())
    }
}
