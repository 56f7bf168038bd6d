//! Knowledge documents as stored in the vector table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chunk of text with JSON metadata (`type`, `tool`, `name`, `question`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Builder-style metadata insert.
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// A string metadata value, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// A search hit with its cosine similarity (1.0 = identical direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub similarity: f64,
}

/// Metadata containment filter: every key/value here must equal the document's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocFilter(Map<String, Value>);

impl DocFilter {
    /// No restriction.
    pub fn all() -> Self {
        Self::default()
    }

    /// Documents written for one handler (`tool` metadata key).
    pub fn tool(tool: &str) -> Self {
        Self::all().and("tool", tool)
    }

    pub fn and(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The filter as a JSON object, suitable for Postgres `jsonb @>`.
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Whether a document satisfies the filter.
    pub fn matches(&self, doc: &Document) -> bool {
        self.0
            .iter()
            .all(|(k, v)| doc.metadata.get(k).is_some_and(|dv| dv == v))
    }
}
