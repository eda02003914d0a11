//! Domain types shared by the chunker, the stores and the retriever.

use serde::{Deserialize, Serialize};

/// Free-form metadata attached to text units and chunks (`page`, `source`,
/// `start_index`, ...). Keys are kept sorted so serialization is stable.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// One extracted unit of a source document, typically a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    pub text: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl TextUnit {
    pub fn new(text: impl Into<String>, metadata: Meta) -> Self {
        Self { text: text.into(), metadata }
    }
}

/// A passage of a document that is independently indexed.
///
/// `text` is an exact slice of its source unit; `metadata` carries the unit's
/// metadata plus `start_index`, the character offset of the slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(alias = "page_content")]
    pub text: String,
    #[serde(default)]
    pub metadata: Meta,
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Text,
}

/// The minimal surface returned by both retrieval engines.
///
/// `chunk_index` is the position of the chunk in the document's durable
/// chunk sequence. `score` is engine-specific but higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
    pub source: SourceKind,
}
