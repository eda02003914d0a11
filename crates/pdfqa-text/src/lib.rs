pub mod store;
pub mod tantivy_utils;
pub mod tfidf;

pub use store::{ChunkStore, CHUNKS_FILE};
pub use tfidf::rank;
