use arrow_schema::{Schema, Field, DataType};
use std::sync::Arc;

pub const CHUNK_INDEX_COL: &str = "chunk_index";
pub const CONTENT_COL: &str = "content";
pub const METADATA_COL: &str = "metadata";
pub const VECTOR_COL: &str = "vector";
pub const DISTANCE_COL: &str = "_distance";

/// One row per chunk. `metadata` holds the chunk metadata as a JSON object.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(CHUNK_INDEX_COL, DataType::Int32, false),
		Field::new(CONTENT_COL, DataType::Utf8, false),
		Field::new(METADATA_COL, DataType::Utf8, false),
		Field::new(VECTOR_COL, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
