use anyhow::{anyhow, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::table::AddDataMode;
use lancedb::Connection;
use std::sync::Arc;

use pdfqa_core::types::Chunk;
use crate::schema::build_arrow_schema;
use crate::table::table_exists;

/// Replace the contents of table `name` with `chunks` and their vectors.
pub async fn write_table(conn: &Connection, name: &str, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<usize> {
	let record_batch = chunks_to_record_batch(chunks, vectors)?;
	let schema = record_batch.schema();
	let rows = record_batch.num_rows();
	let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
	if table_exists(conn, name).await? {
		conn.open_table(name).execute().await?.add(reader).mode(AddDataMode::Overwrite).execute().await?;
	} else {
		conn.create_table(name, reader).execute().await?;
	}
	tracing::debug!(table = name, rows, "wrote vector table");
	Ok(rows)
}

pub fn chunks_to_record_batch(chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
	if chunks.len() != vectors.len() {
		return Err(anyhow!("{} chunks but {} vectors", chunks.len(), vectors.len()));
	}
	let dim = vectors.first().map(Vec::len).ok_or_else(|| anyhow!("no vectors to write"))?;
	if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
		return Err(anyhow!("vectors must share one non-zero dimension"));
	}
	let dim_i32 = i32::try_from(dim)?;
	let mut chunk_indices = Vec::with_capacity(chunks.len()); let mut contents = Vec::with_capacity(chunks.len()); let mut metadata = Vec::with_capacity(chunks.len());
	for (i, chunk) in chunks.iter().enumerate() {
		chunk_indices.push(i32::try_from(i)?);
		contents.push(chunk.text.clone());
		metadata.push(serde_json::to_string(&chunk.metadata)?);
	}
	let vectors: Vec<Option<Vec<Option<f32>>>> = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect())).collect();
	let record_batch = RecordBatch::try_new(build_arrow_schema(dim_i32), vec![
		Arc::new(Int32Array::from(chunk_indices)),
		Arc::new(StringArray::from(contents)),
		Arc::new(StringArray::from(metadata)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim_i32)),
	])?;
	Ok(record_batch)
}
