use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};

use pdfqa_core::types::{SearchHit, SourceKind};
use crate::schema::{CHUNK_INDEX_COL, CONTENT_COL, DISTANCE_COL};

/// Cosine nearest neighbours, best first. Score is `1 - distance`.
pub async fn nearest(conn: &Connection, name: &str, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
	let table = conn.open_table(name).execute().await?;
	let mut stream = table.vector_search(query_vec.to_vec())?.distance_type(DistanceType::Cosine).limit(k).execute().await?;
	let mut hits = Vec::new();
	while let Some(batch) = stream.try_next().await? { decode_batch(&batch, &mut hits)?; }
	hits.sort_by(|a, b| b.score.total_cmp(&a.score));
	Ok(hits)
}

fn decode_batch(batch: &RecordBatch, hits: &mut Vec<SearchHit>) -> Result<()> {
	let indices = column::<Int32Array>(batch, CHUNK_INDEX_COL)?;
	let contents = column::<StringArray>(batch, CONTENT_COL)?;
	let distances = column::<Float32Array>(batch, DISTANCE_COL)?;
	for i in 0..batch.num_rows() {
		let chunk_index = usize::try_from(indices.value(i))?;
		hits.push(SearchHit { chunk_index, text: contents.value(i).to_string(), score: 1.0 - distances.value(i), source: SourceKind::Vector });
	}
	Ok(())
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<T>()).ok_or_else(|| anyhow!("column '{}' missing or mistyped", name))
}
