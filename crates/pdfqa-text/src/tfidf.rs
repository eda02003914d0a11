//! TF-IDF ranking over a document's chunks.
//!
//! The query is vectorized together with the chunks (one shared vocabulary,
//! the query counted as the last document). `idf(t) = ln((1 + n) / (1 + df)) + 1`,
//! rows are L2-normalised and the score is the dot product with the query row.
use std::collections::HashMap;

use pdfqa_core::types::{Chunk, SearchHit, SourceKind};

use crate::tantivy_utils::{build_analyzer, tokenize};

type Row = HashMap<String, f32>;

/// Top `k` chunks for `query`, best first. Equal scores keep chunk order. CPU-bound.
pub fn rank(chunks: &[Chunk], query: &str, k: usize) -> Vec<SearchHit> {
	if chunks.is_empty() || k == 0 { return Vec::new(); }
	let mut analyzer = build_analyzer();
	let mut rows: Vec<Row> = chunks.iter().map(|c| term_counts(tokenize(&mut analyzer, &c.text))).collect();
	rows.push(term_counts(tokenize(&mut analyzer, query)));

	let idf = inverse_document_frequency(&rows);
	for row in rows.iter_mut() { weight_and_normalise(row, &idf); }
	let query_row = rows.pop().unwrap_or_default();

	let mut scored: Vec<(usize, f32)> = rows.iter().enumerate().map(|(i, row)| (i, dot(&query_row, row))).collect();
	scored.sort_by(|a, b| b.1.total_cmp(&a.1));
	scored.truncate(k);
	tracing::debug!(chunks = chunks.len(), returned = scored.len(), "lexical ranking");
	scored
		.into_iter()
		.map(|(i, score)| SearchHit { chunk_index: i, text: chunks[i].text.clone(), score, source: SourceKind::Text })
		.collect()
}

fn term_counts(tokens: Vec<String>) -> Row {
	let mut row = Row::new();
	for t in tokens { *row.entry(t).or_insert(0.0) += 1.0; }
	row
}

fn inverse_document_frequency(rows: &[Row]) -> HashMap<String, f32> {
	let mut df: HashMap<&str, usize> = HashMap::new();
	for row in rows { for term in row.keys() { *df.entry(term.as_str()).or_insert(0) += 1; } }
	let n = rows.len() as f32;
	df.into_iter().map(|(term, d)| (term.to_string(), ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0)).collect()
}

fn weight_and_normalise(row: &mut Row, idf: &HashMap<String, f32>) {
	for (term, w) in row.iter_mut() { *w *= idf.get(term).copied().unwrap_or(1.0); }
	let norm = row.values().map(|w| w * w).sum::<f32>().sqrt();
	if norm > 0.0 { for w in row.values_mut() { *w /= norm; } }
}

fn dot(a: &Row, b: &Row) -> f32 {
	let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
	small.iter().filter_map(|(t, w)| large.get(t).map(|v| w * v)).sum()
}
