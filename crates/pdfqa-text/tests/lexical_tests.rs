use pdfqa_core::types::{Chunk, Meta, SourceKind};
use pdfqa_text::{rank, ChunkStore, CHUNKS_FILE};
use tempfile::TempDir;

fn chunk(text: &str, page: u64) -> Chunk {
	let mut metadata = Meta::new();
	metadata.insert("source".into(), "notes.pdf".into());
	metadata.insert("page".into(), page.into());
	Chunk { text: text.to_string(), metadata }
}

fn corpus() -> Vec<Chunk> {
	vec![
		chunk("Solar panels convert sunlight into electricity for the homestead.", 0),
		chunk("Rainwater is collected in barrels and filtered before use.", 0),
		chunk("Chickens need a dry coop and fresh water every day.", 1),
		chunk("The zygomorphic flowers attract bees to the garden.", 1),
		chunk("Batteries store electricity from the solar panels overnight.", 2),
	]
}

#[test]
fn store_round_trip_and_missing() {
	let tmp = TempDir::new().unwrap();
	let store = ChunkStore::in_area(tmp.path());
	assert!(!store.exists());
	assert!(store.read().unwrap().is_none());

	let chunks = corpus();
	store.write(&chunks).unwrap();
	assert!(tmp.path().join(CHUNKS_FILE).is_file());
	assert_eq!(store.read().unwrap().unwrap(), chunks);

	store.write(&chunks[..2]).unwrap();
	assert_eq!(store.read().unwrap().unwrap().len(), 2, "rewrite replaces previous sequence");
}

#[test]
fn store_accepts_page_content_records() {
	let tmp = TempDir::new().unwrap();
	std::fs::write(
		tmp.path().join(CHUNKS_FILE),
		r#"[{"page_content": "hello there", "metadata": {"page": 3}}]"#,
	)
	.unwrap();
	let chunks = ChunkStore::in_area(tmp.path()).read().unwrap().unwrap();
	assert_eq!(chunks[0].text, "hello there");
	assert_eq!(chunks[0].metadata["page"], 3);
}

#[test]
fn corrupt_store_is_an_error() {
	let tmp = TempDir::new().unwrap();
	std::fs::write(tmp.path().join(CHUNKS_FILE), "{not json").unwrap();
	assert!(ChunkStore::in_area(tmp.path()).read().is_err());
}

#[test]
fn unique_term_ranks_first() {
	let hits = rank(&corpus(), "Which flowers are zygomorphic?", 4);
	assert_eq!(hits.len(), 4);
	assert_eq!(hits[0].chunk_index, 3);
	assert!(hits[0].score > hits[1].score);
	assert!(hits.iter().all(|h| h.source == SourceKind::Text));
	for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }
}

#[test]
fn returns_min_k_n_and_is_deterministic() {
	let chunks = corpus();
	assert_eq!(rank(&chunks, "solar electricity", 10).len(), chunks.len());
	assert!(rank(&chunks, "solar electricity", 0).is_empty());
	assert!(rank(&[], "solar", 4).is_empty());

	let a: Vec<usize> = rank(&chunks, "solar electricity", 3).iter().map(|h| h.chunk_index).collect();
	let b: Vec<usize> = rank(&chunks, "solar electricity", 3).iter().map(|h| h.chunk_index).collect();
	assert_eq!(a, b);
	assert!(a[..2].contains(&0) && a[..2].contains(&4));
}

#[test]
fn ties_keep_chunk_order() {
	let hits = rank(&corpus(), "nothing matches this", 3);
	let order: Vec<usize> = hits.iter().map(|h| h.chunk_index).collect();
	assert_eq!(order, vec![0, 1, 2]);
	assert!(hits.iter().all(|h| h.score == 0.0));
}
