use std::fs;
use tempfile::TempDir;

use figment::providers::{Format, Toml};
use figment::Figment;
use pdfqa_core::chunker::{Chunker, ChunkingConfig, START_INDEX_KEY};
use pdfqa_core::config::{Config, Settings};
use pdfqa_core::types::{Chunk, Meta, TextUnit};

fn page(source: &str, n: usize, text: String) -> TextUnit {
    let mut meta = Meta::new();
    meta.insert("source".into(), source.into());
    meta.insert("page".into(), n.into());
    TextUnit::new(text, meta)
}

fn paragraph(tag: &str) -> String {
    format!("{tag} {}", "filler ".repeat(125)).trim_end().to_string()
}

fn start_of(chunk: &Chunk) -> usize {
    chunk.metadata[START_INDEX_KEY].as_u64().unwrap() as usize
}

/// Rebuild a unit's text from its chunks by dropping each chunk's overlap.
fn reconstruct(chunks: &[&Chunk]) -> String {
    let mut out: Vec<char> = Vec::new();
    for c in chunks {
        let start = start_of(c);
        assert!(start <= out.len(), "gap before chunk at {start}");
        out.truncate(start);
        out.extend(c.text.chars());
    }
    out.into_iter().collect()
}

#[test]
fn three_page_document_yields_seven_chunks() {
    let units = vec![
        page("report.pdf", 0, [paragraph("one"), paragraph("two"), paragraph("three")].join("\n\n")),
        page("report.pdf", 1, [paragraph("four"), paragraph("zygomorphic")].join("\n\n")),
        page("report.pdf", 2, [paragraph("six"), paragraph("seven")].join("\n\n")),
    ];
    let chunks = Chunker::new(ChunkingConfig::default()).chunk(&units);
    assert_eq!(chunks.len(), 7);

    let pages: Vec<u64> = chunks.iter().map(|c| c.metadata["page"].as_u64().unwrap()).collect();
    assert_eq!(pages, vec![0, 0, 0, 1, 1, 2, 2]);
    assert!(chunks[4].text.starts_with("zygomorphic"));
    assert!(chunks.iter().all(|c| c.metadata["source"] == "report.pdf"));
}

#[test]
fn chunks_respect_size_and_reconstruct_input() {
    let text = (0..60)
        .map(|i| format!("Sentence number {i} talks about something. "))
        .collect::<String>()
        + "\n\nTrailing paragraph with ünïcödé characters.\nAnd one more line.";
    let config = ChunkingConfig { chunk_size: 120, chunk_overlap: 30 };
    let units = vec![page("a.pdf", 0, text.clone())];
    let chunks = Chunker::new(config).chunk(&units);
    assert!(chunks.len() > 10);

    for c in &chunks {
        assert!(c.text.chars().count() <= 120, "chunk too long: {:?}", c.text);
    }
    for pair in chunks.windows(2) {
        let prev_end = start_of(&pair[0]) + pair[0].text.chars().count();
        let next_start = start_of(&pair[1]);
        assert!(next_start > start_of(&pair[0]));
        assert!(prev_end >= next_start);
        assert!(prev_end - next_start <= 30, "overlap too large");
    }
    let refs: Vec<&Chunk> = chunks.iter().collect();
    assert_eq!(reconstruct(&refs), text);
}

#[test]
fn unbroken_text_is_hard_cut() {
    let text = "x".repeat(250);
    let config = ChunkingConfig { chunk_size: 100, chunk_overlap: 0 };
    let parts = Chunker::new(config).split_text(&text);
    assert_eq!(parts.iter().map(String::len).collect::<Vec<_>>(), vec![100, 100, 50]);
}

#[test]
fn blank_units_are_skipped() {
    let units = vec![
        page("a.pdf", 0, "   \n\n ".into()),
        page("a.pdf", 1, "Real content.".into()),
        page("a.pdf", 2, String::new()),
    ];
    let chunks = Chunker::new(ChunkingConfig::default()).chunk(&units);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Real content.");
    assert_eq!(chunks[0].metadata["page"], 1);
    assert_eq!(start_of(&chunks[0]), 0);
}

#[test]
fn chunking_config_validation() {
    assert!(ChunkingConfig::default().validate().is_ok());
    assert!(ChunkingConfig { chunk_size: 0, chunk_overlap: 0 }.validate().is_err());
    assert!(ChunkingConfig { chunk_size: 100, chunk_overlap: 100 }.validate().is_err());
}

#[test]
fn defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(s.chunking, ChunkingConfig { chunk_size: 1000, chunk_overlap: 100 });
    assert_eq!(s.retrieval.top_k, 4);
    assert_eq!(s.retrieval.max_available, 50);
    assert_eq!(s.ollama.embed_model, "nomic-embed-text");
    assert_eq!(s.llm.chat_model, "llama3.2:1b");
    assert_eq!(s.llm.num_predict, 256);
    assert_eq!(s.vector.collection, "docs");
    assert!(s.mirror.bucket.is_none());
    assert!(s.validate().is_ok());
}

#[test]
fn load_from_merges_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[index]\nroot = \"/data/indexes\"\n\n[retrieval]\ntop_k = 6\n",
    )
    .unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[embedding]\nuse_fake = true\n").unwrap();

    let cfg = Config::load_from(tmp.path(), "test").expect("load");
    let s = cfg.settings().unwrap();
    assert_eq!(s.index.root, "/data/indexes");
    assert_eq!(s.retrieval.top_k, 6);
    assert!(s.embedding.use_fake);
    assert_eq!(s.ollama.base_url, "http://127.0.0.1:11434");
    assert_eq!(cfg.get::<usize>("retrieval.top_k").unwrap(), 6);
}

#[test]
fn prod_rejects_fake_embedder() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[embedding]\nuse_fake = true\n").unwrap();
    assert!(Config::load_from(tmp.path(), "prod").is_err());
    assert!(Config::load_from(tmp.path(), "dev").is_ok());
}

#[test]
fn settings_reject_invalid_chunking() {
    let figment = Figment::from(Toml::string("[chunking]\nchunk_size = 50\nchunk_overlap = 80\n"));
    let err = Config::from_figment(figment).settings().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}
