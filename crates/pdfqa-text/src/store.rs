//! Durable lexical store: the ordered chunk sequence of one document,
//! serialized as `chunks.json` inside its storage area.
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use pdfqa_core::error::{Error, Result};
use pdfqa_core::types::Chunk;

pub const CHUNKS_FILE: &str = "chunks.json";

#[derive(Debug, Clone)]
pub struct ChunkStore {
	path: PathBuf,
}

impl ChunkStore {
	pub fn in_area(area: &Path) -> Self { Self { path: area.join(CHUNKS_FILE) } }

	pub fn exists(&self) -> bool { self.path.is_file() }

	/// Write the full sequence, replacing any previous file. Blocking.
	pub fn write(&self, chunks: &[Chunk]) -> Result<()> {
		let file = fs::File::create(&self.path)?;
		let mut writer = BufWriter::new(file);
		serde_json::to_writer(&mut writer, chunks)?;
		writer.flush()?;
		writer.into_inner().map_err(|e| Error::Storage(e.to_string()))?.sync_all()?;
		tracing::debug!(path = %self.path.display(), chunks = chunks.len(), "wrote chunk store");
		Ok(())
	}

	/// `Ok(None)` when the store has never been written. Blocking.
	pub fn read(&self) -> Result<Option<Vec<Chunk>>> {
		let file = match fs::File::open(&self.path) {
			Ok(f) => f,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		let chunks: Vec<Chunk> = serde_json::from_reader(BufReader::new(file))
			.map_err(|e| Error::Storage(format!("{}: {}", self.path.display(), e)))?;
		Ok(Some(chunks))
	}
}
