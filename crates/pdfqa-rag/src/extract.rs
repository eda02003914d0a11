//! PDF text extraction with poppler's `pdftotext`.
//!
//! Output is written to a scratch file so a child that produces a lot of text
//! can never block on a full pipe while we wait for it.
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use pdfqa_core::config::ExtractSettings;
use pdfqa_core::error::Error;
use pdfqa_core::traits::TextExtractor;
use pdfqa_core::types::{Meta, TextUnit};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const PAGE_BREAK: char = '\u{c}';

#[derive(Debug, Clone)]
pub struct PdftotextExtractor {
    bin: String,
    timeout: Duration,
}

impl PdftotextExtractor {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self { Self { bin: bin.into(), timeout } }

    pub fn from_settings(settings: &ExtractSettings) -> Self {
        Self::new(settings.pdftotext_bin.clone(), Duration::from_secs(settings.timeout_secs))
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract(&self, path: &Path, source_name: &str) -> anyhow::Result<Vec<TextUnit>> {
        let scratch = tempfile::tempdir()?;
        let out_path = scratch.path().join("out.txt");
        let err_path = scratch.path().join("err.txt");
        let mut child = Command::new(&self.bin)
            .args(["-layout", "-enc", "UTF-8"])
            .arg(path)
            .arg(&out_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(File::create(&err_path)?))
            .spawn()
            .map_err(|e| Error::Extraction(format!("failed to run {}: {} (is poppler installed?)", self.bin, e)))?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? { break status; }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() { tracing::warn!(error = %e, "failed to kill pdftotext"); }
                let _ = child.wait();
                return Err(Error::Extraction(format!("{} timed out after {:?}", self.bin, self.timeout)).into());
            }
            std::thread::sleep(POLL_INTERVAL);
        };
        if !status.success() {
            let stderr = std::fs::read_to_string(&err_path).unwrap_or_default();
            return Err(Error::Extraction(format!("{} exited with {}: {}", self.bin, status, stderr.trim())).into());
        }

        let bytes = std::fs::read(&out_path)?;
        let units = split_pages(&String::from_utf8_lossy(&bytes), source_name);
        tracing::info!(source = source_name, pages = units.len(), chars = bytes.len(), "extracted pdf text");
        Ok(units)
    }
}

/// One unit per form-feed separated page, `page` counted from 0.
pub fn split_pages(text: &str, source_name: &str) -> Vec<TextUnit> {
    let mut pages: Vec<&str> = text.split(PAGE_BREAK).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) { pages.pop(); }
    pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            let mut metadata = Meta::new();
            metadata.insert("source".into(), source_name.into());
            metadata.insert("page".into(), i.into());
            TextUnit::new(page, metadata)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_form_feed_and_drops_trailing_page() {
        let units = split_pages("first page\u{c}second page\u{c}\u{c}fourth\u{c}", "a.pdf");
        let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["first page", "second page", "", "fourth"]);
        assert_eq!(units[3].metadata["page"], 3);
        assert_eq!(units[0].metadata["source"], "a.pdf");
    }

    #[test]
    fn text_without_breaks_is_one_page() {
        assert_eq!(split_pages("only", "b.pdf").len(), 1);
    }
}
