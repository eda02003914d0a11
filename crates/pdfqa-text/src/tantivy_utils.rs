//! Text analysis shared by lexical ranking.
//!
//! Tokens are lower-cased alphanumeric runs; single-character tokens are
//! dropped, the way conventional TF-IDF vectorizers do.
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, TokenStream};

pub const MIN_TOKEN_CHARS: usize = 2;
const MAX_TOKEN_BYTES: usize = 64;

pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(MAX_TOKEN_BYTES))
		.filter(LowerCaser)
		.build()
}

pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	while stream.advance() {
		let token = stream.token();
		if token.text.chars().count() >= MIN_TOKEN_CHARS { tokens.push(token.text.clone()); }
	}
	tokens
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_drops_short_tokens() {
		let mut analyzer = build_analyzer();
		let tokens = tokenize(&mut analyzer, "A Zygomorphic flower, I think; x-ray 42!");
		assert_eq!(tokens, vec!["zygomorphic", "flower", "think", "ray", "42"]);
	}
}
