//! Corpus preparation: from raw text to trainable runs and the reference text.

use std::sync::LazyLock;

use regex::Regex;

use super::sentences::{SentenceSplitter, SplitOptions};

/// Punctuation that reads as broken once a sentence is recombined out of its
/// paragraph: dangling single quotes, double quotes, parentheses and brackets.
static REJECT_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(^')|('$)|\s'|'\s|["()\[\]]"#).expect("valid reject pattern"));

/// Splits raw text into sentences, punctuation and casing preserved.
pub fn split_sentences(text: &str) -> Vec<String> {
	SentenceSplitter::new(SplitOptions { sanitize: false, ..Default::default() }).sentences(text)
}

/// Input filter deciding whether a sentence may enter the corpus.
pub fn is_admissible_sentence(sentence: &str) -> bool {
	!REJECT_PATTERN.is_match(sentence)
}

/// Splits a sentence on runs of whitespace.
pub fn split_words(sentence: &str) -> Vec<String> {
	sentence.split_whitespace().map(str::to_owned).collect()
}

/// Re-joins words into a sentence.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
	join_with_space(words)
}

/// Re-joins sentences into a full text.
pub fn join_sentences<S: AsRef<str>>(sentences: &[S]) -> String {
	join_with_space(sentences)
}

fn join_with_space<S: AsRef<str>>(parts: &[S]) -> String {
	let mut joined = String::new();
	for (i, part) in parts.iter().enumerate() {
		if i > 0 {
			joined.push(' ');
		}
		joined.push_str(part.as_ref());
	}
	joined
}

/// Ordered runs of words, one per admissible source sentence.
///
/// # Invariants
/// - Runs keep the order of the source sentences
/// - Every run comes from a sentence accepted by [`is_admissible_sentence`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
	runs: Vec<Vec<String>>,
}

impl Corpus {
	/// Builds the corpus of `text`: sentences, filtered, split into words.
	pub fn build(text: &str) -> Self {
		let runs = split_sentences(text)
			.iter()
			.filter(|sentence| is_admissible_sentence(sentence))
			.map(|sentence| split_words(sentence))
			.collect();

		Self { runs }
	}

	pub fn runs(&self) -> &[Vec<String>] {
		&self.runs
	}

	pub fn len(&self) -> usize {
		self.runs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.runs.is_empty()
	}

	/// Flattens the corpus into the text used for novelty checks.
	pub fn reference_text(&self) -> String {
		let sentences: Vec<String> = self.runs.iter().map(|run| join_words(run)).collect();
		join_sentences(&sentences)
	}

	/// Appends the runs of another corpus.
	pub fn extend(&mut self, other: &Self) {
		self.runs.extend(other.runs.iter().cloned());
	}
}
