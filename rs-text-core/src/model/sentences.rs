//! Rule-based sentence boundary detection.
//!
//! Text is reduced to whitespace separated words; a word closing with
//! terminal punctuation ends a sentence unless it looks like an
//! abbreviation, an initial or a number. Whitespace inside a sentence is
//! collapsed to single spaces, which is the normalization the novelty
//! filter relies on.

use std::collections::HashSet;

/// Closing characters allowed after terminal punctuation (`"Stop!"`, `(sic.)`).
const CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '\u{201D}', '\u{2019}'];

/// Opening characters ignored when looking at the start of a word.
const OPENERS: &[char] = &['"', '\'', '(', '[', '{', '\u{201C}', '\u{2018}'];

/// Titles never end a sentence (`Mr. Holmes`).
const TITLES: &[&str] = &[
	"mr", "mrs", "ms", "messrs", "dr", "prof", "rev", "st", "mt", "gen", "col", "capt",
	"lt", "sgt", "gov", "hon", "sr", "jr",
];

/// Abbreviations end a sentence only when a capitalized word follows.
const ABBREVIATIONS: &[&str] = &[
	"etc", "inc", "ltd", "co", "vs", "no", "fig", "approx", "vol", "ch", "pp", "jan",
	"feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// Options of the [`SentenceSplitter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitOptions {
	/// Strip HTML-like tags before splitting.
	pub sanitize: bool,
	/// Treat every line break as a sentence boundary.
	pub newline_boundaries: bool,
}

/// Splits raw text into sentences, keeping punctuation and casing.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
	options: SplitOptions,
	titles: HashSet<&'static str>,
	abbreviations: HashSet<&'static str>,
}

impl Default for SentenceSplitter {
	fn default() -> Self {
		Self::new(SplitOptions::default())
	}
}

impl SentenceSplitter {
	pub fn new(options: SplitOptions) -> Self {
		Self {
			options,
			titles: TITLES.iter().copied().collect(),
			abbreviations: ABBREVIATIONS.iter().copied().collect(),
		}
	}

	/// Splits `text` into sentences.
	///
	/// Empty or blank text yields no sentence.
	pub fn sentences(&self, text: &str) -> Vec<String> {
		let text = if self.options.sanitize { strip_tags(text) } else { text.to_owned() };

		let blocks: Vec<&str> = if self.options.newline_boundaries {
			text.lines().collect()
		} else {
			vec![text.as_str()]
		};

		let mut sentences = Vec::new();
		for block in blocks {
			let words: Vec<&str> = block.split_whitespace().collect();
			let mut current: Vec<&str> = Vec::new();

			for (i, &word) in words.iter().enumerate() {
				current.push(word);
				if self.is_boundary(word, words.get(i + 1).copied()) {
					sentences.push(current.join(" "));
					current.clear();
				}
			}

			if !current.is_empty() {
				sentences.push(current.join(" "));
			}
		}

		sentences
	}

	/// Decides whether `word` closes a sentence, given the word after it.
	fn is_boundary(&self, word: &str, next: Option<&str>) -> bool {
		let core = word.trim_end_matches(CLOSERS);
		if !core.ends_with(['.', '!', '?']) {
			return false;
		}

		let next = match next {
			Some(next) => next,
			None => return true,
		};
		if !core.ends_with('.') || core.ends_with("...") {
			return !starts_lowercase(next);
		}

		let stem = core
			.trim_end_matches('.')
			.trim_start_matches(OPENERS)
			.to_lowercase();

		if self.titles.contains(stem.as_str()) {
			return false;
		}
		// Initial: `J. Watson`
		if stem.chars().count() == 1 && stem.chars().all(char::is_alphabetic) {
			return false;
		}
		if self.abbreviations.contains(stem.as_str())
			|| stem.contains('.')
			|| (!stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()))
		{
			return starts_uppercase(next);
		}

		true
	}
}

fn starts_uppercase(word: &str) -> bool {
	word.trim_start_matches(OPENERS)
		.chars()
		.next()
		.is_some_and(char::is_uppercase)
}

fn starts_lowercase(word: &str) -> bool {
	word.trim_start_matches(OPENERS)
		.chars()
		.next()
		.is_some_and(char::is_lowercase)
}

/// Replaces `<...>` tags with a space.
fn strip_tags(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut in_tag = false;

	for c in text.chars() {
		match c {
			'<' => in_tag = true,
			'>' if in_tag => {
				in_tag = false;
				output.push(' ');
			}
			_ if !in_tag => output.push(c),
			_ => (),
		}
	}

	output
}
