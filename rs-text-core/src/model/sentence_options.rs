use super::corpus::split_words;
use super::novelty::{DEFAULT_MAX_OVERLAP_RATIO, DEFAULT_MAX_OVERLAP_TOTAL};
use crate::error::GenerationError;

/// Default number of attempts before giving up on a sentence.
pub const DEFAULT_TRIES: usize = 10;

/// Default state (n-gram) size of a trained model.
pub const DEFAULT_STATE_SIZE: usize = 2;

/// Where a generated sentence starts from.
///
/// # Variants
/// - `None`: unconstrained, the sentence starts like any source sentence.
/// - `Words(Vec<String>)`: the given words are used verbatim as the seed.
/// - `Text(String)`: the text is split into words and used as the seed.
///
/// Seed words are always prepended to the generated continuation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Seed {
	#[default]
	None,
	Words(Vec<String>),
	Text(String),
}

impl Seed {
	/// Resolves the seed into the words generation continues after.
	pub fn words(&self) -> Vec<String> {
		match self {
			Seed::None => Vec::new(),
			Seed::Words(words) => words.clone(),
			Seed::Text(text) => split_words(text),
		}
	}
}

impl From<()> for Seed {
	fn from(_: ()) -> Self {
		Seed::None
	}
}

impl From<&str> for Seed {
	fn from(text: &str) -> Self {
		Seed::Text(text.to_owned())
	}
}

impl From<String> for Seed {
	fn from(text: String) -> Self {
		Seed::Text(text)
	}
}

impl From<Vec<String>> for Seed {
	fn from(words: Vec<String>) -> Self {
		Seed::Words(words)
	}
}

impl From<&[&str]> for Seed {
	fn from(words: &[&str]) -> Self {
		Seed::Words(words.iter().map(|w| (*w).to_owned()).collect())
	}
}

impl<const N: usize> From<[&str; N]> for Seed {
	fn from(words: [&str; N]) -> Self {
		Seed::from(&words[..])
	}
}

impl<T: Into<Seed>> From<Option<T>> for Seed {
	fn from(seed: Option<T>) -> Self {
		seed.map_or(Seed::None, Into::into)
	}
}

/// Options of a single sentence generation call.
///
/// Options are checked by [`SentenceOptions::validate`] at the start of
/// every generation call: `max_overlap_ratio` must be finite and >= 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentenceOptions {
	/// Max number of attempts (novelty and length rejections share it).
	pub tries: usize,

	/// Max ratio of the sentence length that may overlap the source.
	pub max_overlap_ratio: f64,

	/// Max number of consecutive words that may overlap the source.
	pub max_overlap_total: usize,

	/// Inclusive max length of the final sentence, in characters.
	pub max_chars: Option<usize>,
}

impl Default for SentenceOptions {
	fn default() -> Self {
		Self {
			tries: DEFAULT_TRIES,
			max_overlap_ratio: DEFAULT_MAX_OVERLAP_RATIO,
			max_overlap_total: DEFAULT_MAX_OVERLAP_TOTAL,
			max_chars: None,
		}
	}
}

impl SentenceOptions {
	/// Checks the options before a generation call.
	pub fn validate(&self) -> Result<(), GenerationError> {
		let ratio = self.max_overlap_ratio;
		if !ratio.is_finite() || ratio < 0.0 {
			return Err(GenerationError::InvalidOptions(format!(
				"max_overlap_ratio must be a finite value >= 0.0, got {ratio}"
			)));
		}
		Ok(())
	}
}

/// Construction settings of a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextConfig {
	/// Number of words the chain conditions on (>= 1).
	pub state_size: usize,
}

impl Default for TextConfig {
	fn default() -> Self {
		Self { state_size: DEFAULT_STATE_SIZE }
	}
}
