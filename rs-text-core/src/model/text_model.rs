use std::path::Path;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chain::{Chain, ChainSnapshot};
use super::corpus::{Corpus, join_words};
use super::novelty::NoveltyFilter;
use super::sentence_options::{Seed, SentenceOptions, TextConfig};
use crate::error::{GenerationError, Result};
use crate::io::{build_output_path, read_text};

/// On-disk chain cache, tied to the exact text it was trained on.
///
/// The state size lives in the snapshot; a cache trained on another text
/// or with another state size is stale.
#[derive(Serialize, Deserialize)]
struct ChainCache {
	text_digest: [u8; 32],
	snapshot: ChainSnapshot,
}

/// A sentence generator trained on a source text.
///
/// # Responsibilities
/// - Build the corpus and the reference text from the source text
/// - Train (or receive) the chain
/// - Generate sentences that pass the novelty filter and the length limit
/// - Snapshot the chain, hydrate from a snapshot, merge models
///
/// # Invariants
/// - `reference_text` is always derived from `corpus`
/// - The chain state size never changes
///
/// Without a source text the reference text is empty and every non-empty
/// sentence is considered novel.
#[derive(Debug, Clone)]
pub struct TextModel {
	corpus: Corpus,
	reference_text: String,
	chain: Chain,
}

impl TextModel {
	/// Builds a model from `text` and trains a chain on it.
	///
	/// Text without any admissible sentence still produces a (useless)
	/// model; generation from it fails with [`GenerationError::Exhausted`].
	///
	/// # Errors
	/// Returns an error if `config.state_size < 1`.
	pub fn new(text: &str, config: TextConfig) -> Result<Self> {
		let corpus = Corpus::build(text);
		let chain = Chain::new(corpus.runs(), config.state_size)?;
		info!("Trained chain of size {} on {} sentences ({} states)", chain.state_size(), corpus.len(), chain.len());
		Ok(Self::from_parts(corpus, chain))
	}

	/// Builds a model around a pre-built chain.
	///
	/// `text`, if any, is only used for the reference text.
	pub fn with_chain(text: Option<&str>, chain: Chain) -> Self {
		let corpus = text.map(Corpus::build).unwrap_or_default();
		Self::from_parts(corpus, chain)
	}

	fn from_parts(corpus: Corpus, chain: Chain) -> Self {
		let reference_text = corpus.reference_text();
		Self { corpus, reference_text, chain }
	}

	/// Loads a model from a text file.
	///
	/// - If a `.bin` cache sits next to the file and was trained on the same
	///   text with the same state size, the chain is hydrated from it.
	/// - Otherwise the chain is trained and the cache (re)written for
	///   future fast loading.
	pub fn from_file<P: AsRef<Path>>(filepath: P, config: TextConfig) -> Result<Self> {
		let text = read_text(&filepath)?;
		let binary_data_path = build_output_path(&filepath, "bin")?;
		let text_digest = *blake3::hash(text.as_bytes()).as_bytes();

		if binary_data_path.exists() {
			let bytes = std::fs::read(&binary_data_path)?;
			match Self::read_cache(&bytes, &text_digest, config) {
				Some(chain) => {
					info!("Loading cached chain from {}", binary_data_path.display());
					return Ok(Self::with_chain(Some(&text), chain));
				}
				None => info!("Stale chain cache at {}, retraining", binary_data_path.display()),
			}
		}

		let model = Self::new(&text, config)?;
		model.write_cache(&binary_data_path, text_digest)?;
		info!("Cached chain to {}", binary_data_path.display());
		Ok(model)
	}

	/// Decodes a cache, returning its chain only if it matches the text
	/// digest and the requested state size.
	fn read_cache(bytes: &[u8], text_digest: &[u8; 32], config: TextConfig) -> Option<Chain> {
		let cache: ChainCache = postcard::from_bytes(bytes).ok()?;
		if &cache.text_digest != text_digest || cache.snapshot.state_size != config.state_size {
			return None;
		}
		Chain::try_from(cache.snapshot).ok()
	}

	fn write_cache<P: AsRef<Path>>(&self, path: P, text_digest: [u8; 32]) -> Result<()> {
		let cache = ChainCache { text_digest, snapshot: self.snapshot() };
		std::fs::write(path, postcard::to_stdvec(&cache)?)?;
		Ok(())
	}

	/// Returns the state size of the chain.
	pub fn state_size(&self) -> usize {
		self.chain.state_size()
	}

	/// Returns the flattened text novelty is checked against.
	pub fn reference_text(&self) -> &str {
		&self.reference_text
	}

	pub fn corpus(&self) -> &Corpus {
		&self.corpus
	}

	pub fn chain(&self) -> &Chain {
		&self.chain
	}

	/// Checks generated words against the reference text.
	pub fn test_sentence_output<S: AsRef<str>>(&self, words: &[S], options: &SentenceOptions) -> bool {
		NoveltyFilter::new(&self.reference_text, options.max_overlap_ratio, options.max_overlap_total)
			.is_novel(words)
	}

	/// Generates a sentence using the thread-local random generator.
	///
	/// See [`TextModel::make_sentence_with_rng`].
	pub fn make_sentence<S: Into<Seed>>(&self, seed: S, options: &SentenceOptions) -> std::result::Result<String, GenerationError> {
		self.make_sentence_with_rng(seed, options, &mut rand::rng())
	}

	/// Generates an unseeded sentence.
	pub fn make_sentence_with_options(&self, options: &SentenceOptions) -> std::result::Result<String, GenerationError> {
		self.make_sentence(Seed::None, options)
	}

	/// Generates a sentence, retrying up to `options.tries` times.
	///
	/// Each attempt walks the chain from the seed, then:
	/// - rejects the continuation if it overlaps the source too much;
	/// - prepends the seed words and joins everything with single spaces;
	/// - rejects the sentence if it is longer than `options.max_chars`.
	///
	/// Both rejections consume an attempt.
	///
	/// # Errors
	/// - [`GenerationError::InvalidOptions`] if the options do not validate.
	/// - [`GenerationError::Exhausted`] if no attempt succeeded.
	pub fn make_sentence_with_rng<S, R>(
		&self,
		seed: S,
		options: &SentenceOptions,
		rng: &mut R,
	) -> std::result::Result<String, GenerationError>
	where
		S: Into<Seed>,
		R: Rng + ?Sized,
	{
		options.validate()?;
		let init_state = seed.into().words();

		for attempt in 1..=options.tries {
			let words = self.chain.walk_with(&init_state, &mut *rng);

			if !self.test_sentence_output(&words, options) {
				debug!("Attempt {attempt}: rejected by novelty filter ({} words)", words.len());
				continue;
			}

			let sentence = if init_state.is_empty() {
				join_words(&words)
			} else {
				join_words(&[init_state.as_slice(), words.as_slice()].concat())
			};

			if let Some(max_chars) = options.max_chars {
				if sentence.chars().count() > max_chars {
					debug!("Attempt {attempt}: rejected, longer than {max_chars} chars");
					continue;
				}
			}

			return Ok(sentence);
		}

		debug!("No sentence after {} attempts", options.tries);
		Err(GenerationError::Exhausted { tries: options.tries })
	}

	/// Returns the structural snapshot of the chain.
	///
	/// The corpus is not part of the snapshot; pass the original text to
	/// [`TextModel::from_snapshot`] to restore novelty checks.
	pub fn snapshot(&self) -> ChainSnapshot {
		self.chain.snapshot()
	}

	/// Rebuilds a model from a chain snapshot and, optionally, its source text.
	///
	/// # Errors
	/// Returns an error if the snapshot is inconsistent.
	pub fn from_snapshot(snapshot: ChainSnapshot, text: Option<&str>) -> Result<Self> {
		let chain = Chain::try_from(snapshot)?;
		Ok(Self::with_chain(text, chain))
	}

	/// Serializes the chain snapshot to JSON.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(&self.snapshot())?)
	}

	/// Hydrates a model from a JSON chain snapshot.
	pub fn from_json(json: &str, text: Option<&str>) -> Result<Self> {
		let snapshot: ChainSnapshot = serde_json::from_str(json)?;
		Self::from_snapshot(snapshot, text)
	}

	/// Serializes the chain snapshot to a compact binary blob.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(&self.snapshot())?)
	}

	/// Hydrates a model from a binary chain snapshot.
	pub fn from_bytes(bytes: &[u8], text: Option<&str>) -> Result<Self> {
		let snapshot: ChainSnapshot = postcard::from_bytes(bytes)?;
		Self::from_snapshot(snapshot, text)
	}

	/// Merges another model into this one.
	///
	/// Chains are merged transition by transition, corpora are concatenated
	/// and the reference text rebuilt.
	///
	/// # Errors
	/// Returns an error if the state sizes do not match; the model is left
	/// untouched in that case.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		self.chain.merge(&other.chain)?;
		self.corpus.extend(&other.corpus);
		self.reference_text = self.corpus.reference_text();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::TextError;
	use crate::model::corpus::split_words;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	const SHORT_TEXT: &str = "The quick brown fox jumped over the lazy dog.";

	#[test]
	fn test_new_builds_reference_text() {
		let model = TextModel::new(SHORT_TEXT, TextConfig::default()).unwrap();
		assert_eq!(model.reference_text(), SHORT_TEXT);
		assert_eq!(model.corpus().len(), 1);
		assert_eq!(model.state_size(), 2);
	}

	#[test]
	fn test_zero_state_size_is_rejected() {
		let err = TextModel::new(SHORT_TEXT, TextConfig { state_size: 0 }).unwrap_err();
		assert!(matches!(err, TextError::InvalidStateSize(0)));
	}

	#[test]
	fn test_empty_text_trains_an_empty_model() {
		let model = TextModel::new("", TextConfig::default()).unwrap();
		assert_eq!(model.reference_text(), "");
		assert!(model.chain().is_empty());

		let result = model.make_sentence((), &SentenceOptions::default());
		assert_eq!(result, Err(GenerationError::Exhausted { tries: 10 }));
	}

	#[test]
	fn test_single_sentence_corpus_cannot_be_novel() {
		let model = TextModel::new(SHORT_TEXT, TextConfig::default()).unwrap();
		let result = model.make_sentence((), &SentenceOptions::default());
		assert_eq!(result, Err(GenerationError::Exhausted { tries: 10 }));
	}

	#[test]
	fn test_failure_reports_the_configured_tries() {
		let model = TextModel::new(SHORT_TEXT, TextConfig::default()).unwrap();
		let options = SentenceOptions { tries: 3, ..Default::default() };
		let err = model.make_sentence_with_options(&options).unwrap_err();
		assert_eq!(err.to_string(), "unable to produce a sufficiently novel sentence after 3 attempts");

		let options = SentenceOptions { tries: 0, ..Default::default() };
		assert_eq!(model.make_sentence((), &options), Err(GenerationError::Exhausted { tries: 0 }));
	}

	#[test]
	fn test_hydrated_model_without_text_accepts_any_walk() {
		let original = TextModel::new(SHORT_TEXT, TextConfig::default()).unwrap();
		let hydrated = TextModel::from_snapshot(original.snapshot(), None).unwrap();
		assert_eq!(hydrated.reference_text(), "");

		let sentence = hydrated.make_sentence((), &SentenceOptions::default()).unwrap();
		assert_eq!(sentence, SHORT_TEXT);
	}

	#[test]
	fn test_seed_words_are_prepended() {
		let text = "Sherlock Holmes smiled at the fire.";
		let model = TextModel::with_chain(None, TextModel::new(text, TextConfig::default()).unwrap().chain);
		let mut rng = StdRng::seed_from_u64(9);

		let sentence = model
			.make_sentence_with_rng("Sherlock Holmes", &SentenceOptions::default(), &mut rng)
			.unwrap();
		assert_eq!(sentence, text);

		let sentence = model
			.make_sentence_with_rng(["Sherlock", "Holmes"], &SentenceOptions::default(), &mut rng)
			.unwrap();
		assert_eq!(sentence, text);
	}

	#[test]
	fn test_max_chars_is_inclusive() {
		let model = TextModel::from_snapshot(
			TextModel::new(SHORT_TEXT, TextConfig::default()).unwrap().snapshot(),
			None,
		)
		.unwrap();
		let len = SHORT_TEXT.chars().count();

		let options = SentenceOptions { max_chars: Some(len), ..Default::default() };
		assert_eq!(model.make_sentence_with_options(&options).unwrap(), SHORT_TEXT);

		let options = SentenceOptions { max_chars: Some(len - 1), ..Default::default() };
		assert_eq!(
			model.make_sentence_with_options(&options),
			Err(GenerationError::Exhausted { tries: 10 })
		);
	}

	#[test]
	fn test_merge_rebuilds_reference_text() {
		let mut model = TextModel::new("First one here.", TextConfig::default()).unwrap();
		let other = TextModel::new("Second one there.", TextConfig::default()).unwrap();

		model.merge(&other).unwrap();
		assert_eq!(model.reference_text(), "First one here. Second one there.");
		assert_eq!(model.corpus().len(), 2);
	}

	#[test]
	fn test_merge_with_other_state_size_leaves_model_untouched() {
		let mut model = TextModel::new("First one here.", TextConfig::default()).unwrap();
		let other = TextModel::new("Second one there.", TextConfig { state_size: 1 }).unwrap();

		assert!(model.merge(&other).is_err());
		assert_eq!(model.reference_text(), "First one here.");
	}

	#[test]
	fn test_matching_cache_is_reused() {
		let dir = tempfile::tempdir().unwrap();
		let text_path = dir.path().join("fox.txt");
		std::fs::write(&text_path, SHORT_TEXT).unwrap();

		// A cache keyed on this text but holding another chain proves reuse
		let other = TextModel::new("Another sentence entirely.", TextConfig::default()).unwrap();
		let digest = *blake3::hash(SHORT_TEXT.as_bytes()).as_bytes();
		other.write_cache(dir.path().join("fox.bin"), digest).unwrap();

		let model = TextModel::from_file(&text_path, TextConfig::default()).unwrap();
		assert_eq!(model.snapshot(), other.snapshot());
		assert_eq!(model.reference_text(), SHORT_TEXT);
	}

	#[test]
	fn test_cache_with_other_state_size_is_stale() {
		let model = TextModel::new(SHORT_TEXT, TextConfig::default()).unwrap();
		let digest = *blake3::hash(SHORT_TEXT.as_bytes()).as_bytes();
		let dir = tempfile::tempdir().unwrap();
		let cache_path = dir.path().join("fox.bin");
		model.write_cache(&cache_path, digest).unwrap();
		let bytes = std::fs::read(&cache_path).unwrap();

		assert!(TextModel::read_cache(&bytes, &digest, TextConfig::default()).is_some());
		assert!(TextModel::read_cache(&bytes, &digest, TextConfig { state_size: 3 }).is_none());
		assert!(TextModel::read_cache(&bytes, &[0; 32], TextConfig::default()).is_none());
		assert!(TextModel::read_cache(&[0xff, 0xff], &digest, TextConfig::default()).is_none());
	}

	#[test]
	fn test_novelty_is_checked_on_the_continuation_only() {
		let chain = TextModel::new("Sherlock Holmes smiled at the fire.", TextConfig::default()).unwrap().chain;
		// The seed words are in the reference text, the continuation is not
		let model = TextModel::with_chain(Some("Sherlock Holmes smiled at me."), chain);
		let options = SentenceOptions { max_overlap_total: 1, ..Default::default() };

		let whole = split_words("Sherlock Holmes smiled at the fire.");
		assert!(!model.test_sentence_output(&whole, &options));
		assert!(model.test_sentence_output(&["the", "fire."], &options));

		let sentence = model.make_sentence("Sherlock Holmes smiled at", &options).unwrap();
		assert_eq!(sentence, "Sherlock Holmes smiled at the fire.");
	}
}
