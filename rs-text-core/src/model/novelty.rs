use super::corpus::join_words;

/// Default max ratio of a generated sentence allowed to overlap the source.
pub const DEFAULT_MAX_OVERLAP_RATIO: f64 = 0.7;

/// Default max number of consecutive words allowed to overlap the source.
pub const DEFAULT_MAX_OVERLAP_TOTAL: usize = 15;

/// Rejects generated sentences that copy too much of the source text.
///
/// A sentence of `len` words may share at most
/// `min(round(ratio * len), total)` consecutive words with the reference
/// text. Every window one word longer than that is looked up verbatim
/// (space-joined) in the reference text.
#[derive(Debug, Clone, Copy)]
pub struct NoveltyFilter<'a> {
	reference_text: &'a str,
	max_overlap_ratio: f64,
	max_overlap_total: usize,
}

impl<'a> NoveltyFilter<'a> {
	pub fn new(reference_text: &'a str, max_overlap_ratio: f64, max_overlap_total: usize) -> Self {
		Self { reference_text, max_overlap_ratio, max_overlap_total }
	}

	/// Longest tolerated overlap, in words, for a sentence of `len` words.
	pub fn overlap_max(&self, len: usize) -> usize {
		let overlap_ratio = (self.max_overlap_ratio * len as f64).round() as usize;
		overlap_ratio.min(self.max_overlap_total)
	}

	/// Returns `true` if no window of `overlap_max + 1` words appears in the
	/// reference text.
	///
	/// At least one window is always checked: an empty sentence yields an
	/// empty window, which every reference text contains.
	pub fn is_novel<S: AsRef<str>>(&self, words: &[S]) -> bool {
		let overlap_max = self.overlap_max(words.len());
		let window_size = overlap_max + 1;
		let window_count = words.len().saturating_sub(overlap_max).max(1);

		(0..window_count).all(|i| {
			let end = (i + window_size).min(words.len());
			let window = join_words(&words[i..end]);
			!self.reference_text.contains(&window)
		})
	}
}

impl Default for NoveltyFilter<'_> {
	fn default() -> Self {
		Self::new("", DEFAULT_MAX_OVERLAP_RATIO, DEFAULT_MAX_OVERLAP_TOTAL)
	}
}
