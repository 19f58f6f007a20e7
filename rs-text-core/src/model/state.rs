use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::chain::Token;

/// Outgoing transitions of one chain state.
///
/// A `State` stores every token observed right after a given state key
/// (a window of `state_size` tokens), weighted by its number of observations.
/// Conceptually, this is a node in a Markov chain.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Pick the next token using weighted random sampling
/// - Merge with the transitions of the same key from another chain
///
/// ## Invariants
/// - Each transition occurrence count is strictly positive
///
/// Transitions are kept ordered so that two chains trained on the same runs
/// produce identical snapshots.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Example: { Word("the") => 42, End => 3 }
	transitions: BTreeMap<Token, usize>,
}

impl State {
	/// Records `occurrence` observations of a transition toward `next`.
	pub fn add_transition(&mut self, next: Token, occurrence: usize) {
		*self.transitions.entry(next).or_insert(0) += occurrence;
	}

	/// Iterates over `(next token, occurrence)` pairs in token order.
	pub fn transitions(&self) -> impl Iterator<Item = (&Token, usize)> {
		self.transitions.iter().map(|(token, occurrence)| (token, *occurrence))
	}

	/// Picks the next token using weighted random sampling.
	///
	/// The probability of selecting a token is proportional to its
	/// occurrence count.
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Token> {
		let total: usize = self.transitions.values().sum();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);

		for (next, occurrence) in &self.transitions {
			if r < *occurrence {
				return Some(next);
			}
			r -= occurrence;
		}

		// Unreachable while counts sum to `total`
		self.transitions.keys().next_back()
	}

	/// Merges the transitions of another state into this one.
	///
	/// Occurrence counts are summed. The caller is responsible for merging
	/// states of the same key only.
	pub fn merge(&mut self, other: &Self) {
		for (next, occurrence) in &other.transitions {
			self.add_transition(next.clone(), *occurrence);
		}
	}
}
