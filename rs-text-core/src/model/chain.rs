use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::state::State;
use crate::error::{Result, TextError};

/// A token of the chain.
///
/// `Begin` pads the start of every run and `End` terminates it, so that
/// sentence boundaries are learned like any other transition without
/// colliding with real words.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
	Begin,
	Word(String),
	End,
}

/// Structural snapshot of a [`Chain`].
///
/// Transitions are listed state by state, both levels sorted, so two equal
/// chains always produce equal snapshots.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChainSnapshot {
	pub state_size: usize,
	pub transitions: Vec<(Vec<Token>, Vec<(Token, usize)>)>,
}

/// Word-level Markov chain of fixed order.
///
/// # Responsibilities
/// - Learn transitions from runs (sentences split into words)
/// - Walk the chain from the begin state or from a seed
/// - Merge with another chain of the same state size
///
/// # Invariants
/// - `state_size` is always >= 1 and never changes
/// - Every key of `states` holds exactly `state_size` tokens
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(into = "ChainSnapshot", try_from = "ChainSnapshot")]
pub struct Chain {
	state_size: usize,
	states: BTreeMap<Vec<Token>, State>,
}

impl Chain {
	/// Trains a chain of order `state_size` on `runs`.
	///
	/// Each run is padded with `state_size` `Begin` tokens and one `End`
	/// token. An empty set of runs yields an empty, valid chain.
	///
	/// # Errors
	/// Returns an error if `state_size < 1`.
	pub fn new<R: AsRef<[String]>>(runs: &[R], state_size: usize) -> Result<Self> {
		if state_size < 1 {
			return Err(TextError::InvalidStateSize(state_size));
		}

		let mut chain = Self { state_size, states: BTreeMap::new() };
		for run in runs {
			chain.add_run(run.as_ref());
		}
		Ok(chain)
	}

	fn add_run(&mut self, run: &[String]) {
		let mut items: Vec<Token> = vec![Token::Begin; self.state_size];
		items.extend(run.iter().cloned().map(Token::Word));
		items.push(Token::End);

		for window in items.windows(self.state_size + 1) {
			let (key, next) = window.split_at(self.state_size);
			self.states
				.entry(key.to_vec())
				.or_default()
				.add_transition(next[0].clone(), 1);
		}
	}

	/// Returns the order of the chain.
	pub fn state_size(&self) -> usize {
		self.state_size
	}

	/// Returns the number of known states.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// Returns `true` if the chain was trained on nothing.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Builds the state a walk starts from.
	///
	/// The seed is appended to a full begin state and only the last
	/// `state_size` tokens are kept: a short seed stays anchored at the
	/// beginning of a sentence, a long one is conditioned on its tail.
	fn start_state(&self, seed: &[String]) -> Vec<Token> {
		let mut tokens: Vec<Token> = vec![Token::Begin; self.state_size];
		tokens.extend(seed.iter().cloned().map(Token::Word));
		tokens.split_off(tokens.len() - self.state_size)
	}

	/// Walks the chain using the thread-local random generator.
	///
	/// See [`Chain::walk_with`].
	pub fn walk(&self, seed: &[String]) -> Vec<String> {
		self.walk_with(seed, &mut rand::rng())
	}

	/// Performs one weighted random walk and returns the generated words.
	///
	/// The seed words are not part of the result. The walk stops on `End`
	/// or when the current state was never observed, in which case the
	/// result may be empty.
	pub fn walk_with<R: Rng + ?Sized>(&self, seed: &[String], rng: &mut R) -> Vec<String> {
		let mut state = self.start_state(seed);
		let mut words = Vec::new();

		while let Some(next) = self.states.get(&state).and_then(|s| s.predict(&mut *rng)) {
			match next {
				Token::Word(word) => {
					words.push(word.clone());
					state.remove(0);
					state.push(next.clone());
				}
				_ => break,
			}
		}

		words
	}

	/// Merges another chain into this one.
	///
	/// Occurrence counts of matching states and transitions are summed.
	///
	/// # Errors
	/// Returns an error if the state sizes do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.state_size != other.state_size {
			return Err(TextError::StateSizeMismatch {
				expected: self.state_size,
				found: other.state_size,
			});
		}

		for (key, state) in &other.states {
			self.states.entry(key.clone()).or_default().merge(state);
		}

		Ok(())
	}

	/// Returns the structural snapshot of the chain.
	pub fn snapshot(&self) -> ChainSnapshot {
		self.clone().into()
	}
}

impl From<Chain> for ChainSnapshot {
	fn from(chain: Chain) -> Self {
		let transitions = chain
			.states
			.into_iter()
			.map(|(key, state)| {
				let next = state
					.transitions()
					.map(|(token, occurrence)| (token.clone(), occurrence))
					.collect();
				(key, next)
			})
			.collect();

		Self { state_size: chain.state_size, transitions }
	}
}

impl TryFrom<ChainSnapshot> for Chain {
	type Error = TextError;

	fn try_from(snapshot: ChainSnapshot) -> Result<Self> {
		let mut chain = Chain::new::<Vec<String>>(&[], snapshot.state_size)?;

		for (key, transitions) in snapshot.transitions {
			if key.len() != chain.state_size {
				return Err(TextError::InvalidSnapshot(format!(
					"state {key:?} has {} tokens, expected {}",
					key.len(),
					chain.state_size
				)));
			}

			let state = chain.states.entry(key).or_default();
			for (next, occurrence) in transitions {
				if occurrence == 0 {
					return Err(TextError::InvalidSnapshot(format!(
						"transition toward {next:?} has no occurrence"
					)));
				}
				state.add_transition(next, occurrence);
			}
		}

		Ok(chain)
	}
}
