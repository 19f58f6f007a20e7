//! Top-level module for sentence generation.
//!
//! This module provides a word-level Markov sentence generator, including:
//! - Sentence splitting (`sentences`) and corpus preparation (`corpus`)
//! - A fixed-order word chain (`Chain`) and its states (`State`)
//! - The novelty filter (`NoveltyFilter`)
//! - Generation options (`SentenceOptions`, `Seed`, `TextConfig`)
//! - The high-level model (`TextModel`)

/// High-level model: corpus, reference text, chain and bounded-retry generation.
pub mod text_model;

/// Fixed-order word Markov chain and its structural snapshot.
pub mod chain;

/// Outgoing transitions of a single chain state.
///
/// Not exposed publicly.
mod state;

/// Sentence boundary detection.
pub mod sentences;

/// Sentence filtering, word splitting and reference text construction.
pub mod corpus;

/// Overlap detection between generated sentences and the source text.
pub mod novelty;

/// Seed and options of a generation call, construction settings.
pub mod sentence_options;
