//! Markov-chain sentence generation library.
//!
//! This crate provides a word-level sentence generator including:
//! - Sentence splitting and corpus preparation with an input filter
//! - A fixed-order Markov chain over word tokens
//! - A novelty filter rejecting output that reproduces the source text
//! - Bounded-retry sentence generation with seed and length control
//! - Snapshot serialization (JSON and compact binary)
//!
//! The entry point is [`model::text_model::TextModel`].

/// Corpus preparation, transition model and sentence generation.
pub mod model;

/// Error types returned by model construction and generation.
pub mod error;

/// I/O utilities (file loading, path helpers).
pub mod io;
