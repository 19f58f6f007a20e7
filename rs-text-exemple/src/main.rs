use std::path::PathBuf;

use clap::Parser;

use rs_text_core::model::sentence_options::{Seed, SentenceOptions, TextConfig};
use rs_text_core::model::text_model::TextModel;

/// Generates sentences that sound like a text without copying it.
#[derive(Parser, Debug)]
#[command(name = "rs-text-exemple")]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Source text file (a `.bin` chain cache is written next to it)
	#[arg(short = 'f', long = "file", default_value = "./data/holmes.txt")]
	file: PathBuf,

	/// Number of words the chain conditions on
	#[arg(short = 's', long = "state-size", default_value_t = 2)]
	state_size: usize,

	/// Number of sentences to generate
	#[arg(short = 'n', long = "count", default_value_t = 10)]
	count: usize,

	/// Words every sentence starts with
	#[arg(long = "seed")]
	seed: Option<String>,

	/// Attempts per sentence before giving up
	#[arg(short = 't', long = "tries", default_value_t = 10)]
	tries: usize,

	/// Max ratio of a sentence allowed to overlap the source
	#[arg(long = "max-overlap-ratio", default_value_t = 0.7)]
	max_overlap_ratio: f64,

	/// Max number of consecutive words allowed to overlap the source
	#[arg(long = "max-overlap-total", default_value_t = 15)]
	max_overlap_total: usize,

	/// Max length of a sentence, in characters
	#[arg(short = 'c', long = "max-chars")]
	max_chars: Option<usize>,
}

impl Cli {
	fn sentence_options(&self) -> Result<SentenceOptions, Box<dyn std::error::Error>> {
		let options = SentenceOptions {
			tries: self.tries,
			max_overlap_ratio: self.max_overlap_ratio,
			max_overlap_total: self.max_overlap_total,
			max_chars: self.max_chars,
		};
		options.validate()?;
		Ok(options)
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_default_env()
		.format_timestamp_secs()
		.init();

	let cli = Cli::parse();

	// Train the model, or hydrate it from the cached chain if present
	let model = TextModel::from_file(&cli.file, TextConfig { state_size: cli.state_size })?;
	log::info!("Model ready: {} sentences, state size {}", model.corpus().len(), model.state_size());

	let options = cli.sentence_options()?;
	let seed = Seed::from(cli.seed.clone());

	// A failure is an expected outcome on small corpora: print it and go on
	for i in 0..cli.count {
		match model.make_sentence(seed.clone(), &options) {
			Ok(sentence) => println!("Generated sentence {}: {}", i + 1, sentence),
			Err(e) => println!("Generated sentence {}: <{}>", i + 1, e),
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn test_cli_verify() {
		Cli::command().debug_assert();
	}

	#[test]
	fn test_cli_default() {
		let cli = Cli::parse_from(["rs-text-exemple"]);
		assert_eq!(cli.state_size, 2);
		assert_eq!(cli.count, 10);
		assert!(cli.seed.is_none());

		let options = cli.sentence_options().unwrap();
		assert_eq!(options, SentenceOptions::default());
	}

	#[test]
	fn test_cli_options() {
		let cli = Cli::parse_from(["rs-text-exemple", "--seed", "Sherlock Holmes", "-c", "80", "-t", "100"]);
		assert_eq!(Seed::from(cli.seed.clone()), Seed::Text("Sherlock Holmes".to_owned()));

		let options = cli.sentence_options().unwrap();
		assert_eq!(options.tries, 100);
		assert_eq!(options.max_chars, Some(80));
	}

	#[test]
	fn test_cli_rejects_negative_ratio() {
		let cli = Cli::parse_from(["rs-text-exemple", "--max-overlap-ratio=-1"]);
		assert!(cli.sentence_options().is_err());
	}
}
