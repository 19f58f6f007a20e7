use thiserror::Error;

/// Failure of a single sentence generation call.
///
/// Generation failures are expected outcomes: short or repetitive corpora
/// routinely exhaust their attempt budget. They never affect the model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
	#[error("unable to produce a sufficiently novel sentence after {tries} attempts")]
	Exhausted { tries: usize },

	#[error("invalid sentence options: {0}")]
	InvalidOptions(String),
}

/// Errors raised while building, hydrating, merging or persisting a model.
#[derive(Error, Debug)]
pub enum TextError {
	#[error("state size must be >= 1, got {0}")]
	InvalidStateSize(usize),

	#[error("state size mismatch: {expected} != {found}")]
	StateSizeMismatch { expected: usize, found: usize },

	#[error("invalid snapshot: {0}")]
	InvalidSnapshot(String),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("binary error: {0}")]
	Binary(#[from] postcard::Error),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TextError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_exhausted_message_reports_attempts() {
		let err = GenerationError::Exhausted { tries: 10 };
		assert_eq!(err.to_string(), "unable to produce a sufficiently novel sentence after 10 attempts");
	}

	#[test]
	fn test_error_display() {
		let err = TextError::InvalidStateSize(0);
		assert!(err.to_string().contains("state size must be >= 1"));

		let err = TextError::StateSizeMismatch { expected: 2, found: 3 };
		assert!(err.to_string().contains("2 != 3"));

		let err = TextError::InvalidSnapshot("bad key".to_owned());
		assert!(err.to_string().contains("invalid snapshot"));

		let err = GenerationError::InvalidOptions("ratio".to_owned());
		assert!(err.to_string().contains("invalid sentence options"));
	}

	#[test]
	fn test_from_json_error() {
		let json_err = serde_json::from_str::<usize>("not a number").unwrap_err();
		let err: TextError = json_err.into();
		assert!(matches!(err, TextError::Json(_)));
	}
}
