pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String, transient: bool },
	#[error(
		"Embedding dimension mismatch at candidate {index}: query has {expected} dimensions, candidate has {actual}."
	)]
	DimensionMismatch { index: usize, expected: usize, actual: usize },
}
impl Error {
	/// Only provider failures flagged transient are worth retrying at a higher level.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Provider { transient: true, .. })
	}
}

impl From<jot_providers::Error> for Error {
	fn from(err: jot_providers::Error) -> Self {
		Self::Provider { transient: err.is_transient(), message: err.to_string() }
	}
}
