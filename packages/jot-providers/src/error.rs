use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Whether another attempt may succeed: connect failures, timeouts, rate limits and
	/// server-side errors.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Reqwest(err) =>
				err.is_timeout()
					|| err.is_connect()
					|| err.status().is_some_and(|status| {
						status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
					}),
			_ => false,
		}
	}
}
