pub mod entry;
pub mod filter;
pub mod index;
pub mod query;
pub mod ranker;

mod error;
mod time_serde;

use std::{future::Future, pin::Pin};

pub use entry::{Entry, Record};
pub use error::{Error, Result};
pub use filter::CandidateFilter;
pub use query::{ParsedQuery, extract_phrases};
pub use ranker::{HybridRanker, RankMode, RankOutcome, Ranked};

use jot_config::EmbeddingProviderConfig;
use jot_providers::embedding;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns text into vectors. Swapped for a stub in tests.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// The HTTP client from `jot-providers`.
pub struct DefaultProvider;

impl EmbeddingProvider for DefaultProvider {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
