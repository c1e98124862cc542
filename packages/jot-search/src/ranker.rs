use std::sync::Arc;

use serde::Serialize;

use crate::{
	DefaultProvider, EmbeddingProvider, Error, Result,
	entry::Record,
	index::{self, FlatIndex},
	query,
};
use jot_config::EmbeddingProviderConfig;

/// How a result list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMode {
	/// The query had nothing outside quotes, so only the phrase filter ran.
	NoFreeText,
	/// No surviving candidate carried an embedding, so only the phrase filter ran.
	NoEmbeddings,
	/// Survivors with embeddings were ordered by distance to the query embedding.
	Semantic,
}

#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a, R> {
	pub record: &'a R,
	/// Position of the record in the candidate slice.
	pub position: usize,
	/// Squared L2 distance to the normalized query embedding. `None` outside semantic mode.
	pub distance: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct RankOutcome<'a, R> {
	pub mode: RankMode,
	/// Candidates left after the phrase filter.
	pub filtered: usize,
	pub items: Vec<Ranked<'a, R>>,
}
impl<'a, R> RankOutcome<'a, R> {
	pub fn records(&self) -> Vec<&'a R> {
		self.items.iter().map(|item| item.record).collect()
	}
}

/// Phrase filter followed by exact nearest-neighbor ordering.
///
/// Holds only immutable configuration and a shared provider handle; every call builds and
/// drops its own index, so one ranker can serve concurrent requests.
#[derive(Clone)]
pub struct HybridRanker {
	cfg: EmbeddingProviderConfig,
	provider: Arc<dyn EmbeddingProvider>,
}
impl HybridRanker {
	pub fn new(cfg: EmbeddingProviderConfig) -> Self {
		Self { cfg, provider: Arc::new(DefaultProvider) }
	}

	pub fn with_provider(
		cfg: EmbeddingProviderConfig,
		provider: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { cfg, provider }
	}

	pub async fn rank<'a, R>(
		&self,
		candidates: &'a [R],
		query: &str,
		top_k: usize,
	) -> Result<Vec<&'a R>>
	where
		R: Record + Sync,
	{
		Ok(self.rank_scored(candidates, query, top_k).await?.records())
	}

	pub async fn rank_scored<'a, R>(
		&self,
		candidates: &'a [R],
		query: &str,
		top_k: usize,
	) -> Result<RankOutcome<'a, R>>
	where
		R: Record + Sync,
	{
		if top_k == 0 {
			return Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		let parsed = query::parse(query);
		let filtered: Vec<(usize, &'a R)> = candidates
			.iter()
			.enumerate()
			.filter(|(_, candidate)| parsed.matches(candidate.text()))
			.collect();

		if !parsed.has_free_text() {
			tracing::debug!(
				phrases = parsed.phrases.len(),
				filtered = filtered.len(),
				"Query has no free text. Returning phrase matches."
			);

			return Ok(filter_only(RankMode::NoFreeText, &filtered, top_k));
		}

		let eligible: Vec<(usize, &'a R, &'a [f32])> = filtered
			.iter()
			.filter_map(|&(position, record)| {
				R::embedding(record).map(|embedding| (position, record, embedding))
			})
			.collect();

		if eligible.is_empty() {
			tracing::debug!(
				filtered = filtered.len(),
				"No candidate carries an embedding. Returning phrase matches."
			);

			return Ok(filter_only(RankMode::NoEmbeddings, &filtered, top_k));
		}

		let query_vector = self.embed_query(query).await?;
		let mut flat = FlatIndex::with_capacity(query_vector.len(), eligible.len());

		for &(position, _, embedding) in &eligible {
			flat.add(embedding).map_err(|err| match err {
				Error::DimensionMismatch { expected, actual, .. } =>
					Error::DimensionMismatch { index: position, expected, actual },
				other => other,
			})?;
		}

		let k = top_k.min(flat.len());
		let hits = flat.search(&query_vector, k)?;

		tracing::debug!(
			filtered = filtered.len(),
			eligible = eligible.len(),
			dim = flat.dim(),
			returned = hits.len(),
			"Ranked candidates by embedding distance."
		);

		let items = hits
			.into_iter()
			.map(|hit| {
				let (position, record, _) = eligible[hit.row];

				Ranked { record, position, distance: Some(hit.distance) }
			})
			.collect();

		Ok(RankOutcome { mode: RankMode::Semantic, filtered: filtered.len(), items })
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let texts = [query.to_string()];
		let mut vectors = self.provider.embed(&self.cfg, &texts).await?;

		if vectors.len() != 1 {
			return Err(Error::Provider {
				message: format!("Expected one query embedding, got {}.", vectors.len()),
				transient: false,
			});
		}

		let mut vector = vectors.swap_remove(0);

		if vector.is_empty() {
			return Err(Error::Provider {
				message: "Query embedding is empty.".to_string(),
				transient: false,
			});
		}
		if !vector.iter().all(|value| value.is_finite()) {
			return Err(Error::Provider {
				message: "Query embedding contains non-finite values.".to_string(),
				transient: false,
			});
		}

		index::l2_normalize(&mut vector);

		Ok(vector)
	}
}

fn filter_only<'a, R>(
	mode: RankMode,
	filtered: &[(usize, &'a R)],
	top_k: usize,
) -> RankOutcome<'a, R> {
	let items = filtered
		.iter()
		.take(top_k)
		.map(|&(position, record)| Ranked { record, position, distance: None })
		.collect();

	RankOutcome { mode, filtered: filtered.len(), items }
}
