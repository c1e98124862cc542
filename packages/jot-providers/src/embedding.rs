use std::time::Duration;

use reqwest::{Client, header::HeaderMap};
use serde_json::Value;

use crate::{Error, Result};
use jot_config::{EmbeddingProviderConfig, ProviderRetry};

/// Embeds `texts` through an OpenAI-compatible embeddings endpoint.
///
/// Vectors come back in input order. Transient failures are retried with capped exponential
/// backoff according to `cfg.retry`; the last error is returned once attempts run out.
pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let max_attempts = cfg.retry.max_attempts.max(1);
	let mut attempt = 1;

	loop {
		match post_once(&client, &url, headers.clone(), &body).await {
			Ok(json) => return parse_embedding_response(json, texts.len()),
			Err(err) if err.is_transient() && attempt < max_attempts => {
				let delay = backoff_for_attempt(&cfg.retry, attempt);

				tracing::warn!(
					provider_id = %cfg.provider_id,
					attempt,
					max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = %err,
					"Embedding request failed. Retrying."
				);

				tokio::time::sleep(delay).await;

				attempt += 1;
			},
			Err(err) => {
				tracing::error!(
					provider_id = %cfg.provider_id,
					attempt,
					error = %err,
					"Embedding request failed."
				);

				return Err(err);
			},
		}
	}
}

async fn post_once(client: &Client, url: &str, headers: HeaderMap, body: &Value) -> Result<Value> {
	let res = client.post(url).headers(headers).json(body).send().await?;
	let json = res.error_for_status()?.json().await?;

	Ok(json)
}

fn backoff_for_attempt(retry: &ProviderRetry, attempt: u32) -> Duration {
	let exp = attempt.saturating_sub(1).min(16);
	let base = retry.initial_backoff_ms.saturating_mul(1 << exp);

	Duration::from_millis(base.min(retry.max_backoff_ms))
}

fn parse_embedding_response(json: Value, expected: usize) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;

	if data.len() != expected {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response has {} vectors for {expected} inputs.",
				data.len()
			),
		});
	}

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			let number = number as f32;

			if !number.is_finite() {
				return Err(Error::InvalidResponse {
					message: "Embedding value must be finite as f32.".to_string(),
				});
			}

			vec.push(number);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json, 2).expect("parse failed");

		assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn rejects_vector_count_mismatch() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": [1.0] }] });
		let err = parse_embedding_response(json, 2).expect_err("expected mismatch");

		assert!(err.to_string().contains("1 vectors for 2 inputs"));
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "embedding": [1.0, "x"] }] });
		let err = parse_embedding_response(json, 1).expect_err("expected invalid value");

		assert!(matches!(err, Error::InvalidResponse { .. }));
		assert!(!err.is_transient());
	}

	#[test]
	fn rejects_values_outside_f32_range() {
		let json = serde_json::json!({ "data": [{ "embedding": [0.5, 1e39] }] });
		let err = parse_embedding_response(json, 1).expect_err("expected invalid value");

		assert!(matches!(err, Error::InvalidResponse { .. }));
		assert!(!err.is_transient());
	}

	#[test]
	fn backoff_doubles_until_capped() {
		let retry = ProviderRetry { max_attempts: 5, initial_backoff_ms: 100, max_backoff_ms: 350 };

		assert_eq!(backoff_for_attempt(&retry, 1), Duration::from_millis(100));
		assert_eq!(backoff_for_attempt(&retry, 2), Duration::from_millis(200));
		assert_eq!(backoff_for_attempt(&retry, 3), Duration::from_millis(350));
		assert_eq!(backoff_for_attempt(&retry, 40), Duration::from_millis(350));
	}
}
