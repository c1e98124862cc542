use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub retry: ProviderRetry,
}

/// Retry policy for transient provider failures.
///
/// `max_attempts` counts the first request, so `1` disables retries.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRetry {
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	#[serde(default = "default_initial_backoff_ms")]
	pub initial_backoff_ms: u64,
	#[serde(default = "default_max_backoff_ms")]
	pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	#[serde(default = "default_max_top_k")]
	pub max_top_k: u32,
}

impl Default for ProviderRetry {
	fn default() -> Self {
		Self {
			max_attempts: default_max_attempts(),
			initial_backoff_ms: default_initial_backoff_ms(),
			max_backoff_ms: default_max_backoff_ms(),
		}
	}
}

impl Default for Search {
	fn default() -> Self {
		Self { default_top_k: default_top_k(), max_top_k: default_max_top_k() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_attempts() -> u32 {
	3
}

fn default_initial_backoff_ms() -> u64 {
	200
}

fn default_max_backoff_ms() -> u64 {
	2_000
}

fn default_top_k() -> u32 {
	10
}

fn default_max_top_k() -> u32 {
	100
}
