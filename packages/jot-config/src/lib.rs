mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, EmbeddingProviderConfig, ProviderRetry, Providers, Search, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	from_toml_str(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn from_toml_str(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	let embedding = &cfg.providers.embedding;

	for (label, value) in [
		("providers.embedding.provider_id", &embedding.provider_id),
		("providers.embedding.api_base", &embedding.api_base),
		("providers.embedding.api_key", &embedding.api_key),
		("providers.embedding.model", &embedding.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !embedding.path.starts_with('/') {
		return Err(Error::Validation {
			message: "providers.embedding.path must start with '/'.".to_string(),
		});
	}
	if embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &embedding.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("providers.embedding.default_headers.{key} must be a string."),
			});
		}
	}

	let retry = &embedding.retry;

	if retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.retry.max_attempts must be greater than zero."
				.to_string(),
		});
	}
	if retry.initial_backoff_ms > retry.max_backoff_ms {
		return Err(Error::Validation {
			message: "providers.embedding.retry.initial_backoff_ms must not exceed max_backoff_ms."
				.to_string(),
		});
	}
	if cfg.search.default_top_k == 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_top_k > cfg.search.max_top_k {
		return Err(Error::Validation {
			message: "search.default_top_k must not exceed search.max_top_k.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.providers.embedding.api_base.trim().trim_end_matches('/').to_string();

	cfg.providers.embedding.api_base = trimmed;

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
