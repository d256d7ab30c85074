mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Feed, Providers, Service, Sharing, SocialGraphConfig,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	for (label, base) in [
		("providers.embedding.api_base", &cfg.providers.embedding.api_base),
		("providers.social_graph.service_url", &cfg.providers.social_graph.service_url),
	] {
		if !(base.starts_with("http://") || base.starts_with("https://")) {
			return Err(Error::Validation {
				message: format!("{label} must be an http or https URL."),
			});
		}
	}

	if !cfg.providers.embedding.path.starts_with('/') {
		return Err(Error::Validation {
			message: "providers.embedding.path must start with '/'.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.social_graph.timeout_ms", cfg.providers.social_graph.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	for (label, headers) in [
		("providers.embedding.default_headers", &cfg.providers.embedding.default_headers),
		("providers.social_graph.default_headers", &cfg.providers.social_graph.default_headers),
	] {
		if headers.values().any(|value| !value.is_string()) {
			return Err(Error::Validation { message: format!("{label} values must be strings.") });
		}
	}

	if !(1..=100).contains(&cfg.feed.base_page_size) {
		return Err(Error::Validation {
			message: "feed.base_page_size must be in the range 1-100.".to_string(),
		});
	}
	if !(1..=100).contains(&cfg.feed.author_feed_limit) {
		return Err(Error::Validation {
			message: "feed.author_feed_limit must be in the range 1-100.".to_string(),
		});
	}
	if cfg.feed.max_concurrent_fetches == 0 {
		return Err(Error::Validation {
			message: "feed.max_concurrent_fetches must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.max_follow_pages == 0 {
		return Err(Error::Validation {
			message: "feed.max_follow_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.max_parent_fetch_depth == 0 {
		return Err(Error::Validation {
			message: "feed.max_parent_fetch_depth must be greater than zero.".to_string(),
		});
	}
	if !(4..=16).contains(&cfg.sharing.key_length) {
		return Err(Error::Validation {
			message: "sharing.key_length must be in the range 4-16.".to_string(),
		});
	}
	if cfg.sharing.max_key_attempts == 0 {
		return Err(Error::Validation {
			message: "sharing.max_key_attempts must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.embedding.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false)
	{
		cfg.providers.embedding.api_key = None;
	}

	for base in
		[&mut cfg.providers.embedding.api_base, &mut cfg.providers.social_graph.service_url]
	{
		while base.ends_with('/') {
			base.pop();
		}
	}
}
