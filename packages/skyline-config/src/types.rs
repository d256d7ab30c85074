use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub feed: Feed,
	#[serde(default)]
	pub sharing: Sharing,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub social_graph: SocialGraphConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub path: String,
	/// Optional. Sent as a bearer token when present.
	pub api_key: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SocialGraphConfig {
	/// XRPC service root, e.g. "https://public.api.bsky.app".
	pub service_url: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Feed {
	/// Upper bound on posts requested per base feed page.
	pub base_page_size: u32,
	/// Recent posts requested per followed account by the one-from-each sampler.
	pub author_feed_limit: u32,
	pub max_concurrent_fetches: usize,
	pub max_follow_pages: u32,
	pub max_parent_fetch_depth: u32,
}
impl Default for Feed {
	fn default() -> Self {
		Self {
			base_page_size: 100,
			author_feed_limit: 15,
			max_concurrent_fetches: 16,
			max_follow_pages: 50,
			max_parent_fetch_depth: 8,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Sharing {
	pub key_length: usize,
	pub max_key_attempts: u32,
}
impl Default for Sharing {
	fn default() -> Self {
		Self { key_length: 5, max_key_attempts: 8 }
	}
}
