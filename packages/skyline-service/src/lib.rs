pub mod base_feed;
pub mod behaviour;
pub mod catalog;
pub mod conversation;
pub mod feed;
pub mod filter;
pub mod graph;
pub mod one_from_each;
pub mod ranking;
pub mod scoring;
pub mod sharing;

mod error;

pub use base_feed::SourceFeed;
pub use behaviour::{ResolvedBehaviour, ScoringPrompts, parse_timeline_config};
pub use catalog::{TimelineCatalog, system_catalog};
pub use conversation::ConversationMerger;
pub use error::{Error, Result};
pub use feed::{FeedContext, PrincipledFeed, ProduceFeedOutput};
pub use sharing::{
	InMemorySharedTimelineStore, ShareTimelineRequest, ShareTimelineResponse,
	SharedTimelineRecord, SharedTimelineResponse, SharedTimelineStore,
};
pub use skyline_providers::social::{FeedPage, ProfilePage};

use std::{future::Future, pin::Pin, sync::Arc};

use skyline_config::{Config, EmbeddingProviderConfig, SocialGraphConfig};
use skyline_domain::{
	Behaviour, Identity, InMemoryThreadCache, PostView, ThreadCache, TimelineConfig,
};
use skyline_providers::{embedding, social::XrpcClient};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

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

/// Typed read operations against the social graph.
///
/// Implementations warm the shared thread cache with every post they return; the pipeline only
/// reads that cache.
pub trait SocialGraph
where
	Self: Send + Sync,
{
	fn timeline<'a>(
		&'a self,
		cursor: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<FeedPage>>;

	fn popular<'a>(
		&'a self,
		cursor: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<FeedPage>>;

	fn author_feed<'a>(
		&'a self,
		actor: &'a str,
		cursor: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<FeedPage>>;

	fn follows<'a>(
		&'a self,
		actor: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, Result<ProfilePage>>;

	fn followers<'a>(
		&'a self,
		actor: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, Result<ProfilePage>>;

	fn posts<'a>(&'a self, uris: &'a [String]) -> BoxFuture<'a, Result<Vec<PostView>>>;
}

/// Builds a social-graph client for one caller.
pub trait SocialGraphConnector
where
	Self: Send + Sync,
{
	fn connect(&self, access_token: Option<&str>) -> Result<Arc<dyn SocialGraph>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

pub struct SkylineService {
	pub cfg: Config,
	pub providers: Providers,
	pub cache: Arc<dyn ThreadCache>,
	pub shared: Arc<dyn SharedTimelineStore>,
}

/// Connects [`XrpcClient`]s that all warm the same cache.
pub struct XrpcConnector {
	cfg: SocialGraphConfig,
	cache: Arc<InMemoryThreadCache>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			embedding::embed(cfg, texts)
				.await
				.map_err(|err| Error::EmbeddingServiceFailed { message: err.to_string() })
		})
	}
}

impl SocialGraph for XrpcClient {
	fn timeline<'a>(
		&'a self,
		cursor: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<FeedPage>> {
		Box::pin(async move { self.get_timeline(cursor, limit).await.map_err(social_error) })
	}

	fn popular<'a>(
		&'a self,
		cursor: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<FeedPage>> {
		Box::pin(async move { self.get_popular(cursor, limit).await.map_err(social_error) })
	}

	fn author_feed<'a>(
		&'a self,
		actor: &'a str,
		cursor: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<FeedPage>> {
		Box::pin(
			async move { self.get_author_feed(actor, cursor, limit).await.map_err(social_error) },
		)
	}

	fn follows<'a>(
		&'a self,
		actor: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, Result<ProfilePage>> {
		Box::pin(async move { self.get_follows(actor, cursor).await.map_err(social_error) })
	}

	fn followers<'a>(
		&'a self,
		actor: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, Result<ProfilePage>> {
		Box::pin(async move { self.get_followers(actor, cursor).await.map_err(social_error) })
	}

	fn posts<'a>(&'a self, uris: &'a [String]) -> BoxFuture<'a, Result<Vec<PostView>>> {
		Box::pin(async move { self.get_posts(uris).await.map_err(social_error) })
	}
}

impl XrpcConnector {
	pub fn new(cfg: SocialGraphConfig, cache: Arc<InMemoryThreadCache>) -> Self {
		Self { cfg, cache }
	}
}
impl SocialGraphConnector for XrpcConnector {
	fn connect(&self, access_token: Option<&str>) -> Result<Arc<dyn SocialGraph>> {
		let client =
			XrpcClient::new(&self.cfg, access_token, self.cache.clone()).map_err(social_error)?;

		Ok(Arc::new(client))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl SkylineService {
	pub fn new(cfg: Config, cache: Arc<dyn ThreadCache>) -> Self {
		Self {
			cfg,
			providers: Providers::default(),
			cache,
			shared: Arc::new(InMemorySharedTimelineStore::new()),
		}
	}

	pub fn with_providers(
		cfg: Config,
		cache: Arc<dyn ThreadCache>,
		providers: Providers,
		shared: Arc<dyn SharedTimelineStore>,
	) -> Self {
		Self { cfg, providers, cache, shared }
	}

	/// Resolves `(identity, behaviour)` into a runnable feed. Fails before any I/O on bad input.
	pub fn make_principled_feed(
		&self,
		identity: Identity,
		behaviour: &Behaviour,
	) -> Result<PrincipledFeed> {
		let behaviour = ResolvedBehaviour::resolve(&identity, behaviour)?;

		Ok(PrincipledFeed::new(
			identity,
			behaviour,
			self.providers.embedding.clone(),
			self.cfg.providers.embedding.clone(),
			self.cfg.feed.clone(),
			self.cache.clone(),
		))
	}

	pub fn feed_for(&self, config: &TimelineConfig) -> Result<PrincipledFeed> {
		self.make_principled_feed(config.identity.clone(), &config.behaviour)
	}
}

fn social_error(err: skyline_providers::Error) -> Error {
	Error::SocialGraph { message: err.to_string() }
}
