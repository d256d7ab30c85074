//! In-process fakes and fixtures for exercising the feed pipeline without a network.

use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use ahash::{AHashMap, AHashSet};
use serde_json::Map;
use time::{Duration, OffsetDateTime, macros::datetime};

use skyline_config::{
	Config, EmbeddingProviderConfig, Feed, Providers as ProviderConfigs, Service, Sharing,
	SocialGraphConfig,
};
use skyline_domain::{
	Author, Embed, FeedReason, FeedReplyContext, FeedViewPost, InMemoryThreadCache, PostRecord,
	PostView, ProfileView, ReplyRef, StrongRef,
};
use skyline_service::{
	BoxFuture, EmbeddingProvider, Error, FeedPage, InMemorySharedTimelineStore, ProfilePage,
	Providers, Result, SkylineService, SocialGraph, SocialGraphConnector,
};

/// Fixed "now" that fixtures are dated against.
pub const FIXTURE_NOW: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		providers: ProviderConfigs {
			embedding: EmbeddingProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				path: "/embed".to_string(),
				api_key: None,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			social_graph: SocialGraphConfig {
				service_url: "http://127.0.0.1:1".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		feed: Feed::default(),
		sharing: Sharing::default(),
	}
}

/// A service wired to `embedder` and `cache`, with in-memory sharing.
pub fn test_service(
	cfg: Config,
	embedder: Arc<FakeEmbedder>,
	cache: Arc<InMemoryThreadCache>,
) -> SkylineService {
	SkylineService::with_providers(
		cfg,
		cache,
		Providers::new(embedder),
		Arc::new(InMemorySharedTimelineStore::new()),
	)
}

pub fn author(name: &str) -> Author {
	Author {
		did: format!("did:plc:{name}"),
		handle: format!("{name}.test"),
		display_name: Some(name.to_string()),
	}
}

pub fn post_uri(id: &str) -> String {
	format!("at://did:plc:fixture/app.bsky.feed.post/{id}")
}

/// A top-level post created `minutes_ago` before [`FIXTURE_NOW`].
pub fn post_view(id: &str, author_name: &str, text: &str, minutes_ago: i64) -> PostView {
	PostView {
		uri: post_uri(id),
		cid: format!("cid-{id}"),
		author: author(author_name),
		record: PostRecord {
			text: text.to_string(),
			created_at: FIXTURE_NOW - Duration::minutes(minutes_ago),
			reply: None,
		},
		embed: Embed::None,
		indexed_at: None,
	}
}

pub fn reply_view(
	id: &str,
	author_name: &str,
	text: &str,
	minutes_ago: i64,
	parent: &PostView,
) -> PostView {
	let root_uri = parent.root_uri().unwrap_or(&parent.uri).to_string();
	let mut view = post_view(id, author_name, text, minutes_ago);

	view.record.reply = Some(ReplyRef {
		root: StrongRef { uri: root_uri, cid: None },
		parent: StrongRef { uri: parent.uri.clone(), cid: Some(parent.cid.clone()) },
	});

	view
}

pub fn feed_item(view: PostView) -> FeedViewPost {
	FeedViewPost { post: view, reply: None, reason: None }
}

pub fn reply_item(view: PostView, parent: PostView) -> FeedViewPost {
	FeedViewPost {
		post: view,
		reply: Some(FeedReplyContext { root: None, parent: Some(parent) }),
		reason: None,
	}
}

pub fn repost_item(view: PostView, by: &str) -> FeedViewPost {
	FeedViewPost { post: view, reply: None, reason: Some(FeedReason::Repost { by: author(by) }) }
}

/// A scripted social graph. Returned posts warm the shared cache the way a real client does.
pub struct FakeSocialGraph {
	cache: Arc<InMemoryThreadCache>,
	timeline: FeedPage,
	popular: FeedPage,
	author_feeds: AHashMap<String, Vec<FeedViewPost>>,
	follows: Vec<ProfileView>,
	followers: Vec<ProfileView>,
	remote_posts: AHashMap<String, PostView>,
	profile_page_size: usize,
	fail_base_feeds: bool,
	fail_graph: bool,
	failing_authors: AHashSet<String>,
	author_feed_calls: AtomicUsize,
	posts_calls: AtomicUsize,
}
impl FakeSocialGraph {
	pub fn new(cache: Arc<InMemoryThreadCache>) -> Self {
		Self {
			cache,
			timeline: FeedPage::default(),
			popular: FeedPage::default(),
			author_feeds: AHashMap::new(),
			follows: Vec::new(),
			followers: Vec::new(),
			remote_posts: AHashMap::new(),
			profile_page_size: 100,
			fail_base_feeds: false,
			fail_graph: false,
			failing_authors: AHashSet::new(),
			author_feed_calls: AtomicUsize::new(0),
			posts_calls: AtomicUsize::new(0),
		}
	}

	pub fn with_timeline(mut self, feed: Vec<FeedViewPost>, cursor: Option<&str>) -> Self {
		self.timeline = FeedPage { feed, cursor: cursor.map(str::to_string) };

		self
	}

	pub fn with_popular(mut self, feed: Vec<FeedViewPost>, cursor: Option<&str>) -> Self {
		self.popular = FeedPage { feed, cursor: cursor.map(str::to_string) };

		self
	}

	/// Author feed for `name`, newest first.
	pub fn with_author_feed(mut self, name: &str, feed: Vec<FeedViewPost>) -> Self {
		self.author_feeds.insert(author(name).did, feed);

		self
	}

	pub fn with_follows(mut self, names: &[&str]) -> Self {
		self.follows = names.iter().map(|name| author(name)).collect();

		self
	}

	pub fn with_followers(mut self, names: &[&str]) -> Self {
		self.followers = names.iter().map(|name| author(name)).collect();

		self
	}

	/// Posts only reachable through `posts`, e.g. uncached reply parents.
	pub fn with_remote_posts(mut self, posts: Vec<PostView>) -> Self {
		self.remote_posts.extend(posts.into_iter().map(|post| (post.uri.clone(), post)));

		self
	}

	pub fn with_profile_page_size(mut self, size: usize) -> Self {
		self.profile_page_size = size.max(1);

		self
	}

	pub fn failing_base_feeds(mut self) -> Self {
		self.fail_base_feeds = true;

		self
	}

	pub fn failing_graph(mut self) -> Self {
		self.fail_graph = true;

		self
	}

	pub fn failing_author(mut self, name: &str) -> Self {
		self.failing_authors.insert(author(name).did);

		self
	}

	pub fn author_feed_calls(&self) -> usize {
		self.author_feed_calls.load(Ordering::SeqCst)
	}

	pub fn posts_calls(&self) -> usize {
		self.posts_calls.load(Ordering::SeqCst)
	}

	fn serve_feed(&self, page: &FeedPage, limit: u32) -> Result<FeedPage> {
		if self.fail_base_feeds {
			return Err(unavailable("feed"));
		}

		let feed: Vec<FeedViewPost> = page.feed.iter().take(limit as usize).cloned().collect();

		self.warm(&feed);

		Ok(FeedPage { feed, cursor: page.cursor.clone() })
	}

	fn serve_profiles(
		&self,
		profiles: &[ProfileView],
		cursor: Option<&str>,
	) -> Result<ProfilePage> {
		if self.fail_graph {
			return Err(unavailable("graph"));
		}

		let start = cursor.and_then(|cursor| cursor.parse::<usize>().ok()).unwrap_or(0);
		let end = (start + self.profile_page_size).min(profiles.len());
		let page = profiles.get(start..end).unwrap_or_default().to_vec();
		let cursor = (end < profiles.len()).then(|| end.to_string());

		Ok(ProfilePage { profiles: page, cursor })
	}

	fn warm(&self, feed: &[FeedViewPost]) {
		for item in feed {
			self.cache.insert(item.post.clone());

			if let Some(reply) = &item.reply {
				self.cache.extend(reply.root.iter().chain(reply.parent.iter()).cloned());
			}
		}
	}
}
impl SocialGraph for FakeSocialGraph {
	fn timeline<'a>(&'a self, _: Option<&'a str>, limit: u32) -> BoxFuture<'a, Result<FeedPage>> {
		Box::pin(async move { self.serve_feed(&self.timeline, limit) })
	}

	fn popular<'a>(&'a self, _: Option<&'a str>, limit: u32) -> BoxFuture<'a, Result<FeedPage>> {
		Box::pin(async move { self.serve_feed(&self.popular, limit) })
	}

	fn author_feed<'a>(
		&'a self,
		actor: &'a str,
		_: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<FeedPage>> {
		Box::pin(async move {
			self.author_feed_calls.fetch_add(1, Ordering::SeqCst);

			if self.failing_authors.contains(actor) {
				return Err(unavailable(actor));
			}

			let feed: Vec<FeedViewPost> = self
				.author_feeds
				.get(actor)
				.map(|feed| feed.iter().take(limit as usize).cloned().collect())
				.unwrap_or_default();

			self.warm(&feed);

			Ok(FeedPage { feed, cursor: None })
		})
	}

	fn follows<'a>(
		&'a self,
		_: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, Result<ProfilePage>> {
		Box::pin(async move { self.serve_profiles(&self.follows, cursor) })
	}

	fn followers<'a>(
		&'a self,
		_: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, Result<ProfilePage>> {
		Box::pin(async move { self.serve_profiles(&self.followers, cursor) })
	}

	fn posts<'a>(&'a self, uris: &'a [String]) -> BoxFuture<'a, Result<Vec<PostView>>> {
		Box::pin(async move {
			self.posts_calls.fetch_add(1, Ordering::SeqCst);

			let posts: Vec<PostView> =
				uris.iter().filter_map(|uri| self.remote_posts.get(uri).cloned()).collect();

			self.cache.extend(posts.iter().cloned());

			Ok(posts)
		})
	}
}

/// Hands out one shared [`FakeSocialGraph`] and records the access tokens it was asked for.
pub struct FakeConnector {
	graph: Arc<FakeSocialGraph>,
	tokens: Mutex<Vec<Option<String>>>,
}
impl FakeConnector {
	pub fn new(graph: Arc<FakeSocialGraph>) -> Self {
		Self { graph, tokens: Mutex::new(Vec::new()) }
	}

	pub fn tokens(&self) -> Vec<Option<String>> {
		self.tokens.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl SocialGraphConnector for FakeConnector {
	fn connect(&self, access_token: Option<&str>) -> Result<Arc<dyn SocialGraph>> {
		self.tokens
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push(access_token.map(str::to_string));

		Ok(self.graph.clone())
	}
}

/// Embeds text by keyword: the first rule whose keyword occurs in the text decides the vector.
pub struct FakeEmbedder {
	rules: Vec<(String, Vec<f32>)>,
	fallback: Vec<f32>,
	fail: bool,
	drop_last: bool,
	calls: Mutex<Vec<Vec<String>>>,
}
impl FakeEmbedder {
	pub fn new(fallback: Vec<f32>) -> Self {
		Self {
			rules: Vec::new(),
			fallback,
			fail: false,
			drop_last: false,
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn with_rule(mut self, keyword: &str, vector: Vec<f32>) -> Self {
		self.rules.push((keyword.to_string(), vector));

		self
	}

	pub fn failing(mut self) -> Self {
		self.fail = true;

		self
	}

	/// Answers with one vector too few.
	pub fn dropping_last(mut self) -> Self {
		self.drop_last = true;

		self
	}

	/// Every batch received, in call order.
	pub fn calls(&self) -> Vec<Vec<String>> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn vector_for(&self, text: &str) -> Vec<f32> {
		self.rules
			.iter()
			.find(|(keyword, _)| text.contains(keyword.as_str()))
			.map(|(_, vector)| vector.clone())
			.unwrap_or_else(|| self.fallback.clone())
	}
}
impl EmbeddingProvider for FakeEmbedder {
	fn embed<'a>(
		&'a self,
		_: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			self.calls.lock().unwrap_or_else(|err| err.into_inner()).push(texts.to_vec());

			if self.fail {
				return Err(Error::EmbeddingServiceFailed {
					message: "Fake embedder is failing.".to_string(),
				});
			}

			let mut vectors: Vec<Vec<f32>> =
				texts.iter().map(|text| self.vector_for(text)).collect();

			if self.drop_last {
				vectors.pop();
			}

			Ok(vectors)
		})
	}
}

fn unavailable(what: &str) -> Error {
	Error::SocialGraph { message: format!("Fake social graph refused {what}.") }
}
