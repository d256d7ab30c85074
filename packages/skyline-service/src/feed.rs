//! The produce/post-process pair behind every timeline.

use std::sync::Arc;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::{
	ConversationMerger, EmbeddingProvider, Error, ResolvedBehaviour, Result, SocialGraph,
	base_feed::{self, SourceFeed},
	filter, graph, one_from_each, ranking, scoring,
};
use skyline_config::{EmbeddingProviderConfig, Feed};
use skyline_domain::{BaseFeed, Identity, Post, ThreadCache};

/// Per-request inputs: whose feed is produced and how to reach the social graph on their behalf.
#[derive(Clone)]
pub struct FeedContext {
	pub social: Arc<dyn SocialGraph>,
	pub ego_handle: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProduceFeedOutput {
	pub posts: Vec<Post>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cursor: Option<String>,
}

/// A resolved timeline, ready to run.
pub struct PrincipledFeed {
	identity: Identity,
	behaviour: ResolvedBehaviour,
	embedding: Arc<dyn EmbeddingProvider>,
	embedding_cfg: EmbeddingProviderConfig,
	feed_cfg: Feed,
	cache: Arc<dyn ThreadCache>,
}
impl PrincipledFeed {
	pub(crate) fn new(
		identity: Identity,
		behaviour: ResolvedBehaviour,
		embedding: Arc<dyn EmbeddingProvider>,
		embedding_cfg: EmbeddingProviderConfig,
		feed_cfg: Feed,
		cache: Arc<dyn ThreadCache>,
	) -> Self {
		Self { identity, behaviour, embedding, embedding_cfg, feed_cfg, cache }
	}

	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	pub fn behaviour(&self) -> &ResolvedBehaviour {
		&self.behaviour
	}

	/// Fetches, filters, scores, thresholds, and sorts one page.
	pub async fn produce_feed(
		&self,
		ctx: &FeedContext,
		cursor: Option<&str>,
	) -> Result<ProduceFeedOutput> {
		let social = ctx.social.as_ref();
		let ego = ctx.ego_handle.as_str();
		let (mutual_dids, page) = tokio::try_join!(
			self.load_mutual_dids(social, ego),
			self.load_base_feed(social, ego, cursor)
		)?;
		let posts = filter::apply_filters(page.posts, &self.behaviour, mutual_dids.as_ref());
		let (mut posts, scored) = match &self.behaviour.scoring {
			Some(prompts) => {
				let scored = scoring::score_posts(
					self.embedding.as_ref(),
					&self.embedding_cfg,
					self.cache.as_ref(),
					posts,
					prompts,
				)
				.await?;
				let minimum = self.behaviour.minimum_score;
				let kept: Vec<Post> = scored
					.into_iter()
					.filter(|post| post.score.is_some_and(|score| score > minimum))
					.collect();

				(kept, true)
			},
			None => (posts, false),
		};

		ranking::sort_posts(&mut posts, self.behaviour.sorting, scored, OffsetDateTime::now_utc());

		tracing::info!(
			timeline = %self.identity.name,
			base_feed = self.behaviour.base_feed.as_str(),
			scored,
			count = posts.len(),
			"Produced feed."
		);

		Ok(ProduceFeedOutput { posts, cursor: page.cursor })
	}

	/// Starts conversation merging for an already produced list.
	pub fn post_process_feed(
		&self,
		ctx: &FeedContext,
		posts: Vec<Post>,
	) -> mpsc::Receiver<Vec<Post>> {
		ConversationMerger::new(
			ctx.social.clone(),
			self.cache.clone(),
			self.feed_cfg.max_parent_fetch_depth,
		)
		.merge(posts)
	}

	async fn load_mutual_dids(
		&self,
		social: &dyn SocialGraph,
		ego: &str,
	) -> Result<Option<AHashSet<String>>> {
		if !self.behaviour.mutuals_only {
			return Ok(None);
		}

		let mutuals = graph::load_mutuals(social, ego, self.feed_cfg.max_follow_pages).await?;

		Ok(Some(mutuals.into_iter().map(|profile| profile.did).collect()))
	}

	async fn load_base_feed(
		&self,
		social: &dyn SocialGraph,
		ego: &str,
		cursor: Option<&str>,
	) -> Result<ProduceFeedOutput> {
		let page_size = self.feed_cfg.base_page_size;

		match self.behaviour.base_feed {
			BaseFeed::Following =>
				base_feed::load_base_feed(social, SourceFeed::Following, cursor, page_size).await,
			BaseFeed::Popular =>
				base_feed::load_base_feed(social, SourceFeed::Popular, cursor, page_size).await,
			BaseFeed::OneFromEach => {
				let follows = graph::load_follows(social, ego, self.feed_cfg.max_follow_pages)
					.await
					.map_err(|err| Error::BaseFeedUnavailable {
						kind: BaseFeed::OneFromEach,
						message: err.to_string(),
					})?;

				Ok(one_from_each::load_one_from_each(
					social,
					&follows,
					cursor,
					self.feed_cfg.author_feed_limit,
					self.feed_cfg.max_concurrent_fetches,
				)
				.await)
			},
		}
	}
}
