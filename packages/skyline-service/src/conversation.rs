//! Out-of-band enrichment of a produced feed with reply context.

use std::sync::Arc;

use ahash::AHashSet;
use tokio::sync::mpsc;

use crate::SocialGraph;
use skyline_domain::{Post, PostView, ThreadCache, walk_ancestors};

const EMISSION_BUFFER: usize = 4;

/// Folds cached ancestors into a post list and streams progressively better versions of it.
///
/// Every emission is a complete replacement of the previous one. The first emission is the input
/// as given; a merge from the current cache follows when it changes anything; a final merge
/// follows when fetching missing parents brought in new posts.
pub struct ConversationMerger {
	social: Arc<dyn SocialGraph>,
	cache: Arc<dyn ThreadCache>,
	max_fetch_depth: u32,
}
impl ConversationMerger {
	pub fn new(
		social: Arc<dyn SocialGraph>,
		cache: Arc<dyn ThreadCache>,
		max_fetch_depth: u32,
	) -> Self {
		Self { social, cache, max_fetch_depth }
	}

	/// Spawns the merge onto the current tokio runtime and returns its emissions.
	pub fn merge(self, posts: Vec<Post>) -> mpsc::Receiver<Vec<Post>> {
		let (tx, rx) = mpsc::channel(EMISSION_BUFFER);

		tokio::spawn(async move { self.run(posts, tx).await });

		rx
	}

	async fn run(self, posts: Vec<Post>, tx: mpsc::Sender<Vec<Post>>) {
		if tx.send(posts.clone()).await.is_err() {
			return;
		}

		let mut latest = posts.clone();
		let merged = merge_with_cache(self.cache.as_ref(), &posts);

		if merged != latest {
			latest = merged;

			if tx.send(latest.clone()).await.is_err() {
				return;
			}
		}

		if self.fetch_missing_parents(&posts).await == 0 {
			return;
		}

		let merged = merge_with_cache(self.cache.as_ref(), &posts);

		if merged != latest {
			// A closed receiver only means nobody wants the update.
			let _ = tx.send(merged).await;
		}
	}

	/// Fetches the first uncached ancestor of every post, repeating up to the depth bound.
	/// Returns how many posts were fetched. Failures end the walk early.
	async fn fetch_missing_parents(&self, posts: &[Post]) -> usize {
		let mut attempted = AHashSet::new();
		let mut fetched = 0;

		for _ in 0..self.max_fetch_depth {
			let missing: Vec<String> = posts
				.iter()
				.filter_map(|post| {
					let thread = walk_ancestors(self.cache.as_ref(), &post.view);

					thread.root().and_then(PostView::parent_uri).map(str::to_string)
				})
				.filter(|uri| self.cache.lookup(uri).is_none())
				.filter(|uri| attempted.insert(uri.clone()))
				.collect();

			if missing.is_empty() {
				break;
			}

			match self.social.posts(&missing).await {
				Ok(views) if views.is_empty() => break,
				Ok(views) => fetched += views.len(),
				Err(err) => {
					tracing::warn!(error = %err, count = missing.len(), "Parent fetch failed.");

					break;
				},
			}
		}

		tracing::debug!(fetched, "Fetched missing parents.");

		fetched
	}
}

/// Attaches cached ancestors as `replying_to` and drops posts already shown as an ancestor of
/// another listed post. Repeated URIs keep their first occurrence. Order is otherwise kept.
pub fn merge_with_cache(cache: &dyn ThreadCache, posts: &[Post]) -> Vec<Post> {
	let merged: Vec<Post> = posts
		.iter()
		.map(|post| {
			let ancestors = walk_ancestors(cache, &post.view).ancestors().to_vec();

			Post { replying_to: ancestors, ..post.clone() }
		})
		.collect();
	let shown_as_ancestor: AHashSet<&str> = merged
		.iter()
		.flat_map(|post| post.replying_to.iter().map(|view| view.uri.as_str()))
		.collect();
	let mut seen = AHashSet::new();

	merged
		.iter()
		.filter(|post| !shown_as_ancestor.contains(post.uri()))
		.filter(|post| seen.insert(post.uri().to_string()))
		.cloned()
		.collect()
}
