use std::sync::RwLock;

use ahash::{AHashMap, AHashSet};

use crate::post::PostView;

/// Upper bound on ancestors collected by [`walk_ancestors`].
pub const MAX_THREAD_DEPTH: usize = 64;

/// Read capability over the process-wide post cache. Lookups never touch the network.
pub trait ThreadCache
where
	Self: Send + Sync,
{
	fn lookup(&self, uri: &str) -> Option<PostView>;
}

/// A post and its cached ancestors, root first.
#[derive(Clone, Debug, PartialEq)]
pub struct Thread(Vec<PostView>);
impl Thread {
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, PostView> {
		self.0.iter()
	}

	pub fn root(&self) -> Option<&PostView> {
		self.0.first()
	}

	pub fn leaf(&self) -> Option<&PostView> {
		self.0.last()
	}

	/// Everything but the leaf.
	pub fn ancestors(&self) -> &[PostView] {
		match self.0.split_last() {
			Some((_, ancestors)) => ancestors,
			None => &[],
		}
	}

	pub fn into_inner(self) -> Vec<PostView> {
		self.0
	}
}

/// Follows `reply.parent` links through the cache. A miss ends the walk with a shorter thread.
pub fn walk_ancestors(cache: &dyn ThreadCache, post: &PostView) -> Thread {
	let mut ancestors = Vec::new();
	let mut seen = AHashSet::new();

	seen.insert(post.uri.clone());

	let mut next = post.parent_uri().map(str::to_string);

	while let Some(uri) = next.take() {
		if ancestors.len() >= MAX_THREAD_DEPTH || !seen.insert(uri.clone()) {
			break;
		}

		let Some(parent) = cache.lookup(&uri) else { break };

		next = parent.parent_uri().map(str::to_string);

		ancestors.push(parent);
	}

	ancestors.reverse();
	ancestors.push(post.clone());

	Thread(ancestors)
}

/// In-memory cache shared by the fetch layer (writer) and the pipeline (reader).
///
/// Post content is immutable per URI, so concurrent writers simply overwrite each other.
#[derive(Debug, Default)]
pub struct InMemoryThreadCache {
	posts: RwLock<AHashMap<String, PostView>>,
}
impl InMemoryThreadCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, post: PostView) {
		let mut posts = self.posts.write().unwrap_or_else(|err| err.into_inner());

		posts.insert(post.uri.clone(), post);
	}

	pub fn extend<I>(&self, posts: I)
	where
		I: IntoIterator<Item = PostView>,
	{
		let mut cached = self.posts.write().unwrap_or_else(|err| err.into_inner());

		for post in posts {
			cached.insert(post.uri.clone(), post);
		}
	}

	pub fn len(&self) -> usize {
		self.posts.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl ThreadCache for InMemoryThreadCache {
	fn lookup(&self, uri: &str) -> Option<PostView> {
		self.posts.read().unwrap_or_else(|err| err.into_inner()).get(uri).cloned()
	}
}
