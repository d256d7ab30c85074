use crate::{Error, ProduceFeedOutput, Result, SocialGraph};
use skyline_domain::{BaseFeed, Post};

/// Base feeds served by a single upstream page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFeed {
	Following,
	Popular,
}
impl From<SourceFeed> for BaseFeed {
	fn from(source: SourceFeed) -> Self {
		match source {
			SourceFeed::Following => BaseFeed::Following,
			SourceFeed::Popular => BaseFeed::Popular,
		}
	}
}

/// Loads one page of the viewer's home timeline or of the popular feed.
pub async fn load_base_feed(
	social: &dyn SocialGraph,
	source: SourceFeed,
	cursor: Option<&str>,
	page_size: u32,
) -> Result<ProduceFeedOutput> {
	let page = match source {
		SourceFeed::Following => social.timeline(cursor, page_size).await,
		SourceFeed::Popular => social.popular(cursor, page_size).await,
	}
	.map_err(|err| Error::BaseFeedUnavailable { kind: source.into(), message: err.to_string() })?;
	let posts: Vec<Post> = page.feed.into_iter().map(Post::from).collect();

	tracing::debug!(
		source = BaseFeed::from(source).as_str(),
		count = posts.len(),
		"Loaded base feed."
	);

	Ok(ProduceFeedOutput { posts, cursor: page.cursor })
}
