//! The "one from each" base feed: a round-robin over followed accounts so prolific posters cannot
//! crowd out quiet ones.

use futures::{StreamExt, stream};
use rand::{Rng, seq::SliceRandom};

use crate::{ProduceFeedOutput, SocialGraph};
use skyline_domain::{Post, PostView, ProfileView};

/// Samples followed accounts. Per-account failures are logged and contribute nothing.
///
/// Only the first round is returned, so the result never paginates.
pub async fn load_one_from_each(
	social: &dyn SocialGraph,
	follows: &[ProfileView],
	cursor: Option<&str>,
	per_account_limit: u32,
	max_concurrency: usize,
) -> ProduceFeedOutput {
	let fetches: Vec<_> = follows
		.iter()
		.map(|follow| original_posts(social, follow, cursor, per_account_limit))
		.collect();
	let per_account: Vec<Vec<PostView>> = stream::iter(fetches)
		.buffered(max_concurrency.max(1))
		.collect()
		.await;
	let rounds = build_rounds(per_account, &mut rand::thread_rng());
	let posts: Vec<Post> =
		rounds.into_iter().next().unwrap_or_default().into_iter().map(Post::from).collect();

	tracing::debug!(
		accounts = follows.len(),
		count = posts.len(),
		"Sampled one post per account."
	);

	ProduceFeedOutput { posts, cursor: None }
}

async fn original_posts(
	social: &dyn SocialGraph,
	follow: &ProfileView,
	cursor: Option<&str>,
	limit: u32,
) -> Vec<PostView> {
	match social.author_feed(&follow.did, cursor, limit).await {
		Ok(page) =>
			page.feed.into_iter().filter(|item| item.is_original()).map(|item| item.post).collect(),
		Err(err) => {
			tracing::warn!(
				error = %err,
				account = %follow.handle,
				"Per-account fetch failed; skipping account."
			);

			Vec::new()
		},
	}
}

/// Groups posts into rounds.
///
/// Each round takes the oldest unconsumed post of every account that still has one, so round `k`
/// holds exactly the accounts with more than `k` posts. Each round is shuffled independently.
pub fn build_rounds<R>(per_account: Vec<Vec<PostView>>, rng: &mut R) -> Vec<Vec<PostView>>
where
	R: Rng + ?Sized,
{
	let mut queues: Vec<std::vec::IntoIter<PostView>> = per_account
		.into_iter()
		.filter(|posts| !posts.is_empty())
		.map(|mut posts| {
			posts.sort_by_key(|post| post.record.created_at);
			posts.into_iter()
		})
		.collect();
	let mut rounds = Vec::new();

	loop {
		let mut round: Vec<PostView> = queues.iter_mut().filter_map(Iterator::next).collect();

		if round.is_empty() {
			break;
		}

		round.shuffle(rng);
		rounds.push(round);
	}

	rounds
}
