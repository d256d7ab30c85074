use ahash::AHashSet;

use crate::{Result, SocialGraph};
use skyline_domain::ProfileView;

#[derive(Clone, Copy, Debug)]
enum ProfileList {
	Follows,
	Followers,
}

/// Every account `actor` follows, deduplicated by DID in first-seen order.
pub async fn load_follows(
	social: &dyn SocialGraph,
	actor: &str,
	max_pages: u32,
) -> Result<Vec<ProfileView>> {
	collect_profiles(social, actor, ProfileList::Follows, max_pages).await
}

pub async fn load_followers(
	social: &dyn SocialGraph,
	actor: &str,
	max_pages: u32,
) -> Result<Vec<ProfileView>> {
	collect_profiles(social, actor, ProfileList::Followers, max_pages).await
}

/// Accounts that `actor` follows and that follow `actor` back, in follow order.
pub async fn load_mutuals(
	social: &dyn SocialGraph,
	actor: &str,
	max_pages: u32,
) -> Result<Vec<ProfileView>> {
	let (follows, followers) = tokio::try_join!(
		load_follows(social, actor, max_pages),
		load_followers(social, actor, max_pages),
	)?;
	let follower_dids: AHashSet<&str> =
		followers.iter().map(|profile| profile.did.as_str()).collect();
	let mutuals: Vec<ProfileView> = follows
		.iter()
		.filter(|profile| follower_dids.contains(profile.did.as_str()))
		.cloned()
		.collect();

	tracing::debug!(
		actor,
		follows = follows.len(),
		followers = followers.len(),
		mutuals = mutuals.len(),
		"Resolved mutuals."
	);

	Ok(mutuals)
}

async fn collect_profiles(
	social: &dyn SocialGraph,
	actor: &str,
	list: ProfileList,
	max_pages: u32,
) -> Result<Vec<ProfileView>> {
	let mut profiles = Vec::new();
	let mut seen = AHashSet::new();
	let mut cursor: Option<String> = None;

	for _ in 0..max_pages {
		let page = match list {
			ProfileList::Follows => social.follows(actor, cursor.as_deref()).await?,
			ProfileList::Followers => social.followers(actor, cursor.as_deref()).await?,
		};
		let exhausted = page.profiles.is_empty();

		for profile in page.profiles {
			if seen.insert(profile.did.clone()) {
				profiles.push(profile);
			}
		}

		match page.cursor {
			Some(next) if !exhausted && cursor.as_deref() != Some(next.as_str()) =>
				cursor = Some(next),
			_ => break,
		}
	}

	Ok(profiles)
}
