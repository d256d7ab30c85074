//! XRPC client for the social graph.
//!
//! Every post the client decodes is written into the shared thread cache, so later pipeline
//! stages can reconstruct threads without going back to the network.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, header::HeaderMap};
use serde::de::DeserializeOwned;

use crate::{
	Result,
	wire::{self, FeedResponse, FollowersResponse, FollowsResponse, PostsResponse},
};
use skyline_domain::{Author, FeedViewPost, InMemoryThreadCache, PostView, ProfileView};

const MAX_URIS_PER_GET_POSTS: usize = 25;
const PROFILE_PAGE_LIMIT: u32 = 100;

#[derive(Clone, Debug, Default)]
pub struct FeedPage {
	pub feed: Vec<FeedViewPost>,
	pub cursor: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProfilePage {
	pub profiles: Vec<ProfileView>,
	pub cursor: Option<String>,
}

pub struct XrpcClient {
	http: Client,
	service_url: String,
	headers: HeaderMap,
	cache: Arc<InMemoryThreadCache>,
}
impl XrpcClient {
	pub fn new(
		cfg: &skyline_config::SocialGraphConfig,
		access_token: Option<&str>,
		cache: Arc<InMemoryThreadCache>,
	) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let headers = crate::auth_headers(access_token, &cfg.default_headers)?;

		Ok(Self { http, service_url: cfg.service_url.clone(), headers, cache })
	}

	pub async fn get_timeline(&self, cursor: Option<&str>, limit: u32) -> Result<FeedPage> {
		let params = page_params(cursor, limit);
		let res: FeedResponse = self.query("app.bsky.feed.getTimeline", &params).await?;

		Ok(self.feed_page(res))
	}

	pub async fn get_popular(&self, cursor: Option<&str>, limit: u32) -> Result<FeedPage> {
		let params = page_params(cursor, limit);
		let res: FeedResponse = self.query("app.bsky.unspecced.getPopular", &params).await?;

		Ok(self.feed_page(res))
	}

	pub async fn get_author_feed(
		&self,
		actor: &str,
		cursor: Option<&str>,
		limit: u32,
	) -> Result<FeedPage> {
		let mut params = page_params(cursor, limit);

		params.push(("actor", actor.to_string()));

		let res: FeedResponse = self.query("app.bsky.feed.getAuthorFeed", &params).await?;

		Ok(self.feed_page(res))
	}

	pub async fn get_follows(&self, actor: &str, cursor: Option<&str>) -> Result<ProfilePage> {
		let mut params = page_params(cursor, PROFILE_PAGE_LIMIT);

		params.push(("actor", actor.to_string()));

		let res: FollowsResponse = self.query("app.bsky.graph.getFollows", &params).await?;

		Ok(ProfilePage {
			profiles: res.follows.into_iter().map(Author::from).collect(),
			cursor: res.cursor,
		})
	}

	pub async fn get_followers(&self, actor: &str, cursor: Option<&str>) -> Result<ProfilePage> {
		let mut params = page_params(cursor, PROFILE_PAGE_LIMIT);

		params.push(("actor", actor.to_string()));

		let res: FollowersResponse = self.query("app.bsky.graph.getFollowers", &params).await?;

		Ok(ProfilePage {
			profiles: res.followers.into_iter().map(Author::from).collect(),
			cursor: res.cursor,
		})
	}

	/// Fetches posts by URI. Missing or blocked posts are absent from the result.
	pub async fn get_posts(&self, uris: &[String]) -> Result<Vec<PostView>> {
		let mut posts = Vec::with_capacity(uris.len());

		for chunk in uris.chunks(MAX_URIS_PER_GET_POSTS) {
			let params: Vec<(&str, String)> =
				chunk.iter().map(|uri| ("uris", uri.clone())).collect();
			let res: PostsResponse = self.query("app.bsky.feed.getPosts", &params).await?;

			posts.extend(res.posts.into_iter().filter_map(wire::post_view));
		}

		self.cache.extend(posts.iter().cloned());

		Ok(posts)
	}

	async fn query<T>(&self, nsid: &str, params: &[(&str, String)]) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let url = format!("{}/xrpc/{nsid}", self.service_url);
		let res = self.http.get(url).headers(self.headers.clone()).query(params).send().await?;

		Ok(res.error_for_status()?.json().await?)
	}

	fn feed_page(&self, res: FeedResponse) -> FeedPage {
		let feed: Vec<FeedViewPost> = res.feed.into_iter().filter_map(wire::feed_item).collect();

		self.cache.extend(feed.iter().flat_map(|item| {
			let context = item.reply.iter().flat_map(|reply| {
				reply.root.iter().chain(reply.parent.iter()).cloned().collect::<Vec<_>>()
			});

			std::iter::once(item.post.clone()).chain(context)
		}));

		FeedPage { feed, cursor: res.cursor }
	}
}

fn page_params(cursor: Option<&str>, limit: u32) -> Vec<(&'static str, String)> {
	let mut params = vec![("limit", limit.to_string())];

	if let Some(cursor) = cursor {
		params.push(("cursor", cursor.to_string()));
	}

	params
}
