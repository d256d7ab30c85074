//! XRPC response payloads and their conversion into the domain view model.

use serde::Deserialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use skyline_domain::{
	Author, Embed, FeedReason, FeedReplyContext, FeedViewPost, ImageView, PostRecord, PostView,
	QuotedRecord, ReplyRef, StrongRef,
};

const IMAGES_VIEW: &str = "app.bsky.embed.images#view";
const RECORD_VIEW: &str = "app.bsky.embed.record#view";
const RECORD_WITH_MEDIA_VIEW: &str = "app.bsky.embed.recordWithMedia#view";
const RECORD_VIEW_RECORD: &str = "app.bsky.embed.record#viewRecord";
const REASON_REPOST: &str = "app.bsky.feed.defs#reasonRepost";

#[derive(Debug, Deserialize)]
pub(crate) struct FeedResponse {
	#[serde(default)]
	pub(crate) feed: Vec<WireFeedItem>,
	#[serde(default)]
	pub(crate) cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FollowsResponse {
	#[serde(default)]
	pub(crate) follows: Vec<WireAuthor>,
	#[serde(default)]
	pub(crate) cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FollowersResponse {
	#[serde(default)]
	pub(crate) followers: Vec<WireAuthor>,
	#[serde(default)]
	pub(crate) cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostsResponse {
	#[serde(default)]
	pub(crate) posts: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFeedItem {
	post: Value,
	#[serde(default)]
	reply: Option<WireReplyContext>,
	#[serde(default)]
	reason: Option<Value>,
}

// Parent and root may be not-found or blocked stubs; those convert to `None`.
#[derive(Debug, Deserialize)]
struct WireReplyContext {
	#[serde(default)]
	root: Option<Value>,
	#[serde(default)]
	parent: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireAuthor {
	did: String,
	handle: String,
	#[serde(default)]
	display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePostView {
	uri: String,
	cid: String,
	author: WireAuthor,
	record: WirePostRecord,
	#[serde(default)]
	embed: Option<Value>,
	#[serde(default)]
	indexed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePostRecord {
	#[serde(default)]
	text: String,
	#[serde(default)]
	created_at: Option<String>,
	#[serde(default)]
	reply: Option<WireReplyRef>,
}

#[derive(Debug, Deserialize)]
struct WireReplyRef {
	root: WireStrongRef,
	parent: WireStrongRef,
}

#[derive(Debug, Deserialize)]
struct WireStrongRef {
	uri: String,
	#[serde(default)]
	cid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
	thumb: String,
	fullsize: String,
	#[serde(default)]
	alt: String,
}

impl From<WireAuthor> for Author {
	fn from(author: WireAuthor) -> Self {
		Self { did: author.did, handle: author.handle, display_name: author.display_name }
	}
}

impl From<WireStrongRef> for StrongRef {
	fn from(value: WireStrongRef) -> Self {
		Self { uri: value.uri, cid: value.cid }
	}
}

/// Converts one feed item. Items whose post cannot be decoded are dropped with a warning.
pub(crate) fn feed_item(item: WireFeedItem) -> Option<FeedViewPost> {
	let post = post_view(item.post)?;
	let reply = item.reply.map(|reply| FeedReplyContext {
		root: reply.root.and_then(post_view),
		parent: reply.parent.and_then(post_view),
	});
	let reason = item.reason.and_then(feed_reason);

	Some(FeedViewPost { post, reply, reason })
}

pub(crate) fn post_view(value: Value) -> Option<PostView> {
	// Stubs for missing or blocked posts carry no record.
	value.get("record")?;

	let wire: WirePostView = match serde_json::from_value(value) {
		Ok(wire) => wire,
		Err(err) => {
			tracing::warn!(error = %err, "Dropping undecodable post view.");

			return None;
		},
	};
	let indexed_at = wire.indexed_at.as_deref().and_then(parse_time);
	let Some(created_at) = wire.record.created_at.as_deref().and_then(parse_time).or(indexed_at)
	else {
		tracing::warn!(uri = %wire.uri, "Dropping post without a usable timestamp.");

		return None;
	};
	let embed = wire.embed.as_ref().map(convert_embed).unwrap_or_default();

	Some(PostView {
		uri: wire.uri,
		cid: wire.cid,
		author: wire.author.into(),
		record: PostRecord {
			text: wire.record.text,
			created_at,
			reply: wire.record.reply.map(|reply| ReplyRef {
				root: reply.root.into(),
				parent: reply.parent.into(),
			}),
		},
		embed,
		indexed_at,
	})
}

fn feed_reason(value: Value) -> Option<FeedReason> {
	if value.get("$type").and_then(Value::as_str) != Some(REASON_REPOST) {
		return None;
	}

	let by: WireAuthor = serde_json::from_value(value.get("by")?.clone()).ok()?;

	Some(FeedReason::Repost { by: by.into() })
}

fn convert_embed(value: &Value) -> Embed {
	match value.get("$type").and_then(Value::as_str) {
		Some(IMAGES_VIEW) => Embed::Images { images: image_views(value) },
		Some(RECORD_VIEW) => match value.get("record").and_then(quoted_record) {
			Some(record) => Embed::Record { record },
			None => Embed::None,
		},
		Some(RECORD_WITH_MEDIA_VIEW) => {
			let record = value.get("record").and_then(|record| record.get("record"));
			let images = match value.get("media") {
				Some(media) if media.get("$type").and_then(Value::as_str) == Some(IMAGES_VIEW) =>
					image_views(media),
				_ => Vec::new(),
			};

			match record.and_then(quoted_record) {
				Some(record) => Embed::RecordWithMedia { record, images },
				None if !images.is_empty() => Embed::Images { images },
				None => Embed::None,
			}
		},
		_ => Embed::None,
	}
}

fn image_views(value: &Value) -> Vec<ImageView> {
	let Some(raw) = value.get("images") else { return Vec::new() };

	serde_json::from_value::<Vec<WireImage>>(raw.clone())
		.map(|images| {
			images
				.into_iter()
				.map(|image| ImageView {
					thumb: image.thumb,
					fullsize: image.fullsize,
					alt: image.alt,
				})
				.collect()
		})
		.unwrap_or_default()
}

fn quoted_record(value: &Value) -> Option<QuotedRecord> {
	let uri = value.get("uri").and_then(Value::as_str)?.to_string();

	if value.get("$type").and_then(Value::as_str) != Some(RECORD_VIEW_RECORD) {
		return Some(QuotedRecord { uri, author: None, text: None });
	}

	let author = value
		.get("author")
		.cloned()
		.and_then(|author| serde_json::from_value::<WireAuthor>(author).ok())
		.map(Author::from);
	let text = value
		.get("value")
		.and_then(|record| record.get("text"))
		.and_then(Value::as_str)
		.map(str::to_string);

	Some(QuotedRecord { uri, author, text })
}

fn parse_time(raw: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(raw, &Rfc3339).ok()
}
