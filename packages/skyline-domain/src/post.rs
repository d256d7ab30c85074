//! Typed view of social-graph posts as the feed pipeline consumes them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
	/// Stable account identifier.
	pub did: String,
	/// Display handle. Accounts may change it.
	pub handle: String,
	#[serde(default)]
	pub display_name: Option<String>,
}
impl Author {
	/// Display name when set and non-blank, otherwise the handle.
	pub fn display_name_or_handle(&self) -> &str {
		self.display_name
			.as_deref()
			.map(str::trim)
			.filter(|name| !name.is_empty())
			.unwrap_or(self.handle.as_str())
	}
}

/// Profile of an account in a follow or follower list.
pub type ProfileView = Author;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongRef {
	pub uri: String,
	#[serde(default)]
	pub cid: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
	pub root: StrongRef,
	pub parent: StrongRef,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
	#[serde(default)]
	pub text: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(default)]
	pub reply: Option<ReplyRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageView {
	pub thumb: String,
	pub fullsize: String,
	#[serde(default)]
	pub alt: String,
}

/// A record embedded by a quote post. `text` is only present when the record is a visible post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedRecord {
	pub uri: String,
	#[serde(default)]
	pub author: Option<Author>,
	#[serde(default)]
	pub text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Embed {
	#[default]
	None,
	Images { images: Vec<ImageView> },
	Record { record: QuotedRecord },
	RecordWithMedia { record: QuotedRecord, images: Vec<ImageView> },
}
impl Embed {
	pub fn images(&self) -> &[ImageView] {
		match self {
			Self::Images { images } | Self::RecordWithMedia { images, .. } => images,
			Self::None | Self::Record { .. } => &[],
		}
	}

	pub fn quoted(&self) -> Option<&QuotedRecord> {
		match self {
			Self::Record { record } | Self::RecordWithMedia { record, .. } => Some(record),
			Self::None | Self::Images { .. } => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostView {
	pub uri: String,
	pub cid: String,
	pub author: Author,
	pub record: PostRecord,
	#[serde(default)]
	pub embed: Embed,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub indexed_at: Option<OffsetDateTime>,
}
impl PostView {
	pub fn parent_uri(&self) -> Option<&str> {
		self.record.reply.as_ref().map(|reply| reply.parent.uri.as_str())
	}

	pub fn root_uri(&self) -> Option<&str> {
		self.record.reply.as_ref().map(|reply| reply.root.uri.as_str())
	}

	pub fn is_reply(&self) -> bool {
		self.record.reply.is_some()
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedReason {
	Repost { by: Author },
}

/// Reply context delivered alongside a feed item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedReplyContext {
	pub root: Option<PostView>,
	pub parent: Option<PostView>,
}

/// One item of a social-graph feed page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedViewPost {
	pub post: PostView,
	#[serde(default)]
	pub reply: Option<FeedReplyContext>,
	#[serde(default)]
	pub reason: Option<FeedReason>,
}
impl FeedViewPost {
	/// True for authored top-level posts: not a repost, not a reply.
	pub fn is_original(&self) -> bool {
		self.reason.is_none() && self.reply.is_none() && !self.post.is_reply()
	}
}

/// The unit flowing through the feed pipeline.
///
/// `embedding` and `score` are only populated when semantic scoring ran.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
	pub view: PostView,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reposted_by: Option<Author>,
	/// Ancestors attached by conversation merging, root first.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub replying_to: Vec<PostView>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding: Option<Vec<f32>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<f32>,
}
impl Post {
	pub fn uri(&self) -> &str {
		&self.view.uri
	}

	pub fn author_did(&self) -> &str {
		&self.view.author.did
	}

	pub fn created_at(&self) -> OffsetDateTime {
		self.view.record.created_at
	}
}
impl From<PostView> for Post {
	fn from(view: PostView) -> Self {
		Self { view, reposted_by: None, replying_to: Vec::new(), embedding: None, score: None }
	}
}
impl From<FeedViewPost> for Post {
	fn from(item: FeedViewPost) -> Self {
		let reposted_by = match item.reason {
			Some(FeedReason::Repost { by }) => Some(by),
			None => None,
		};

		Self { reposted_by, ..Self::from(item.post) }
	}
}
