pub mod language;
pub mod post;
pub mod text;
pub mod thread;
pub mod timeline;

pub use language::{LanguageTag, classify_language};
pub use post::{
	Author, Embed, FeedReason, FeedReplyContext, FeedViewPost, ImageView, Post, PostRecord,
	PostView, ProfileView, QuotedRecord, ReplyRef, StrongRef,
};
pub use thread::{InMemoryThreadCache, MAX_THREAD_DEPTH, Thread, ThreadCache, walk_ancestors};
pub use timeline::{
	BaseFeed, Behaviour, Identity, Origin, Replies, SharedMeta, Sorting, TimelineConfig,
	TimelineMeta,
};
