use time::{OffsetDateTime, macros::datetime};

use skyline_domain::{
	Author, Embed, FeedReason, FeedViewPost, InMemoryThreadCache, MAX_THREAD_DEPTH, Post,
	PostRecord, PostView, ReplyRef, StrongRef, ThreadCache, text, walk_ancestors,
};

fn author(name: &str) -> Author {
	Author {
		did: format!("did:plc:{name}"),
		handle: format!("{name}.test"),
		display_name: Some(name.to_uppercase()),
	}
}

fn uri(id: &str) -> String {
	format!("at://did:plc:x/app.bsky.feed.post/{id}")
}

fn post(id: &str, who: &str, text: &str, parent: Option<&str>) -> PostView {
	let reply = parent.map(|parent| ReplyRef {
		root: StrongRef { uri: uri("root"), cid: None },
		parent: StrongRef { uri: uri(parent), cid: None },
	});

	PostView {
		uri: uri(id),
		cid: format!("cid-{id}"),
		author: author(who),
		record: PostRecord {
			text: text.to_string(),
			created_at: datetime!(2024-05-01 12:00 UTC),
			reply,
		},
		embed: Embed::None,
		indexed_at: None,
	}
}

#[test]
fn post_without_cached_parent_is_single_element_thread() {
	let cache = InMemoryThreadCache::new();
	let orphan = post("leaf", "alice", "hi", Some("missing"));
	let thread = walk_ancestors(&cache, &orphan);

	assert_eq!(thread.len(), 1);
	assert_eq!(thread.leaf(), Some(&orphan));
	assert!(thread.ancestors().is_empty());
}

#[test]
fn three_cached_ancestors_give_root_to_leaf_thread() {
	let cache = InMemoryThreadCache::new();

	cache.extend([
		post("root", "alice", "first", None),
		post("a", "bob", "second", Some("root")),
		post("b", "carol", "third", Some("a")),
	]);

	let leaf = post("c", "dave", "fourth", Some("b"));
	let thread = walk_ancestors(&cache, &leaf);
	let uris: Vec<_> = thread.iter().map(|item| item.uri.clone()).collect();

	assert_eq!(uris, vec![uri("root"), uri("a"), uri("b"), uri("c")]);
}

#[test]
fn walk_stops_at_first_missing_ancestor() {
	let cache = InMemoryThreadCache::new();

	cache.extend([post("root", "alice", "first", None), post("b", "carol", "third", Some("a"))]);

	let thread = walk_ancestors(&cache, &post("c", "dave", "fourth", Some("b")));

	assert_eq!(thread.len(), 2);
	assert_eq!(thread.root().map(|root| root.uri.as_str()), Some(uri("b").as_str()));
}

#[test]
fn walk_terminates_on_cycles_and_depth() {
	let cache = InMemoryThreadCache::new();

	cache.extend([post("a", "alice", "x", Some("b")), post("b", "bob", "y", Some("a"))]);

	assert_eq!(walk_ancestors(&cache, &post("c", "carol", "z", Some("a"))).len(), 3);

	for index in 0..(MAX_THREAD_DEPTH + 10) {
		let parent = if index == 0 { None } else { Some(format!("n{}", index - 1)) };

		cache.insert(post(&format!("n{index}"), "alice", "x", parent.as_deref()));
	}

	let deep_parent = format!("n{}", MAX_THREAD_DEPTH + 9);
	let deep_leaf = post("leaf", "bob", "y", Some(deep_parent.as_str()));

	assert_eq!(walk_ancestors(&cache, &deep_leaf).len(), MAX_THREAD_DEPTH + 1);
}

#[test]
fn cache_lookup_is_last_write_wins() {
	let cache = InMemoryThreadCache::new();

	cache.insert(post("a", "alice", "old", None));
	cache.insert(post("a", "alice", "new", None));

	assert_eq!(cache.len(), 1);
	assert_eq!(cache.lookup(&uri("a")).map(|view| view.record.text), Some("new".to_string()));
	assert!(cache.lookup(&uri("b")).is_none());
}

#[test]
fn serialization_renders_thread_and_is_deterministic() {
	let cache = InMemoryThreadCache::new();

	cache.insert(post("root", "alice", "Cats are great", None));

	let reply = post("r", "bob", "Agreed!", Some("root"));
	let first = text::serialize_post(&cache, &reply);
	let second = text::serialize_post(&cache, &reply);

	assert_eq!(first, second);
	assert_eq!(
		first,
		"ALICE (@alice.test) says:\n> Cats are great\n\n---\n\nBOB (@bob.test) replies:\n> Agreed!"
	);
}

#[test]
fn feed_item_repost_reason_is_carried_into_post() {
	let item = FeedViewPost {
		post: post("a", "alice", "hi", None),
		reply: None,
		reason: Some(FeedReason::Repost { by: author("bob") }),
	};

	assert!(!item.is_original());

	let converted = Post::from(item);

	assert_eq!(converted.reposted_by.map(|by| by.handle), Some("bob.test".to_string()));
	assert!(converted.score.is_none());
	assert!(converted.embedding.is_none());
}

#[test]
fn post_view_round_trips_through_json_with_rfc3339_times() {
	let mut view = post("a", "alice", "hi", Some("root"));

	view.indexed_at = Some(OffsetDateTime::UNIX_EPOCH);

	let json = serde_json::to_value(&view).expect("Failed to serialize post view.");

	assert_eq!(json["record"]["created_at"], "2024-05-01T12:00:00Z");
	assert_eq!(json["indexed_at"], "1970-01-01T00:00:00Z");
	assert_eq!(json["embed"]["kind"], "none");

	let parsed: PostView = serde_json::from_value(json).expect("Failed to parse post view.");

	assert_eq!(parsed, view);
}

#[test]
fn post_view_accepts_offsets_and_a_missing_indexed_at() {
	let mut json = serde_json::to_value(post("a", "alice", "hi", None))
		.expect("Failed to serialize post view.");

	json["record"]["created_at"] = "2024-05-01T14:00:00+02:00".into();
	json.as_object_mut().expect("Post view must be an object.").remove("indexed_at");

	let parsed: PostView = serde_json::from_value(json).expect("Failed to parse post view.");

	assert_eq!(parsed.record.created_at, datetime!(2024-05-01 12:00 UTC));
	assert_eq!(parsed.indexed_at, None);
}
