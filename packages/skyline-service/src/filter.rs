use ahash::AHashSet;

use crate::ResolvedBehaviour;
use skyline_domain::{LanguageTag, Post, Replies, classify_language};

/// Applies the mutuals, replies, and language filters, in that order. Order is preserved.
///
/// `mutual_dids` must be present whenever the behaviour asks for mutuals only.
pub fn apply_filters(
	posts: Vec<Post>,
	behaviour: &ResolvedBehaviour,
	mutual_dids: Option<&AHashSet<String>>,
) -> Vec<Post> {
	let before = posts.len();
	let filtered: Vec<Post> = posts
		.into_iter()
		.filter(|post| match (behaviour.mutuals_only, mutual_dids) {
			(true, Some(dids)) => dids.contains(post.author_did()),
			(true, None) => false,
			(false, _) => true,
		})
		.filter(|post| behaviour.replies == Replies::All || !post.view.is_reply())
		.filter(|post| behaviour.language.as_ref().is_none_or(|tag| matches_language(post, tag)))
		.collect();

	tracing::debug!(before, after = filtered.len(), "Filtered posts.");

	filtered
}

fn matches_language(post: &Post, tag: &LanguageTag) -> bool {
	&classify_language(&post.view.record.text) == tag
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use skyline_domain::{
		Author, BaseFeed, Embed, PostRecord, PostView, ReplyRef, Sorting, StrongRef,
	};

	fn post(did: &str, text: &str, reply: bool) -> Post {
		let reply = reply.then(|| ReplyRef {
			root: StrongRef { uri: "at://root".to_string(), cid: None },
			parent: StrongRef { uri: "at://root".to_string(), cid: None },
		});

		Post::from(PostView {
			uri: format!("at://{did}/{text}"),
			cid: "cid".to_string(),
			author: Author {
				did: did.to_string(),
				handle: "h.test".to_string(),
				display_name: None,
			},
			record: PostRecord {
				text: text.to_string(),
				created_at: datetime!(2024-05-01 12:00 UTC),
				reply,
			},
			embed: Embed::None,
			indexed_at: None,
		})
	}

	const ENGLISH: &str =
		"The weather today is lovely and I am going to walk in the park with my dog.";
	const GERMAN: &str =
		"Das Wetter ist heute wunderschön und ich gehe mit meinem Hund im Park spazieren.";

	fn behaviour() -> ResolvedBehaviour {
		ResolvedBehaviour {
			base_feed: BaseFeed::Following,
			mutuals_only: false,
			language: None,
			replies: Replies::All,
			scoring: None,
			sorting: Sorting::Combo,
			minimum_score: 0.0,
		}
	}

	#[test]
	fn keeps_everything_without_filters() {
		let posts = vec![post("a", "one", false), post("b", "two", true)];

		assert_eq!(apply_filters(posts.clone(), &behaviour(), None), posts);
	}

	#[test]
	fn mutuals_only_keeps_mutual_authors_in_order() {
		let posts =
			vec![post("a", "one", false), post("b", "two", false), post("a", "three", false)];
		let mutuals: AHashSet<String> = ["a".to_string()].into_iter().collect();
		let behaviour = ResolvedBehaviour { mutuals_only: true, ..behaviour() };
		let kept = apply_filters(posts, &behaviour, Some(&mutuals));
		let texts: Vec<&str> = kept.iter().map(|post| post.view.record.text.as_str()).collect();

		assert_eq!(texts, vec!["one", "three"]);
	}

	#[test]
	fn replies_none_drops_replies() {
		let posts = vec![post("a", "one", true), post("b", "two", false)];
		let behaviour = ResolvedBehaviour { replies: Replies::None, ..behaviour() };
		let kept = apply_filters(posts, &behaviour, None);

		assert_eq!(kept.len(), 1);
		assert!(!kept[0].view.is_reply());
	}

	#[test]
	fn language_filter_uses_the_classifier() {
		let posts = vec![post("a", ENGLISH, false), post("b", GERMAN, false)];
		let behaviour =
			ResolvedBehaviour { language: Some(LanguageTag::new("eng")), ..behaviour() };
		let kept = apply_filters(posts, &behaviour, None);

		assert_eq!(kept.len(), 1);
		assert_eq!(kept[0].view.record.text, ENGLISH);
	}

	#[test]
	fn combined_filters_match_every_single_filter_order() {
		let posts = vec![
			post("mutual", ENGLISH, false),
			post("stranger", ENGLISH, false),
			post("mutual", GERMAN, false),
			post("mutual", ENGLISH, true),
			post("stranger", GERMAN, true),
			post("mutual", &format!("{ENGLISH} Again."), false),
		];
		let mutuals: AHashSet<String> = ["mutual".to_string()].into_iter().collect();
		let only_mutuals = ResolvedBehaviour { mutuals_only: true, ..behaviour() };
		let no_replies = ResolvedBehaviour { replies: Replies::None, ..behaviour() };
		let english_only =
			ResolvedBehaviour { language: Some(LanguageTag::new("eng")), ..behaviour() };
		let combined = ResolvedBehaviour {
			mutuals_only: true,
			replies: Replies::None,
			language: Some(LanguageTag::new("eng")),
			..behaviour()
		};
		let kept = apply_filters(posts.clone(), &combined, Some(&mutuals));

		assert_eq!(kept, vec![posts[0].clone(), posts[5].clone()]);

		let singles = [&only_mutuals, &no_replies, &english_only];
		let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

		for order in orders {
			let chained = order.iter().fold(posts.clone(), |acc, &index| {
				apply_filters(acc, singles[index], Some(&mutuals))
			});

			assert_eq!(chained, kept, "Filter order {order:?} changed the result.");
		}
	}
}
