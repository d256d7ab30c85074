//! Final ordering of a produced feed.
//!
//! `combo` blends recency and relevance: a positively scored post ranks by
//! `age_ms / score^COMBO_SCORE_EXPONENT`, smallest first, so a strong match stays near the top
//! for longer than a weak one. Posts with a non-positive score have no meaningful quotient and
//! are placed after all positive ones, by score and then recency.

use std::cmp::Ordering;

use time::OffsetDateTime;

use skyline_domain::{Post, Sorting};

pub const COMBO_SCORE_EXPONENT: i32 = 5;

/// Sorts in place. All orderings are stable.
///
/// `score` and `combo` need scores; without them the source order is kept.
pub fn sort_posts(posts: &mut [Post], sorting: Sorting, scored: bool, now: OffsetDateTime) {
	match sorting {
		Sorting::Time => posts.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
		Sorting::Score if scored => posts.sort_by(|a, b| score_of(b).total_cmp(&score_of(a))),
		Sorting::Combo if scored => posts.sort_by(|a, b| combo_cmp(a, b, now)),
		Sorting::Score | Sorting::Combo => {},
	}
}

fn score_of(post: &Post) -> f32 {
	post.score.unwrap_or(f32::NEG_INFINITY)
}

fn combo_cmp(a: &Post, b: &Post, now: OffsetDateTime) -> Ordering {
	match (combo_quotient(a, now), combo_quotient(b, now)) {
		(Some(lhs), Some(rhs)) => lhs.total_cmp(&rhs),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => score_of(b)
			.total_cmp(&score_of(a))
			.then_with(|| b.created_at().cmp(&a.created_at())),
	}
}

fn combo_quotient(post: &Post, now: OffsetDateTime) -> Option<f64> {
	let score = f64::from(post.score?);

	if score.is_nan() || score <= 0.0 {
		return None;
	}

	let age_ms = ((now - post.created_at()).whole_milliseconds() as f64).max(0.0);

	Some(age_ms / score.powi(COMBO_SCORE_EXPONENT).max(f64::MIN_POSITIVE))
}
