//! Semantic scoring against positive and negative prompts.

use crate::{EmbeddingProvider, Error, Result, ScoringPrompts};
use skyline_config::EmbeddingProviderConfig;
use skyline_domain::{Post, ThreadCache, text};

/// Neutral prompt substituted for an empty prompt list.
pub const DEFAULT_PROMPT: &str = "says";

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Result<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return Err(Error::EmbeddingServiceFailed {
			message: format!(
				"Embedding dimensions are inconsistent: {} vs {}.",
				lhs.len(),
				rhs.len()
			),
		});
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return Err(Error::EmbeddingServiceFailed {
			message: "Embedding service returned a zero vector.".to_string(),
		});
	}

	Ok((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

/// Scores `posts` with one batched embedding call.
///
/// A post's score is its best positive similarity minus its best negative similarity. Any
/// provider failure or malformed response fails the whole batch.
pub async fn score_posts(
	provider: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	cache: &dyn ThreadCache,
	posts: Vec<Post>,
	prompts: &ScoringPrompts,
) -> Result<Vec<Post>> {
	if posts.is_empty() {
		return Ok(posts);
	}

	let texts: Vec<String> = posts
		.iter()
		.map(|post| text::serialize_post(cache, &post.view))
		.chain(prompts.positive.iter().cloned())
		.chain(prompts.negative.iter().cloned())
		.collect();
	let vectors = provider.embed(cfg, &texts).await?;

	if vectors.len() != texts.len() {
		return Err(Error::EmbeddingServiceFailed {
			message: format!(
				"Embedding service returned {} vectors for {} inputs.",
				vectors.len(),
				texts.len()
			),
		});
	}

	let (post_vectors, prompt_vectors) = vectors.split_at(posts.len());
	let (positive, negative) = prompt_vectors.split_at(prompts.positive.len());
	let mut scored = Vec::with_capacity(posts.len());

	for (mut post, vector) in posts.into_iter().zip(post_vectors) {
		let score = best_similarity(vector, positive)? - best_similarity(vector, negative)?;

		post.embedding = Some(vector.clone());
		post.score = Some(score);
		scored.push(post);
	}

	tracing::debug!(count = scored.len(), "Scored posts.");

	Ok(scored)
}

fn best_similarity(vector: &[f32], prompts: &[Vec<f32>]) -> Result<f32> {
	let mut best = f32::NEG_INFINITY;

	for prompt in prompts {
		best = best.max(cosine_similarity(vector, prompt)?);
	}

	if best.is_finite() {
		Ok(best)
	} else {
		Err(Error::EmbeddingServiceFailed { message: "No prompt vectors to compare.".to_string() })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cosine_similarity_of_parallel_and_orthogonal_vectors() {
		let parallel =
			cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]).expect("Failed to compute similarity.");
		let orthogonal =
			cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).expect("Failed to compute similarity.");

		assert!((parallel - 1.0).abs() < 1e-6);
		assert!(orthogonal.abs() < 1e-6);
	}

	#[test]
	fn cosine_similarity_rejects_bad_vectors() {
		assert!(cosine_similarity(&[], &[]).is_err());
		assert!(cosine_similarity(&[1.0, 0.0], &[1.0]).is_err());
		assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).is_err());
	}

	#[test]
	fn best_similarity_takes_the_maximum() {
		let prompts = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
		let best = best_similarity(&[1.0, 0.1], &prompts).expect("Failed to compute similarity.");

		assert!(best > 0.99);
	}
}
