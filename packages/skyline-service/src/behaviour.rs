//! Resolution of a stored timeline behaviour into the settings a feed runs with.

use serde_json::Value;

use crate::{Error, Result, scoring::DEFAULT_PROMPT};
use skyline_domain::{BaseFeed, Behaviour, Identity, LanguageTag, Replies, Sorting, TimelineConfig};

#[derive(Clone, Debug, PartialEq)]
pub struct ScoringPrompts {
	pub positive: Vec<String>,
	pub negative: Vec<String>,
}

/// A behaviour with every optional field settled.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedBehaviour {
	pub base_feed: BaseFeed,
	pub mutuals_only: bool,
	pub language: Option<LanguageTag>,
	pub replies: Replies,
	/// `None` when neither prompt list carries a usable prompt.
	pub scoring: Option<ScoringPrompts>,
	pub sorting: Sorting,
	pub minimum_score: f32,
}
impl ResolvedBehaviour {
	pub fn resolve(identity: &Identity, behaviour: &Behaviour) -> Result<Self> {
		if identity.name.trim().is_empty() {
			return Err(Error::MalformedConfig {
				message: "identity.name must be non-empty.".to_string(),
			});
		}

		let minimum_score = behaviour.minimum_score.unwrap_or(0.0);

		if !minimum_score.is_finite() {
			return Err(Error::MalformedConfig {
				message: "behaviour.minimumScore must be a finite number.".to_string(),
			});
		}

		let positive = clean_prompts(behaviour.positive_prompts.as_deref());
		let negative = clean_prompts(behaviour.negative_prompts.as_deref());
		let scoring = if positive.is_empty() && negative.is_empty() {
			None
		} else {
			Some(ScoringPrompts {
				positive: default_if_empty(positive),
				negative: default_if_empty(negative),
			})
		};

		Ok(Self {
			base_feed: behaviour.base_feed.unwrap_or_default(),
			mutuals_only: behaviour.mutuals_only.unwrap_or(false),
			language: behaviour.language.clone(),
			replies: behaviour.replies.unwrap_or_default(),
			scoring,
			sorting: behaviour.sorting.unwrap_or_default(),
			minimum_score,
		})
	}
}

/// Decodes a timeline config from untyped JSON.
pub fn parse_timeline_config(value: Value) -> Result<TimelineConfig> {
	serde_json::from_value(value).map_err(|err| Error::MalformedConfig { message: err.to_string() })
}

fn clean_prompts(prompts: Option<&[String]>) -> Vec<String> {
	prompts
		.unwrap_or_default()
		.iter()
		.map(|prompt| prompt.trim())
		.filter(|prompt| !prompt.is_empty())
		.map(str::to_string)
		.collect()
}

fn default_if_empty(prompts: Vec<String>) -> Vec<String> {
	if prompts.is_empty() { vec![DEFAULT_PROMPT.to_string()] } else { prompts }
}
