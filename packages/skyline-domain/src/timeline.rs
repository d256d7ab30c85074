//! Shareable timeline configurations.
//!
//! The serialized form is camelCase JSON so a configuration can be stored and shared as one
//! self-contained value.

use serde::{Deserialize, Serialize};

use crate::language::LanguageTag;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
	pub meta: TimelineMeta,
	pub identity: Identity,
	pub behaviour: Behaviour,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
	System,
	#[serde(rename = "self")]
	SelfAuthored,
	Shared,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMeta {
	pub origin: Origin,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_on: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub modified_on: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shared: Option<SharedMeta>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedMeta {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by_handle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by_did: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub icon: String,
	pub name: String,
	pub description: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseFeed {
	#[default]
	Following,
	Popular,
	OneFromEach,
}
impl BaseFeed {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Following => "following",
			Self::Popular => "popular",
			Self::OneFromEach => "one-from-each",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Replies {
	#[default]
	All,
	None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sorting {
	Score,
	Time,
	#[default]
	Combo,
}

/// Behaviour as authored. Every field is optional; defaults are applied when the feed is built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Behaviour {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_feed: Option<BaseFeed>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mutuals_only: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub language: Option<LanguageTag>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub replies: Option<Replies>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub positive_prompts: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub negative_prompts: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sorting: Option<Sorting>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub minimum_score: Option<f32>,
}
