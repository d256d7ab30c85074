use std::collections::BTreeMap;

use crate::SkylineService;
use skyline_domain::{BaseFeed, Behaviour, Identity, Origin, Sorting, TimelineConfig, TimelineMeta};

/// Timeline configurations by identifier.
pub type TimelineCatalog = BTreeMap<String, TimelineConfig>;

pub const FOLLOWING: &str = "following";
pub const POPULAR: &str = "popular";
pub const ONE_FROM_EACH: &str = "one-from-each";

/// The built-in timelines every user starts with.
pub fn system_catalog() -> TimelineCatalog {
	[
		(
			FOLLOWING,
			system_config(
				"people",
				"Following",
				"Posts from people you follow.",
				Behaviour::default(),
			),
		),
		(
			POPULAR,
			system_config(
				"trending_up",
				"Popular",
				"What is popular right now.",
				Behaviour {
					base_feed: Some(BaseFeed::Popular),
					sorting: Some(Sorting::Time),
					..Behaviour::default()
				},
			),
		),
		(
			ONE_FROM_EACH,
			system_config(
				"casino",
				"One from each",
				"One post from each account you follow.",
				Behaviour {
					base_feed: Some(BaseFeed::OneFromEach),
					sorting: Some(Sorting::Time),
					..Behaviour::default()
				},
			),
		),
	]
	.into_iter()
	.map(|(id, config)| (id.to_string(), config))
	.collect()
}

impl SkylineService {
	pub fn system_timeline(&self, id: &str) -> Option<TimelineConfig> {
		system_catalog().remove(id)
	}
}

fn system_config(
	icon: &str,
	name: &str,
	description: &str,
	behaviour: Behaviour,
) -> TimelineConfig {
	TimelineConfig {
		meta: TimelineMeta {
			origin: Origin::System,
			created_on: None,
			modified_on: None,
			shared: None,
		},
		identity: Identity {
			icon: icon.to_string(),
			name: name.to_string(),
			description: description.to_string(),
		},
		behaviour,
	}
}
