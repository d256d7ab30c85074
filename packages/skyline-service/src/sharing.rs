//! Publishing timeline configurations under short keys.

use std::sync::Mutex;

use ahash::AHashMap;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BoxFuture, Error, Result, SkylineService, behaviour};
use skyline_domain::{SharedMeta, TimelineConfig};

#[derive(Clone, Debug, PartialEq)]
pub struct SharedTimelineRecord {
	pub key: String,
	pub config: TimelineConfig,
	pub created_by_handle: String,
	pub installs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ShareTimelineRequest {
	pub config_new: Value,
	pub created_by_handle: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareTimelineResponse {
	pub key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedTimelineResponse {
	pub config: TimelineConfig,
	pub created_by_handle: String,
	pub installs: u64,
}

pub trait SharedTimelineStore
where
	Self: Send + Sync,
{
	/// Stores `record` unless its key is taken. Returns whether it was stored.
	fn insert_if_absent<'a>(&'a self, record: SharedTimelineRecord)
	-> BoxFuture<'a, Result<bool>>;

	/// Looks up a record and counts one install against it.
	fn fetch_and_count_install<'a>(
		&'a self,
		key: &'a str,
	) -> BoxFuture<'a, Result<Option<SharedTimelineRecord>>>;
}

#[derive(Debug, Default)]
pub struct InMemorySharedTimelineStore {
	records: Mutex<AHashMap<String, SharedTimelineRecord>>,
}
impl InMemorySharedTimelineStore {
	pub fn new() -> Self {
		Self::default()
	}
}
impl SharedTimelineStore for InMemorySharedTimelineStore {
	fn insert_if_absent<'a>(
		&'a self,
		record: SharedTimelineRecord,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());

			if records.contains_key(&record.key) {
				return Ok(false);
			}

			records.insert(record.key.clone(), record);

			Ok(true)
		})
	}

	fn fetch_and_count_install<'a>(
		&'a self,
		key: &'a str,
	) -> BoxFuture<'a, Result<Option<SharedTimelineRecord>>> {
		Box::pin(async move {
			let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());
			let Some(record) = records.get_mut(key) else { return Ok(None) };

			record.installs += 1;

			Ok(Some(record.clone()))
		})
	}
}

impl SkylineService {
	/// Stores a timeline under a fresh key and stamps the key and sharer into `meta.shared`.
	pub async fn share_timeline(&self, req: ShareTimelineRequest) -> Result<ShareTimelineResponse> {
		let created_by_handle = req.created_by_handle.trim().to_string();

		if created_by_handle.is_empty() {
			return Err(Error::MalformedConfig {
				message: "created_by_handle must be non-empty.".to_string(),
			});
		}

		let config = behaviour::parse_timeline_config(req.config_new)?;

		for attempt in 1..=self.cfg.sharing.max_key_attempts {
			let key = generate_key(self.cfg.sharing.key_length);
			let mut config = config.clone();
			let shared = config.meta.shared.get_or_insert_with(SharedMeta::default);

			shared.key = Some(key.clone());
			shared.created_by_handle = Some(created_by_handle.clone());

			let record = SharedTimelineRecord {
				key: key.clone(),
				config,
				created_by_handle: created_by_handle.clone(),
				installs: 0,
			};

			if self.shared.insert_if_absent(record).await? {
				tracing::info!(key = %key, created_by = %created_by_handle, "Shared timeline.");

				return Ok(ShareTimelineResponse { key });
			}

			tracing::debug!(attempt, "Share key collision; retrying.");
		}

		Err(Error::Sharing {
			message: format!(
				"No free share key after {} attempts.",
				self.cfg.sharing.max_key_attempts
			),
		})
	}

	pub async fn get_shared_timeline(&self, key: &str) -> Result<SharedTimelineResponse> {
		let record = self
			.shared
			.fetch_and_count_install(key)
			.await?
			.ok_or_else(|| Error::NotFound {
				message: format!("No shared timeline for key {key}."),
			})?;

		Ok(SharedTimelineResponse {
			config: record.config,
			created_by_handle: record.created_by_handle,
			installs: record.installs,
		})
	}
}

/// A random lowercase alphanumeric key.
pub fn generate_key(len: usize) -> String {
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(len)
		.map(|byte| char::from(byte).to_ascii_lowercase())
		.collect()
}
