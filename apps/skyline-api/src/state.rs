use std::sync::Arc;

use skyline_domain::InMemoryThreadCache;
use skyline_service::{SkylineService, SocialGraphConnector, XrpcConnector};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SkylineService>,
	pub social: Arc<dyn SocialGraphConnector>,
}
impl AppState {
	/// One process-wide thread cache, shared by every social-graph client and the pipeline.
	pub fn new(config: skyline_config::Config) -> Self {
		let cache = Arc::new(InMemoryThreadCache::new());
		let social = XrpcConnector::new(config.providers.social_graph.clone(), cache.clone());
		let service = SkylineService::new(config, cache);

		Self { service: Arc::new(service), social: Arc::new(social) }
	}

	pub fn from_parts(service: SkylineService, social: Arc<dyn SocialGraphConnector>) -> Self {
		Self { service: Arc::new(service), social }
	}
}
