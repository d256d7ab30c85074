use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;
use skyline_domain::Post;
use skyline_service::{
	ConversationMerger, Error as ServiceError, FeedContext, ProduceFeedOutput,
	ShareTimelineRequest, ShareTimelineResponse, SharedTimelineResponse, TimelineCatalog,
	parse_timeline_config,
};

#[derive(Debug, Deserialize)]
pub struct ProduceFeedRequest {
	pub config: Value,
	pub ego_handle: String,
	#[serde(default)]
	pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostProcessRequest {
	pub ego_handle: String,
	pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct SharedTimelineQuery {
	pub key: String,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/timelines/system", get(system_timelines))
		.route("/v1/feeds/produce", post(produce_feed))
		.route("/v1/feeds/post_process", post(post_process_feed))
		.route("/v1/shared_custom_timeline", get(get_shared_timeline).post(share_timeline))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn system_timelines() -> Json<TimelineCatalog> {
	Json(skyline_service::system_catalog())
}

async fn produce_feed(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<ProduceFeedRequest>,
) -> Result<Json<ProduceFeedOutput>, ApiError> {
	let config = parse_timeline_config(payload.config)?;
	let feed = state.service.feed_for(&config)?;
	let ctx = feed_context(&state, &headers, payload.ego_handle)?;
	let output = feed.produce_feed(&ctx, payload.cursor.as_deref()).await?;

	Ok(Json(output))
}

/// Runs conversation merging to completion and answers with its final emission.
async fn post_process_feed(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<PostProcessRequest>,
) -> Result<Json<Vec<Post>>, ApiError> {
	let ctx = feed_context(&state, &headers, payload.ego_handle)?;
	let mut rx = ConversationMerger::new(
		ctx.social,
		state.service.cache.clone(),
		state.service.cfg.feed.max_parent_fetch_depth,
	)
	.merge(payload.posts);
	let mut latest = Vec::new();

	while let Some(posts) = rx.recv().await {
		latest = posts;
	}

	Ok(Json(latest))
}

async fn share_timeline(
	State(state): State<AppState>,
	Json(payload): Json<ShareTimelineRequest>,
) -> Result<Json<ShareTimelineResponse>, ApiError> {
	let response = state.service.share_timeline(payload).await?;

	Ok(Json(response))
}

async fn get_shared_timeline(
	State(state): State<AppState>,
	Query(query): Query<SharedTimelineQuery>,
) -> Result<Json<SharedTimelineResponse>, ApiError> {
	let response = state.service.get_shared_timeline(&query.key).await?;

	Ok(Json(response))
}

fn feed_context(
	state: &AppState,
	headers: &HeaderMap,
	ego_handle: String,
) -> Result<FeedContext, ApiError> {
	let token = headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|token| !token.is_empty());
	let social = state.social.connect(token)?;

	Ok(FeedContext { social, ego_handle })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::BaseFeedUnavailable { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "BASE_FEED_UNAVAILABLE", message),
			ServiceError::EmbeddingServiceFailed { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "EMBEDDING_SERVICE_FAILED", message),
			ServiceError::MalformedConfig { .. } =>
				ApiError::new(StatusCode::BAD_REQUEST, "MALFORMED_CONFIG", message),
			ServiceError::SocialGraph { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "SOCIAL_GRAPH_ERROR", message),
			ServiceError::NotFound { .. } =>
				ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::Sharing { .. } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "SHARING_FAILED", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(
				error_code = %self.error_code,
				message = %self.message,
				"Request failed."
			);
		}

		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
