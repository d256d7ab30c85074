use skyline_domain::BaseFeed;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Base feed {} is unavailable: {message}", kind.as_str())]
	BaseFeedUnavailable { kind: BaseFeed, message: String },
	#[error("Embedding service failed: {message}")]
	EmbeddingServiceFailed { message: String },
	#[error("Malformed config: {message}")]
	MalformedConfig { message: String },
	#[error("Social graph error: {message}")]
	SocialGraph { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Sharing error: {message}")]
	Sharing { message: String },
}
