use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Embeds `texts` in one request. The service answers with one vector per input, in order.
pub async fn embed(
	cfg: &skyline_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "text": texts });
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.as_array().ok_or_else(|| Error::InvalidResponse {
		message: "Embedding response must be an array of vectors.".to_string(),
	})?;
	let mut vectors = Vec::with_capacity(data.len());

	for item in data {
		let embedding = item.as_array().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding item must be an array.".to_string(),
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		vectors.push(vec);
	}

	Ok(vectors)
}
