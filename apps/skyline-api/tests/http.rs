use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use skyline_api::{routes, state::AppState};
use skyline_domain::InMemoryThreadCache;
use skyline_testkit::{
	FakeConnector, FakeEmbedder, FakeSocialGraph, feed_item, post_view, reply_view, test_config,
	test_service,
};

struct TestApp {
	router: Router,
	connector: Arc<FakeConnector>,
}

fn test_app<F>(script: F) -> TestApp
where
	F: FnOnce(FakeSocialGraph) -> FakeSocialGraph,
{
	let cache = Arc::new(InMemoryThreadCache::new());
	let graph = Arc::new(script(FakeSocialGraph::new(cache.clone())));
	let connector = Arc::new(FakeConnector::new(graph));
	let embedder = Arc::new(FakeEmbedder::new(vec![0.0, 1.0]).with_rule("cats", vec![1.0, 0.0]));
	let service = test_service(test_config(), embedder, cache);
	let router = routes::router(AppState::from_parts(service, connector.clone()));

	TestApp { router, connector }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = router.clone().oneshot(request).await.expect("Failed to call the router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.expect("Failed to build request.")
}

fn timeline_config(behaviour: Value) -> Value {
	json!({
		"meta": { "origin": "self" },
		"identity": { "icon": "pets", "name": "Cats", "description": "" },
		"behaviour": behaviour
	})
}

#[tokio::test]
async fn health_ok() {
	let app = test_app(|graph| graph);
	let request = Request::builder()
		.uri("/health")
		.body(Body::empty())
		.expect("Failed to build request.");
	let (status, _) = send(&app.router, request).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lists_system_timelines() {
	let app = test_app(|graph| graph);
	let request = Request::builder()
		.uri("/v1/timelines/system")
		.body(Body::empty())
		.expect("Failed to build request.");
	let (status, json) = send(&app.router, request).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["popular"]["behaviour"]["baseFeed"], "popular");
	assert_eq!(json["one-from-each"]["meta"]["origin"], "system");
}

#[tokio::test]
async fn produce_scores_and_forwards_the_bearer_token() {
	let app = test_app(|graph| {
		graph.with_timeline(
			vec![
				feed_item(post_view("1", "alice", "I love cats", 5)),
				feed_item(post_view("2", "bob", "stock prices", 1)),
			],
			Some("c2"),
		)
	});
	let mut request = post_json(
		"/v1/feeds/produce",
		json!({
			"config": timeline_config(json!({ "positivePrompts": ["cats"], "minimumScore": 0.5 })),
			"ego_handle": "ego.test"
		}),
	);

	request.headers_mut().insert(
		"authorization",
		"Bearer secret-token".parse().expect("Failed to build header value."),
	);

	let (status, json) = send(&app.router, request).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["posts"].as_array().map(Vec::len), Some(1));
	assert_eq!(json["posts"][0]["view"]["record"]["text"], "I love cats");
	assert_eq!(json["cursor"], "c2");
	assert_eq!(app.connector.tokens(), vec![Some("secret-token".to_string())]);
}

#[tokio::test]
async fn malformed_config_is_a_bad_request() {
	let app = test_app(|graph| graph);
	let request = post_json(
		"/v1/feeds/produce",
		json!({
			"config": timeline_config(json!({ "minimumScore": "high" })),
			"ego_handle": "ego.test"
		}),
	);
	let (status, json) = send(&app.router, request).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "MALFORMED_CONFIG");
	assert!(app.connector.tokens().is_empty());
}

#[tokio::test]
async fn base_feed_failure_is_a_bad_gateway() {
	let app = test_app(|graph| graph.failing_base_feeds());
	let request = post_json(
		"/v1/feeds/produce",
		json!({ "config": timeline_config(json!({})), "ego_handle": "ego.test" }),
	);
	let (status, json) = send(&app.router, request).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "BASE_FEED_UNAVAILABLE");
}

#[tokio::test]
async fn post_process_returns_the_final_merge() {
	let parent = post_view("parent", "alice", "question", 10);
	let leaf = reply_view("leaf", "bob", "answer", 1, &parent);
	let remote = parent.clone();
	let app = test_app(move |graph| graph.with_remote_posts(vec![remote]));
	let request = post_json(
		"/v1/feeds/post_process",
		json!({
			"ego_handle": "ego.test",
			"posts": [{ "view": serde_json::to_value(&leaf).expect("Failed to encode post.") }]
		}),
	);
	let (status, json) = send(&app.router, request).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json[0]["view"]["uri"], leaf.uri.as_str());
	assert_eq!(json[0]["replying_to"][0]["uri"], parent.uri.as_str());
}

#[tokio::test]
async fn shared_timeline_round_trip_counts_installs() {
	let app = test_app(|graph| graph);
	let config = timeline_config(json!({ "positivePrompts": ["cats"] }));
	let (status, json) = send(
		&app.router,
		post_json(
			"/v1/shared_custom_timeline",
			json!({ "config_new": config.clone(), "created_by_handle": "alice.test" }),
		),
	)
	.await;

	assert_eq!(status, StatusCode::OK);

	let key = json["key"].as_str().expect("Missing share key.").to_string();
	let get = |key: &str| {
		Request::builder()
			.uri(format!("/v1/shared_custom_timeline?key={key}"))
			.body(Body::empty())
			.expect("Failed to build request.")
	};
	let (_, first) = send(&app.router, get(&key)).await;
	let (status, second) = send(&app.router, get(&key)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(first["installs"], 1);
	assert_eq!(second["installs"], 2);
	assert_eq!(second["created_by_handle"], "alice.test");
	assert_eq!(second["config"]["meta"]["shared"]["key"], key.as_str());
	assert_eq!(second["config"]["meta"]["shared"]["createdByHandle"], "alice.test");
	assert_eq!(second["config"]["behaviour"], config["behaviour"]);

	let (status, json) = send(&app.router, get("nope1")).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");
}
