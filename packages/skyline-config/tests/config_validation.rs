use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn sample_toml_without(section: &str) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove(section);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("skyline_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> skyline_config::Result<skyline_config::Config> {
	let path = write_temp_config(payload);
	let result = skyline_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn assert_validation_error(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_is_valid_and_normalized() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Sample config should be valid.");

	assert_eq!(cfg.providers.embedding.api_base, "http://127.0.0.1:9000");
	assert!(cfg.providers.embedding.api_key.is_none());
	assert_eq!(cfg.feed.base_page_size, 100);
	assert_eq!(cfg.sharing.key_length, 5);
}

#[test]
fn feed_and_sharing_sections_default_when_missing() {
	let payload = sample_toml_without("feed");
	let mut root: Value = toml::from_str(&payload).expect("Failed to parse config.");

	root.as_table_mut().expect("Config must be a table.").remove("sharing");

	let cfg = load_payload(toml::to_string(&root).expect("Failed to render config."))
		.expect("Config without optional sections should be valid.");

	assert_eq!(cfg.feed.author_feed_limit, 15);
	assert_eq!(cfg.feed.max_concurrent_fetches, 16);
	assert_eq!(cfg.sharing.max_key_attempts, 8);
}

#[test]
fn base_page_size_must_not_exceed_page_bound() {
	assert_validation_error(
		sample_toml_with("feed", "base_page_size", Value::Integer(101)),
		"feed.base_page_size must be in the range 1-100.",
	);
}

#[test]
fn concurrency_cap_must_be_positive() {
	assert_validation_error(
		sample_toml_with("feed", "max_concurrent_fetches", Value::Integer(0)),
		"feed.max_concurrent_fetches must be greater than zero.",
	);
}

#[test]
fn share_key_length_must_be_reasonable() {
	assert_validation_error(
		sample_toml_with("sharing", "key_length", Value::Integer(2)),
		"sharing.key_length must be in the range 4-16.",
	);
}

#[test]
fn embedding_path_must_be_absolute() {
	assert_validation_error(
		sample_toml_with("providers.embedding", "path", Value::String("embed".to_string())),
		"providers.embedding.path must start with '/'.",
	);
}

#[test]
fn social_graph_url_must_be_http() {
	assert_validation_error(
		sample_toml_with(
			"providers.social_graph",
			"service_url",
			Value::String("bsky.social".to_string()),
		),
		"providers.social_graph.service_url must be an http or https URL.",
	);
}

#[test]
fn default_header_values_must_be_strings() {
	let mut headers = toml::Table::new();

	headers.insert("x-retries".to_string(), Value::Integer(3));

	assert_validation_error(
		sample_toml_with("providers.embedding", "default_headers", Value::Table(headers)),
		"providers.embedding.default_headers values must be strings.",
	);
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("skyline_config_test_missing.toml");
	let err = skyline_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, skyline_config::Error::ReadConfig { .. }));
}
