use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use relay_config::{Error, StorageBackend};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render template config.")
}

fn table<'a>(value: &'a mut Value, key: &str) -> &'a mut toml::Table {
	value
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(key)
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Template config must include [{key}]."))
}

fn write_temp_config(contents: &str) -> PathBuf {
	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock before epoch.").as_nanos();
	let n = COUNTER.fetch_add(1, Ordering::SeqCst);
	let path = env::temp_dir().join(format!("relay_config_{nanos}_{n}.toml"));

	fs::write(&path, contents).expect("Failed to write temp config.");

	path
}

fn validation_message(err: Error) -> String {
	match err {
		Error::Validation { message } => message,
		other => panic!("Expected validation error, got {other:?}."),
	}
}

#[test]
fn sample_config_loads_from_disk() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML);
	let cfg = relay_config::load(&path).expect("Sample config should load.");

	fs::remove_file(&path).ok();

	assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
	assert_eq!(cfg.exa.search_count, 5);
	assert_eq!(cfg.webhook.secret.as_deref(), Some("whsec_test"));
	assert!(cfg.webhook.tolerance_seconds.is_none());
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("relay_config_does_not_exist.toml");
	let err = relay_config::load(&path).expect_err("Missing file must fail.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn parse_error_carries_path() {
	let path = write_temp_config("[service\nhttp_bind = 1");
	let err = relay_config::load(&path).expect_err("Broken TOML must fail.");

	fs::remove_file(&path).ok();

	match err {
		Error::ParseConfig { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("Expected parse error, got {other:?}."),
	}
}

#[test]
fn postgres_backend_requires_blob_storage() {
	let mut value = sample_value();

	table(&mut value, "storage").remove("blob");

	let err = relay_config::parse(&render(&value)).expect_err("Missing blob must fail.");

	assert_eq!(
		validation_message(err),
		"storage.blob is required when storage.backend is postgres."
	);
}

#[test]
fn memory_backend_needs_no_storage_sections() {
	let mut value = sample_value();
	let storage = table(&mut value, "storage");

	storage.insert("backend".to_string(), Value::String("memory".to_string()));
	storage.remove("postgres");
	storage.remove("blob");

	let cfg = relay_config::parse(&render(&value)).expect("Memory backend should validate.");

	assert_eq!(cfg.storage.backend, StorageBackend::Memory);
}

#[test]
fn require_signature_needs_secret() {
	let mut value = sample_value();

	table(&mut value, "webhook").remove("secret");

	let err = relay_config::parse(&render(&value)).expect_err("Missing secret must fail.");

	assert_eq!(
		validation_message(err),
		"webhook.secret is required when webhook.require_signature is true."
	);
}

#[test]
fn blank_secret_counts_as_missing() {
	let mut value = sample_value();
	let webhook = table(&mut value, "webhook");

	webhook.insert("secret".to_string(), Value::String("  ".to_string()));
	webhook.insert("require_signature".to_string(), Value::Boolean(false));

	let cfg = relay_config::parse(&render(&value)).expect("Opt-out config should validate.");

	assert!(cfg.webhook.secret.is_none());
	assert!(!cfg.webhook.require_signature);
}

#[test]
fn omitted_webhook_section_requires_signature() {
	let mut value = sample_value();

	value.as_table_mut().expect("Template config must be a table.").remove("webhook");

	let err = relay_config::parse(&render(&value)).expect_err("Default must require a secret.");

	assert!(validation_message(err).starts_with("webhook.secret is required"));
}

#[test]
fn zero_exa_limits_are_rejected() {
	for key in ["search_count", "list_limit", "poll_interval_ms", "idle_timeout_ms", "timeout_ms"] {
		let mut value = sample_value();

		table(&mut value, "exa").insert(key.to_string(), Value::Integer(0));

		let err = relay_config::parse(&render(&value)).expect_err("Zero limit must fail.");

		assert_eq!(validation_message(err), format!("exa.{key} must be greater than zero."));
	}
}

#[test]
fn poll_interval_cannot_exceed_idle_timeout() {
	let mut value = sample_value();
	let exa = table(&mut value, "exa");

	exa.insert("poll_interval_ms".to_string(), Value::Integer(5_000));
	exa.insert("idle_timeout_ms".to_string(), Value::Integer(1_000));

	let err = relay_config::parse(&render(&value)).expect_err("Interval above timeout must fail.");

	assert_eq!(
		validation_message(err),
		"exa.poll_interval_ms must not exceed exa.idle_timeout_ms."
	);
}

#[test]
fn non_string_default_headers_are_rejected() {
	let mut value = sample_value();
	let exa = table(&mut value, "exa");
	let mut headers = toml::Table::new();

	headers.insert("x-trace".to_string(), Value::Integer(1));
	exa.insert("default_headers".to_string(), Value::Table(headers));

	let err = relay_config::parse(&render(&value)).expect_err("Numeric header must fail.");

	assert_eq!(validation_message(err), "exa.default_headers values must be strings.");
}

#[test]
fn blank_blob_endpoint_normalizes_to_none() {
	let mut value = sample_value();
	let storage = table(&mut value, "storage");
	let blob = storage
		.get_mut("blob")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [storage.blob].");

	blob.insert("endpoint".to_string(), Value::String(" ".to_string()));

	let cfg = relay_config::parse(&render(&value)).expect("Config should validate.");

	assert!(cfg.storage.blob.expect("Blob config must be present.").endpoint.is_none());
}
