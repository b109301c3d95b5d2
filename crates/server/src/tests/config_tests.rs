use super::{
    apply_env_settings, apply_file_settings, normalize_database_url, prepare_database_url,
    Settings,
};

use std::collections::HashMap;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn blank_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

#[test]
fn keeps_in_memory_url_untouched() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn creates_parent_dir_for_sqlite_path() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[test]
fn file_settings_override_defaults() {
    let mut settings = Settings::default();
    apply_file_settings(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
connector = "partz"
max_request_bytes = "1024"
"#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.connector.connector, "partz");
    assert_eq!(settings.connector.service, "app");
    assert_eq!(settings.max_request_bytes, 1024);
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "sqlite://plain.db"),
        ("APP__DATABASE_URL", "sqlite://prefixed.db"),
        ("CONNECTOR_LOCATION", "europe-west1"),
        ("APP__MAX_REQUEST_BYTES", "not-a-number"),
    ]);
    let mut settings = Settings::default();
    apply_env_settings(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.database_url, "sqlite://prefixed.db");
    assert_eq!(settings.connector.location, "europe-west1");
    assert_eq!(settings.max_request_bytes, Settings::default().max_request_bytes);
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
