use judge_upload::load_config::{load_settings, load_settings_from_env, DEFAULT_API_BASE};
use judge_upload_core::config::StartupError;
use secrecy::ExposeSecret;
use serial_test::serial;
use std::collections::HashMap;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

/// Settings resolve from the environment alone, with defaults for everything optional.
#[test]
fn test_load_settings_env_only() {
    let settings = load_settings(
        None,
        lookup_from(&[
            ("HASH_CODE_JUDGE_AUTH_TOKEN", "token-123"),
            ("HASH_CODE_INPUT1_NAME", "a_example"),
            ("HASH_CODE_INPUT1_ID", "5629499534213120"),
        ]),
    )
    .expect("Settings should load");

    assert_eq!(settings.token.expose_secret(), "token-123");
    assert_eq!(settings.api_base, DEFAULT_API_BASE);
    assert_eq!(settings.builds_dir, PathBuf::from(".builds"));
    assert_eq!(settings.data_sets.id("a_example"), Some("5629499534213120"));
}

/// The credential is checked before anything else, even a broken config file.
#[test]
fn test_load_settings_requires_token_first() {
    let err = load_settings(
        Some(PathBuf::from("/does/not/exist.yaml").as_path()),
        lookup_from(&[("HASH_CODE_INPUT1_NAME", "a"), ("HASH_CODE_INPUT1_ID", "1")]),
    )
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<StartupError>(),
        Some(&StartupError::MissingCredential(
            "HASH_CODE_JUDGE_AUTH_TOKEN".to_string()
        ))
    );
}

#[test]
fn test_load_settings_errors_without_data_sets() {
    let err = load_settings(None, lookup_from(&[("HASH_CODE_JUDGE_AUTH_TOKEN", "t")])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<StartupError>(),
        Some(&StartupError::NoDataSets)
    );
}

/// File data sets and env pairs are merged; env wins on name clashes and for the API base.
#[test]
fn test_load_settings_merges_file_and_env() {
    let config_yaml = r#"
api_base: https://judge.example/api/v1/
builds_dir: ./dist
data_sets:
  - name: a_example
    id: "file-a"
  - name: b_small
    id: "file-b"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let settings = load_settings(
        Some(config_file.path()),
        lookup_from(&[
            ("HASH_CODE_JUDGE_AUTH_TOKEN", "t"),
            ("HASH_CODE_INPUT1_NAME", "b_small"),
            ("HASH_CODE_INPUT1_ID", "env-b"),
        ]),
    )
    .expect("Settings should load");

    assert_eq!(settings.api_base, "https://judge.example/api/v1");
    assert_eq!(settings.builds_dir, PathBuf::from("./dist"));
    assert_eq!(settings.data_sets.id("a_example"), Some("file-a"));
    assert_eq!(settings.data_sets.id("b_small"), Some("env-b"));

    let settings = load_settings(
        Some(config_file.path()),
        lookup_from(&[
            ("HASH_CODE_JUDGE_AUTH_TOKEN", "t"),
            ("HASH_CODE_JUDGE_API_BASE", "http://localhost:8080"),
        ]),
    )
    .unwrap();
    assert_eq!(settings.api_base, "http://localhost:8080");
}

#[test]
fn test_load_settings_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"data_sets: [:::").unwrap();

    let err = load_settings(
        Some(config_file.path()),
        lookup_from(&[("HASH_CODE_JUDGE_AUTH_TOKEN", "t")]),
    )
    .unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn test_load_settings_accepts_empty_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    let settings = load_settings(
        Some(config_file.path()),
        lookup_from(&[
            ("HASH_CODE_JUDGE_AUTH_TOKEN", "t"),
            ("HASH_CODE_INPUT4_NAME", "d"),
            ("HASH_CODE_INPUT4_ID", "4"),
        ]),
    )
    .expect("Empty config file is allowed");
    assert_eq!(settings.data_sets.len(), 1);
}

#[test]
#[serial]
fn test_load_settings_from_process_env() {
    env::set_var("HASH_CODE_JUDGE_AUTH_TOKEN", "from-env");
    env::set_var("HASH_CODE_INPUT1_NAME", "e_also_big");
    env::set_var("HASH_CODE_INPUT1_ID", "555");

    let settings = load_settings_from_env(None).expect("Settings should load");
    assert_eq!(settings.token.expose_secret(), "from-env");
    assert_eq!(settings.data_sets.id("e_also_big"), Some("555"));

    env::remove_var("HASH_CODE_JUDGE_AUTH_TOKEN");
    env::remove_var("HASH_CODE_INPUT1_NAME");
    env::remove_var("HASH_CODE_INPUT1_ID");
}
