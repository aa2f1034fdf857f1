//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error
//! handling: observable outcomes, not TOML parsing details.

use std::io::Write;
use streamhub_sdk::config::{ConfigError, SdkConfig};
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[auth]
username = "tester"
token = "secret"

[hub]
host = "hub.example.com"

[api]
base_url = "https://api.example.com"
"#
    )
    .unwrap();

    let config = SdkConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.auth.username, "tester");
    assert_eq!(config.auth.token, Some("secret".to_string()));
    assert_eq!(config.hub.host, "hub.example.com");
    assert_eq!(config.api.base_url, "https://api.example.com");
    assert_eq!(config.api.timeout_ms, 30_000);
}

#[test]
fn test_config_loads_with_optional_fields() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[auth]
username = "tester"
token_env = "STREAMHUB_TOKEN"

[hub]
host = "hub.example.com"
capath = "/etc/ssl/custom.pem"

[api]
base_url = "https://api.example.com"
timeout_ms = 10000
"#
    )
    .unwrap();

    let config = SdkConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.auth.token, None);
    assert_eq!(config.auth.token_env, Some("STREAMHUB_TOKEN".to_string()));
    assert_eq!(
        config.hub.capath,
        Some(std::path::PathBuf::from("/etc/ssl/custom.pem"))
    );
    assert_eq!(config.api.timeout_ms, 10_000);
}

#[test]
fn test_config_rejects_missing_sections() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[auth]
username = "tester"
token = "secret"
"#
    )
    .unwrap();

    let result = SdkConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_rejects_empty_username() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[auth]
username = ""
token = "secret"

[hub]
host = "hub.example.com"

[api]
base_url = "https://api.example.com"
"#
    )
    .unwrap();

    let result = SdkConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_config_missing_file_is_a_read_error() {
    let result = SdkConfig::load_from_file(std::path::Path::new("/definitely/missing/sdk.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}
