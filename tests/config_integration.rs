use campusly::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;

const ARGS: [&str; 1] = ["campusly"];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("CAMPUSLY_SERVER__PORT");
        env::remove_var("CAMPUSLY_SERVER__HOST");
        env::remove_var("CAMPUSLY_RESPONDER__ENDPOINT");
        env::remove_var("CAMPUSLY_RESPONDER__TIMEOUT_SECS");
        env::remove_var("CAMPUSLY_WIDGET__QUICK_PROMPTS");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("RESPONDER_ENDPOINT");
        env::remove_var("RESPONDER_TIMEOUT_SECS");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(ARGS).expect("Failed to load config");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.idle_timeout(), Duration::from_secs(1800));
    assert_eq!(config.responder.endpoint.as_str(), "http://localhost:5000/chat");
    assert_eq!(config.responder.timeout(), None);
    assert_eq!(config.widget.assistant_name, "Campusly");
    assert_eq!(config.widget.quick_prompts.len(), 4);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("CAMPUSLY_SERVER__PORT", "9090");
        env::set_var("CAMPUSLY_SERVER__HOST", "0.0.0.0");
        env::set_var("CAMPUSLY_RESPONDER__TIMEOUT_SECS", "20");
        env::set_var("CAMPUSLY_WIDGET__QUICK_PROMPTS", "Library hours,Bus timings");
    }

    let config = AppConfig::load_from_args(ARGS).expect("Failed to load config");
    clear_env_vars();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.responder.timeout(), Some(Duration::from_secs(20)));
    assert_eq!(config.widget.quick_prompts, vec!["Library hours", "Bus timings"]);
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("CAMPUSLY_SERVER__PORT", "9090");
        env::set_var("RESPONDER_ENDPOINT", "http://responder.internal:8000/chat");
    }

    let config = AppConfig::load_from_args(["campusly", "--port", "4040", "--host", "0.0.0.0"])
        .expect("Failed to load config");
    clear_env_vars();

    assert_eq!(config.server.port, 4040);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(
        config.responder.endpoint.as_str(),
        "http://responder.internal:8000/chat"
    );
}

#[test]
#[serial]
fn test_invalid_endpoint_rejected() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["campusly", "--endpoint", "not a url"]);

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = dir.path().join("campusly.yaml");
    let config_content = r#"
server:
  port: 7070
responder:
  endpoint: "http://127.0.0.1:5001/chat"
  timeout_secs: 5
widget:
  assistant_name: "Campusly"
  tagline: "Your campus, answered"
  welcome: "Welcome back!"
  resources:
    - label: "Library Desk"
      contact: "library@vit.ac.in"
"#;
    fs::write(&file_path, config_content).expect("Failed to write temp config");

    // Tell AppConfig to use this file via Env Var (mocking CLI arg indirectly)
    unsafe {
        env::set_var("CONFIG_FILE", &file_path);
    }

    let config = AppConfig::load_from_args(ARGS).expect("Failed to load config from file");
    clear_env_vars();

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.responder.endpoint.as_str(), "http://127.0.0.1:5001/chat");
    assert_eq!(config.responder.timeout(), Some(Duration::from_secs(5)));
    assert_eq!(config.widget.tagline, "Your campus, answered");
    assert_eq!(config.widget.welcome, "Welcome back!");
    assert_eq!(config.widget.resources.len(), 1);
    assert_eq!(config.widget.resources[0].label, "Library Desk");
    // Not set in the file, so the built-in prompts remain.
    assert_eq!(config.widget.quick_prompts.len(), 4);
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let original_dir = env::current_dir().expect("Failed to read cwd");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("config.yaml"), "server:\n  port: 6060\n")
        .expect("Failed to write ./config.yaml");

    env::set_current_dir(dir.path()).expect("Failed to enter temp dir");
    let result = AppConfig::load_from_args(ARGS);
    env::set_current_dir(original_dir).expect("Failed to restore cwd");

    let config = result.expect("Failed to load config");
    assert_eq!(config.server.port, 6060);
}
