use jarvis_relay::config::{AppConfig, LogFormat};
use jarvis_relay::llm::orchestrator::{DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT};
use serial_test::serial;
use std::env;
use std::fs;

const VARS: &[&str] = &[
    "CONFIG_FILE",
    "PORT",
    "MAX_HISTORY",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
    "SYSTEM_PROMPT",
    "AZURE_DEPLOYMENT_NAME",
    "AZURE_API_VERSION",
    "JARVIS_SERVER__PORT",
    "JARVIS_LLM__MODEL",
    "JARVIS_SESSION__MAX_HISTORY",
];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    for var in VARS {
        // SAFETY: tests touching the environment are serialized with #[serial].
        unsafe {
            env::remove_var(var);
        }
    }
}

fn set_var(key: &str, value: &str) {
    // SAFETY: tests touching the environment are serialized with #[serial].
    unsafe {
        env::set_var(key, value);
    }
}

fn load(args: &[&str]) -> AppConfig {
    let mut argv = vec!["jarvis-relay"];
    argv.extend_from_slice(args);
    AppConfig::load_from_args(argv).expect("Failed to load config")
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load(&[]);
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.session.max_history, 20);
    assert_eq!(config.llm.model, DEFAULT_MODEL);
    assert_eq!(config.llm.system_prompt, DEFAULT_SYSTEM_PROMPT);
    assert!((config.llm.temperature - 0.5).abs() < f32::EPSILON);
    assert_eq!(config.log.format, LogFormat::Pretty);
    assert!(config.llm_settings().is_none());
}

#[test]
#[serial]
fn test_prefixed_env_override() {
    clear_env_vars();
    set_var("JARVIS_SERVER__PORT", "9090");
    set_var("JARVIS_SESSION__MAX_HISTORY", "12");

    let config = load(&[]);
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.session.max_history, 12);

    clear_env_vars();
}

#[test]
#[serial]
fn test_direct_env_names() {
    clear_env_vars();
    set_var("OPENAI_API_KEY", "sk-test");
    set_var("OPENAI_MODEL", "gpt-4o");
    set_var("SYSTEM_PROMPT", "You are terse.");
    set_var("MAX_HISTORY", "18");
    set_var("PORT", "10000");

    let config = load(&[]);
    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.llm.system_prompt, "You are terse.");
    assert_eq!(config.session.max_history, 18);
    assert_eq!(config.server.port, 10000);
    assert!(config.llm_settings().is_some());

    clear_env_vars();
}

#[test]
#[serial]
fn test_direct_env_beats_prefixed() {
    clear_env_vars();
    set_var("JARVIS_LLM__MODEL", "from-prefixed");
    set_var("OPENAI_MODEL", "from-direct");

    let config = load(&[]);
    assert_eq!(config.llm.model, "from-direct");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_win() {
    clear_env_vars();
    set_var("PORT", "10000");

    let config = load(&["--port", "7000", "--model", "gpt-4.1-mini", "--log-format", "json"]);
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.llm.model, "gpt-4.1-mini");
    assert_eq!(config.log.format, LogFormat::Json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("jarvis.yaml");
    fs::write(
        &path,
        r"
server:
  port: 7070
session:
  max_history: 10
llm:
  temperature: 0.6
",
    )
    .expect("Failed to write temp config");

    set_var("CONFIG_FILE", path.to_str().unwrap());

    let config = load(&[]);
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.session.max_history, 10);
    assert!((config.llm.temperature - 0.6).abs() < 1e-6);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_config_file_is_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["jarvis-relay", "--config", "/nonexistent/jarvis.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    clear_env_vars();

    set_var("MAX_HISTORY", "1");
    assert!(AppConfig::load_from_args(["jarvis-relay"]).is_err());

    set_var("MAX_HISTORY", "lots");
    assert!(AppConfig::load_from_args(["jarvis-relay"]).is_err());

    clear_env_vars();
    set_var("OPENAI_BASE_URL", "not a url");
    assert!(AppConfig::load_from_args(["jarvis-relay"]).is_err());

    clear_env_vars();
}
