use std::path::PathBuf;

use taskdesk::config::GlobalConfig;
use taskdesk::AppError;

#[test]
fn load_from_path_round_trips_through_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("taskdesk.toml");
    std::fs::write(&path, "db_path = \"/var/lib/taskdesk/queue.db\"\n").expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("load config");
    assert_eq!(config.db_path, PathBuf::from("/var/lib/taskdesk/queue.db"));
}

#[test]
fn load_from_missing_path_is_a_config_error() {
    let err = GlobalConfig::load_from_path("/definitely/not/here.toml").expect_err("missing file");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn empty_toml_yields_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("empty config is valid");
    assert_eq!(config.db_path, PathBuf::from("taskdesk.db"));
    assert_eq!(config.dispatch.max_chain_depth, 5);
    assert_eq!(config.dispatch.timeout_ms, 300_000);
    assert_eq!(config.dispatch.agent_cli, "claude");
    assert!(config.dispatch.agent_cli_args.is_empty());
    assert!(config.slack.channel_id.is_empty());
    assert!(!config.slack_enabled());
}

#[test]
fn full_toml_parses() {
    let config = GlobalConfig::from_toml_str(
        r#"
db_path = "/var/lib/taskdesk/tasks.db"

[slack]
channel_id = "C12345"

[dispatch]
max_chain_depth = 3
timeout_ms = 60000
agent_cli = "claude"
agent_cli_args = ["-p"]

[goal]
goal = "Ship the beta"
goal_metric = "weekly releases"
"#,
    )
    .expect("valid config");

    assert_eq!(config.db_path, PathBuf::from("/var/lib/taskdesk/tasks.db"));
    assert_eq!(config.slack.channel_id, "C12345");
    assert_eq!(config.dispatch.max_chain_depth, 3);
    assert_eq!(config.dispatch.timeout_ms, 60_000);
    assert_eq!(config.dispatch.agent_cli_args, vec!["-p".to_owned()]);
    assert_eq!(config.goal.goal, "Ship the beta");
    assert_eq!(config.goal.goal_metric, "weekly releases");
}

#[test]
fn tokens_never_come_from_toml() {
    let config = GlobalConfig::from_toml_str(
        r#"
[slack]
channel_id = "C12345"
app_token = "xapp-leaked"
bot_token = "xoxb-leaked"
"#,
    );
    // serde(skip) fields reject unknown... no: unknown keys are accepted
    // by default, but must not populate the token fields.
    if let Ok(config) = config {
        assert!(config.slack.app_token.is_empty());
        assert!(config.slack.bot_token.is_empty());
    }
}

#[test]
fn zero_chain_depth_rejected() {
    let err = GlobalConfig::from_toml_str("[dispatch]\nmax_chain_depth = 0\n")
        .expect_err("zero depth invalid");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn zero_timeout_rejected() {
    let err = GlobalConfig::from_toml_str("[dispatch]\ntimeout_ms = 0\n")
        .expect_err("zero timeout invalid");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn empty_agent_cli_rejected() {
    let err = GlobalConfig::from_toml_str("[dispatch]\nagent_cli = \"\"\n")
        .expect_err("empty cli invalid");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn malformed_toml_rejected() {
    let err = GlobalConfig::from_toml_str("db_path = [not toml").expect_err("parse error");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn slack_enabled_requires_token_and_channel() {
    let mut config = GlobalConfig::from_toml_str("[slack]\nchannel_id = \"C1\"\n")
        .expect("valid config");
    assert!(!config.slack_enabled());

    config.slack.bot_token = "xoxb-test".into();
    assert!(config.slack_enabled());

    config.slack.channel_id.clear();
    assert!(!config.slack_enabled());
}
