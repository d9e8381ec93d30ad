use taskdesk::config::DispatchConfig;
use taskdesk::dispatch::runner::{local_capability, run_local, Capability};
use taskdesk::errors::AppError;
use taskdesk::models::dispatch::{Agent, Target};

fn config(cli: &str, args: &[&str], timeout_ms: u64) -> DispatchConfig {
    DispatchConfig {
        agent_cli: cli.to_owned(),
        agent_cli_args: args.iter().map(|s| (*s).to_owned()).collect(),
        timeout_ms,
        ..DispatchConfig::default()
    }
}

#[test]
fn capability_table_routes_locally_only_for_claude() {
    assert_eq!(
        local_capability(Target::Hetzner, Agent::Claude),
        Capability::Supported
    );
    for agent in [Agent::Gemini, Agent::Qwen, Agent::Cline] {
        match local_capability(Target::Hetzner, agent) {
            Capability::Unsupported(msg) => assert!(msg.contains("mac:")),
            Capability::Supported => panic!("{agent:?} should not run here"),
        }
    }
    for target in [Target::Mac, Target::ColdStorage] {
        match local_capability(target, Agent::Claude) {
            Capability::Unsupported(msg) => assert!(msg.contains("remote")),
            Capability::Supported => panic!("{target:?} is not local"),
        }
    }
}

#[tokio::test]
async fn successful_run_returns_stdout() {
    let out = run_local(Agent::Claude, "hello world", None, &config("echo", &[], 5_000))
        .await
        .expect("run");
    assert_eq!(out.output, "hello world");
}

#[tokio::test]
async fn nonzero_exit_is_a_dispatch_error() {
    let err = run_local(Agent::Claude, "ignored", None, &config("false", &[], 5_000))
        .await
        .expect_err("must fail");
    match err {
        AppError::Dispatch(msg) => assert!(msg.contains("No output")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_agent_hits_the_timeout() {
    let err = run_local(Agent::Claude, "2", None, &config("sleep", &[], 100))
        .await
        .expect_err("must time out");
    assert!(matches!(err, AppError::Timeout(_)));
}

#[tokio::test]
async fn missing_repo_path_is_rejected() {
    let err = run_local(
        Agent::Claude,
        "hello",
        Some("/definitely/not/a/real/path"),
        &config("echo", &[], 5_000),
    )
    .await
    .expect_err("must fail");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn unsupported_agent_never_spawns() {
    let err = run_local(Agent::Gemini, "hello", None, &config("echo", &[], 5_000))
        .await
        .expect_err("must fail");
    match err {
        AppError::Dispatch(msg) => assert!(msg.contains("mac:gemini:")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn large_stderr_does_not_stall_the_run() {
    // Writes well past a pipe buffer on stderr before touching stdout;
    // the run must still finish inside the timeout.
    let script = "head -c 262144 /dev/zero | tr '\\0' 'x' >&2; echo done";
    let out = run_local(Agent::Claude, script, None, &config("sh", &["-c"], 5_000))
        .await
        .expect("run");
    assert_eq!(out.output, "done");
}

#[tokio::test]
async fn cli_args_are_prepended() {
    let out = run_local(
        Agent::Claude,
        "task text",
        None,
        &config("echo", &["-n", "prefix"], 5_000),
    )
    .await
    .expect("run");
    assert_eq!(out.output, "prefix task text");
}
