//! Tests for `EnvClient`: argv construction, option handling, and the
//! status / convergence polling loops.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use juju_env::application::services::EnvClient;
use juju_env::domain::{ClientSettings, EnvironmentDescriptor, JujuError};

use crate::helpers::{
    TOOL_PATH, all_started, ec2_env, err_output, local_env, status_doc, tool,
    unreachable_output,
};
use crate::mocks::{Event, FakeJuju, RecordingReporter};

const VERSION: &str = "1.18.1-trusty-amd64";

fn client<'a>(
    juju: &'a FakeJuju,
    reporter: &'a RecordingReporter,
    env: &EnvironmentDescriptor,
) -> EnvClient<'a, FakeJuju, RecordingReporter> {
    EnvClient::new(juju, reporter, env, tool(VERSION), ClientSettings::default())
}

fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(ToString::to_string).collect()
}

// ============================================================================
// Command construction
// ============================================================================

#[tokio::test]
async fn test_command_line_prefixes_path_with_tool_directory() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), ec2_env("foo"));
    let line = client(&juju, &reporter, &env)
        .command_line(&juju_env::domain::Invocation::new("status", &[]))
        .unwrap();
    let (key, path) = line.env.first().expect("PATH override");
    assert_eq!(key, "PATH");
    let first = std::env::split_paths(path).next().expect("non-empty PATH");
    assert_eq!(first, std::path::Path::new("/opt/juju/bin"));
}

#[tokio::test]
async fn test_get_juju_output_scopes_to_environment() {
    let juju = FakeJuju::new().status(&all_started("1.18.1"));
    let reporter = RecordingReporter::default();
    let env = ec2_env("foo");
    client(&juju, &reporter, &env)
        .get_juju_output("status", &[], None)
        .await
        .unwrap();
    assert_eq!(
        juju.argvs(),
        [argv(&[TOOL_PATH, "--show-log", "status", "-e", "foo"])]
    );
}

#[tokio::test]
async fn test_get_juju_output_with_timeout_wraps_in_timeout_command() {
    let juju = FakeJuju::new().status(&all_started("1.18.1"));
    let reporter = RecordingReporter::default();
    let env = ec2_env("foo");
    client(&juju, &reporter, &env)
        .get_juju_output("status", &[], Some(Duration::from_secs(90)))
        .await
        .unwrap();
    assert_eq!(
        juju.argvs()[0],
        argv(&["timeout", "90.00s", TOOL_PATH, "--show-log", "status", "-e", "foo"])
    );
}

#[tokio::test]
async fn test_debug_setting_passes_debug_flag() {
    let juju = FakeJuju::new().status(&all_started("1.18.1"));
    let reporter = RecordingReporter::default();
    let env = ec2_env("foo");
    let settings = ClientSettings::default().with_debug(true);
    EnvClient::new(&juju, &reporter, &env, tool(VERSION), settings)
        .get_juju_output("status", &[], None)
        .await
        .unwrap();
    assert_eq!(juju.argvs()[0][1], "--debug");
}

#[tokio::test]
async fn test_temporary_redirect_is_cannot_connect() {
    let juju = FakeJuju::new().status_output(err_output(1, b"ERROR 307: Temporary Redirect\n"));
    let reporter = RecordingReporter::default();
    let env = ec2_env("foo");
    let err = client(&juju, &reporter, &env)
        .get_juju_output("status", &[], None)
        .await
        .expect_err("redirect");
    assert!(matches!(err, JujuError::CannotConnect(_)), "got {err:?}");
    assert!(reporter.warnings().is_empty(), "connectivity is not echoed");
}

#[tokio::test]
async fn test_other_failure_is_command_failed_and_echoes_stderr() {
    let juju = FakeJuju::new().status_output(err_output(2, b"ERROR permission denied\n"));
    let reporter = RecordingReporter::default();
    let env = ec2_env("foo");
    let err = client(&juju, &reporter, &env)
        .get_juju_output("status", &[], None)
        .await
        .expect_err("failure");
    let JujuError::CommandFailed(failure) = err else {
        panic!("expected CommandFailed, got {err:?}");
    };
    assert_eq!(failure.code, Some(2));
    assert_eq!(reporter.warnings(), ["!!! ERROR permission denied"]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_bootstrap_local_runs_elevated() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), local_env("local"));
    client(&juju, &reporter, &env).bootstrap().await.unwrap();
    let expected = argv(&[
        "sudo",
        "-E",
        TOOL_PATH,
        "--show-log",
        "bootstrap",
        "-e",
        "local",
        "--constraints",
        "mem=2G",
    ]);
    assert_eq!(juju.argvs(), [expected.clone()]);
    assert_eq!(reporter.steps(), [expected.join(" ")]);
}

#[tokio::test]
async fn test_bootstrap_remote_runs_unelevated() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), ec2_env("foo"));
    client(&juju, &reporter, &env).bootstrap().await.unwrap();
    assert_eq!(
        juju.argvs(),
        [argv(&[TOOL_PATH, "--show-log", "bootstrap", "-e", "foo", "--constraints", "mem=2G"])]
    );
}

#[tokio::test]
async fn test_bootstrap_failure_is_error() {
    let juju = FakeJuju::new().exit_code("bootstrap", 1);
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .bootstrap()
        .await
        .expect_err("bootstrap fails");
    assert!(matches!(err, JujuError::CommandFailed(_)), "got {err:?}");
}

#[tokio::test]
async fn test_destroy_environment_names_env_without_e_and_tolerates_failure() {
    let juju = FakeJuju::new().exit_code("destroy-environment", 1);
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let status = client(&juju, &reporter, &env)
        .destroy_environment()
        .await
        .unwrap();
    assert!(!status.success());
    assert_eq!(
        juju.argvs(),
        [argv(&[TOOL_PATH, "--show-log", "destroy-environment", "foo", "--force", "-y"])]
    );
}

#[tokio::test]
async fn test_destroy_local_environment_runs_elevated() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), local_env("local"));
    client(&juju, &reporter, &env)
        .destroy_environment()
        .await
        .unwrap();
    assert_eq!(juju.argvs()[0][..2], argv(&["sudo", "-E"]));
}

// ============================================================================
// Options and upgrades
// ============================================================================

#[tokio::test]
async fn test_get_env_option_strips_trailing_newline() {
    let juju = FakeJuju::new().option("default-series", "trusty");
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let value = client(&juju, &reporter, &env)
        .get_env_option("default-series")
        .await
        .unwrap();
    assert_eq!(value, "trusty");
}

#[tokio::test]
async fn test_set_env_option_passes_name_equals_value() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), ec2_env("foo"));
    client(&juju, &reporter, &env)
        .set_env_option("default-series", "precise")
        .await
        .unwrap();
    assert_eq!(
        juju.argvs(),
        [argv(&[TOOL_PATH, "--show-log", "set-env", "-e", "foo", "default-series=precise"])]
    );
    assert_eq!(juju.option_value("default-series").as_deref(), Some("precise"));
}

#[tokio::test]
async fn test_matching_agent_version_for_local_build() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), local_env("local"));
    let env_client = client(&juju, &reporter, &env);
    assert_eq!(env_client.get_matching_agent_version(false), "1.18.1.1");
    assert_eq!(env_client.get_matching_agent_version(true), "1.18.1");
}

#[tokio::test]
async fn test_upgrade_juju_local_forced_uploads_tools() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), local_env("local"));
    client(&juju, &reporter, &env).upgrade_juju(true).await.unwrap();
    assert_eq!(
        juju.argvs(),
        [argv(&[
            TOOL_PATH,
            "--show-log",
            "upgrade-juju",
            "-e",
            "local",
            "--version",
            "1.18.1",
            "--upload-tools",
        ])]
    );
}

#[tokio::test]
async fn test_upgrade_juju_remote_unforced_has_no_extra_args() {
    let (juju, reporter, env) = (FakeJuju::new(), RecordingReporter::default(), ec2_env("foo"));
    client(&juju, &reporter, &env).upgrade_juju(false).await.unwrap();
    assert_eq!(
        juju.argvs(),
        [argv(&[TOOL_PATH, "--show-log", "upgrade-juju", "-e", "foo"])]
    );
}

// ============================================================================
// get_status
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_get_status_retries_until_success() {
    let juju = FakeJuju::new()
        .status_output(unreachable_output())
        .status_output(err_output(1, b"ERROR boom\n"))
        .status(&all_started("1.18.1"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let status = client(&juju, &reporter, &env)
        .get_status(Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(status.machines.len(), 1);
    assert_eq!(juju.count("status"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_get_status_times_out_with_last_error() {
    let juju = FakeJuju::new().status_output(err_output(1, b"ERROR something broke\n"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .get_status(Duration::from_secs(3))
        .await
        .expect_err("timeout");
    let JujuError::StatusTimeout { last_error } = &err else {
        panic!("expected StatusTimeout, got {err:?}");
    };
    assert!(matches!(last_error.as_deref(), Some(JujuError::CommandFailed(_))));
    assert!(err.to_string().contains("something broke"), "got: {err}");
    assert!(!err.is_transient());
    assert_eq!(juju.count("status"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_get_status_parse_error_is_not_retried() {
    let juju = FakeJuju::new().status("machines: [unclosed");
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .get_status(Duration::from_secs(60))
        .await
        .expect_err("parse");
    assert!(matches!(err, JujuError::StatusParse(_)), "got {err:?}");
    assert_eq!(juju.count("status"), 1);
}

// ============================================================================
// wait_for_started
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_started_converges_after_pending() {
    let juju = FakeJuju::new()
        .status(&status_doc(("started", "1.18.1"), ("pending", "1.18.1")))
        .status(&all_started("1.18.1"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let status = client(&juju, &reporter, &env)
        .wait_for_started(Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(status.agent_state_counts().len(), 1);
    assert_eq!(reporter.steps(), ["pending: wordpress/0"]);
    assert_eq!(
        reporter.events().last(),
        Some(&Event::Success("All agents started in foo".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_started_suppresses_unreachable_environment() {
    let juju = FakeJuju::new()
        .status_output(unreachable_output())
        .status_output(unreachable_output())
        .status(&all_started("1.18.1"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let settings = ClientSettings {
        status_timeout: Duration::from_secs(2),
        ..ClientSettings::default()
    };
    EnvClient::new(&juju, &reporter, &env, tool(VERSION), settings)
        .wait_for_started(Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(
        reporter.warnings(),
        ["Suppressing \"Unable to connect to environment\""]
    );
    assert_eq!(juju.count("status"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_started_fails_fast_on_errored_unit() {
    let juju = FakeJuju::new().status(&status_doc(("started", "1.18.1"), ("error", "1.18.1")));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .wait_for_started(Duration::from_secs(60))
        .await
        .expect_err("errored unit");
    let JujuError::ErroredUnit(unit) = err else {
        panic!("expected ErroredUnit, got {err:?}");
    };
    assert_eq!(unit.item, "wordpress/0");
    assert_eq!(unit.state, "error");
    assert_eq!(juju.count("status"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_started_fails_on_error_in_state_info() {
    let document = "\
machines:
  \"0\":
    agent-state: pending
    agent-state-info: '(error: cannot run instances)'
";
    let juju = FakeJuju::new().status(document);
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .wait_for_started(Duration::from_secs(60))
        .await
        .expect_err("errored machine");
    assert!(err.to_string().contains("0 is in state (error: cannot run instances)"), "got: {err}");
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_started_times_out_naming_environment() {
    let juju = FakeJuju::new().status(&status_doc(("started", "1.18.1"), ("pending", "1.18.1")));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .wait_for_started(Duration::from_secs(10))
        .await
        .expect_err("timeout");
    assert_eq!(
        err.to_string(),
        "Timed out waiting for agents to start in foo. Pending: pending: wordpress/0"
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_started_times_out_when_fetch_window_is_empty() {
    let juju = FakeJuju::new().status(&all_started("1.18.1"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let settings = ClientSettings {
        status_timeout: Duration::ZERO,
        ..ClientSettings::default()
    };
    let err = EnvClient::new(&juju, &reporter, &env, tool(VERSION), settings)
        .wait_for_started(Duration::from_secs(5))
        .await
        .expect_err("timeout");
    assert!(
        matches!(&err, JujuError::AgentsNotStarted { environment, .. } if environment == "foo"),
        "got {err:?}"
    );
    assert_eq!(juju.count("status"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_started_gives_up_on_persistent_command_failure() {
    let juju = FakeJuju::new().status_output(err_output(1, b"ERROR bad credentials\n"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let settings = ClientSettings {
        status_timeout: Duration::from_secs(2),
        ..ClientSettings::default()
    };
    let err = EnvClient::new(&juju, &reporter, &env, tool(VERSION), settings)
        .wait_for_started(Duration::from_secs(60))
        .await
        .expect_err("command failure");
    assert!(matches!(err, JujuError::StatusTimeout { .. }), "got {err:?}");
}

// ============================================================================
// wait_for_version
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_version_converges() {
    let juju = FakeJuju::new()
        .status(&status_doc(("started", "1.18.1"), ("started", "1.17.7")))
        .status(&all_started("1.18.1"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    client(&juju, &reporter, &env)
        .wait_for_version("1.18.1", Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(reporter.steps(), ["1.17.7: wordpress/0"]);
    assert_eq!(
        reporter.events().last(),
        Some(&Event::Success("All agents at 1.18.1 in foo".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_version_fails_fast_on_errored_unit() {
    let document = "\
machines:
  \"0\":
    agent-state: error
    agent-state-info: 'hook failed: error'
    agent-version: 1.17.7
";
    let juju = FakeJuju::new().status(document);
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .wait_for_version("1.18.1", Duration::from_secs(300))
        .await
        .expect_err("errored machine");
    let JujuError::ErroredUnit(unit) = err else {
        panic!("expected ErroredUnit, got {err:?}");
    };
    assert_eq!(unit.item, "0");
    assert_eq!(unit.state, "hook failed: error");
    assert_eq!(juju.count("status"), 1);
    assert!(reporter.steps().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_version_fails_on_error_state_without_info() {
    let juju = FakeJuju::new().status(&status_doc(("started", "1.18.1"), ("error", "1.17.7")));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .wait_for_version("1.18.1", Duration::from_secs(300))
        .await
        .expect_err("errored unit");
    assert!(err.to_string().contains("wordpress/0 is in state error"), "got: {err}");
    assert_eq!(juju.count("status"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_version_times_out() {
    let juju = FakeJuju::new().status(&all_started("1.17.7"));
    let (reporter, env) = (RecordingReporter::default(), ec2_env("foo"));
    let err = client(&juju, &reporter, &env)
        .wait_for_version("1.18.1", Duration::from_secs(10))
        .await
        .expect_err("timeout");
    assert_eq!(
        err.to_string(),
        "Some versions did not update in foo. Expected 1.18.1, seen: 1.17.7: 0, wordpress/0"
    );
}

// ============================================================================
// Descriptor isolation
// ============================================================================

#[tokio::test]
async fn test_env_client_keeps_its_own_descriptor() {
    let juju = FakeJuju::new();
    let reporter = RecordingReporter::default();
    let mut env = ec2_env("foo");
    let env_client = client(&juju, &reporter, &env);
    env = local_env("bar");
    assert_eq!(env_client.environment().name(), "foo");
    assert!(!env_client.environment().is_local());
    assert_eq!(env.name(), "bar");
}
