use assert_cmd::Command;

fn nightlapse() -> Command {
    let mut cmd = Command::cargo_bin("nightlapse").expect("binary builds");
    // The host environment may carry a real deployment's settings.
    for (name, _) in std::env::vars() {
        if name.starts_with("NIGHTLAPSE_") {
            cmd.env_remove(name);
        }
    }
    cmd
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[test]
fn help_describes_the_tool() {
    let assert = nightlapse().arg("--help").assert().success();
    assert!(stdout_of(&assert).contains("time-lapse"));
}

#[test]
fn completions_need_no_configuration() {
    let assert = nightlapse().args(["--completions", "bash"]).assert().success();
    assert!(stdout_of(&assert).contains("nightlapse"));
}

#[test]
fn date_and_days_back_conflict() {
    let assert = nightlapse().args(["--date", "20260807", "--days-back", "2"]).assert().failure();
    assert!(stderr_of(&assert).contains("cannot be used with"));
}

#[test]
fn malformed_dates_are_rejected() {
    nightlapse().args(["--date", "2026-08-07"]).assert().failure();
}

#[test]
fn missing_configuration_names_the_variable() {
    let temp = tempfile::tempdir().expect("tempdir");

    let assert = nightlapse().current_dir(temp.path()).arg("--no-mount").assert().failure();
    assert!(stderr_of(&assert).contains("NIGHTLAPSE_HOST"));
}
