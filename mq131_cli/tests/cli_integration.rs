use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid config for the simulated rig on a virtual clock
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[pins]
# pins are unused by the simulated rig but must be present
heater = 17
adc_channel = 0

[sensor]
variant = "low_concentration"
load_resistance_ohms = 1000000.0

[environment]
temperature_c = 20
humidity_pct = 60

[calibration]
r0_ohms = 19940.18
preheat_secs = 80

[simulation]
virtual_clock = true
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn cmd(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("mq131_cli").unwrap();
    cmd.env_remove("MQ131_SIM_FAULT")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["sample"], 0, "ozone:", "stdout")]
#[case(&["sample", "--unit", "ug/m3"], 0, "ug/m3", "stdout")]
#[case(&["sample", "--temperature", "-5", "--humidity", "30"], 0, "ozone:", "stdout")]
#[case(&["sample", "--unit", "furlongs"], 2, "unknown unit", "stderr")]
#[case(&["sample", "--gas", "nox"], 0, "nox:", "stdout")]
#[case(&["sample", "--gas", "co2"], 2, "unknown gas", "stderr")]
#[case(&["sample", "--preheat-secs", "0"], 1, "pre-heat", "stderr")]
#[case(&["calibrate"], 0, "r0_ohms =", "stdout")]
#[case(&["calibrate", "--max-secs", "5"], 4, "deadline of 5 s", "stderr")]
#[case(&["self-check"], 0, "self-check OK", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = cmd(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
#[case("timeout", "sample", 3, "timed out")]
#[case("disconnected", "calibrate", 5, "unusable baseline")]
fn injected_faults_map_to_exit_codes(
    #[case] fault: &str,
    #[case] command: &str,
    #[case] code: i32,
    #[case] needle: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    cmd(&cfg)
        .env("MQ131_SIM_FAULT", fault)
        .arg(command)
        .assert()
        .code(code)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_is_reported() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    cmd(&missing)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not be read"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[pins]\nheater = 17\nadc_channel = 0\n[environment]\nhumidity_pct = 150\n",
    )
    .unwrap();
    cmd(&path)
        .arg("sample")
        .assert()
        .failure()
        .stderr(predicate::str::contains("humidity_pct"));
}

#[test]
fn progress_file_receives_calibration_lines() {
    let dir = tempdir().unwrap();
    let progress = dir.path().join("progress.log");
    let path = dir.path().join("cfg.toml");
    fs::write(
        &path,
        format!(
            "[pins]\nheater = 17\nadc_channel = 0\n[simulation]\nvirtual_clock = true\n[logging]\nprogress_file = {:?}\n",
            progress.display().to_string()
        ),
    )
    .unwrap();
    cmd(&path).arg("calibrate").assert().success();
    let text = fs::read_to_string(&progress).unwrap();
    assert!(text.starts_with("calibration started"));
    assert!(text.contains("calibration done"));
}

fn config_with_debug_logging(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("debug.toml");
    fs::write(
        &path,
        "[pins]\nheater = 17\nadc_channel = 0\n[simulation]\nvirtual_clock = true\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();
    path
}

#[test]
fn config_log_level_applies_without_flag() {
    let dir = tempdir().unwrap();
    let path = config_with_debug_logging(&dir);
    cmd(&path)
        .arg("self-check")
        .assert()
        .success()
        .stderr(predicate::str::contains("config loaded"));
}

#[test]
fn explicit_log_level_overrides_config() {
    let dir = tempdir().unwrap();
    let path = config_with_debug_logging(&dir);
    cmd(&path)
        .args(["--log-level", "warn", "self-check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("config loaded").not());
}
