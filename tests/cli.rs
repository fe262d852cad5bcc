//! End-to-end checks of the `card-expandable` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn card_expandable(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_card-expandable"))
        .args(args)
        .env_remove("CARD_EXPANDABLE_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn gen_config_round_trips_through_the_loader() {
    let output = card_expandable(&["gen-config"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("enable_exclusive_groups = false"));

    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, &text).unwrap();
    let config = card_expandable::config::load_config(Some(path.as_path())).unwrap();
    assert_eq!(config, card_expandable::config::ControllerConfig::default());
}

#[test]
fn check_lists_registered_and_skipped_cards() {
    let page = fixtures().join("pages/faq.xhtml");
    let output = card_expandable(&["check", "--page", page.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("001 faq-1 (open)"));
    assert!(text.contains("    Toggle: faq-1-toggle → Panel: faq-1-body"));
    assert!(text.contains("    Group: faq"));
    assert!(text.contains("    broken: missing toggle"));
    assert!(text.contains("Registered 4 cards, skipped 1"));
}

#[test]
fn run_reports_json() {
    let page = fixtures().join("pages/faq.xhtml");
    let scenario = fixtures().join("scenarios/accordion.toml");
    let output = card_expandable(&[
        "run",
        "--page",
        page.to_str().unwrap(),
        "--scenario",
        scenario.to_str().unwrap(),
        "--json",
    ]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);
    assert_eq!(report["events"][0]["event"], "card:collapse-start");
    assert_eq!(report["events"][0]["card_id"], "faq-1");
}

#[test]
fn failed_expectations_exit_non_zero() {
    let tmp = tempfile::TempDir::new().unwrap();
    let scenario = tmp.path().join("fail.toml");
    std::fs::write(
        &scenario,
        "[[step]]\naction = \"expect\"\ntarget = \"faq-2\"\nopen = true\n",
    )
    .unwrap();
    let page = fixtures().join("pages/faq.xhtml");
    let output = card_expandable(&[
        "run",
        "--page",
        page.to_str().unwrap(),
        "--scenario",
        scenario.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Failures"));
    assert!(text.contains("Failed: 1 steps, 0ms"));
}

#[test]
fn invalid_config_is_reported() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = tmp.path().join("config.toml");
    std::fs::write(&config, "[motion]\nduration = \"fast\"\n").unwrap();
    let page = fixtures().join("pages/faq.xhtml");
    let output = card_expandable(&[
        "--config",
        config.to_str().unwrap(),
        "check",
        "--page",
        page.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("motion.duration"));
}
