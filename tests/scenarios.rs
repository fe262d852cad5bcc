//! Fixture scenarios run through the public API.
//!
//! Each scenario under `fixtures/scenarios/` is played against
//! `fixtures/pages/faq.xhtml`; its `expect` steps must all hold.

use card_expandable::CardEventKind;
use card_expandable::config::{ControllerConfig, load_config};
use card_expandable::scenario::{Scenario, ScenarioReport, run_scenario};
use std::path::{Path, PathBuf};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn faq_page() -> String {
    std::fs::read_to_string(fixtures().join("pages/faq.xhtml")).unwrap()
}

fn run_fixture(name: &str, config: &ControllerConfig) -> ScenarioReport {
    let scenario = Scenario::load(&fixtures().join("scenarios").join(name)).unwrap();
    let report = run_scenario(&faq_page(), &scenario, config).unwrap();
    assert!(report.passed(), "{name} failed: {:#?}", report.failures);
    report
}

fn names(report: &ScenarioReport) -> Vec<&str> {
    report.events.iter().map(|e| e.event).collect()
}

#[test]
fn accordion_scenario() {
    let report = run_fixture("accordion.toml", &ControllerConfig::default());
    assert_eq!(
        names(&report),
        vec![
            // click faq-2: faq-1 is force-closed first
            "card:collapse-start",
            "card:collapse-end",
            "card:expand-start",
            "card:expand-end",
            // Enter on faq-1: faq-2 is force-closed first
            "card:collapse-start",
            "card:collapse-end",
            "card:expand-start",
            "card:expand-end",
        ]
    );
    let immediate: Vec<bool> = report.events.iter().map(|e| e.immediate).collect();
    assert_eq!(
        immediate,
        vec![true, true, false, false, true, true, false, false]
    );
    // The theme token on the page root sets 250ms.
    assert_eq!(report.events[3].time_ms, 250);
}

#[test]
fn print_scenario_restores_every_card() {
    let report = run_fixture("print.toml", &ControllerConfig::default());
    assert!(report.events.is_empty());
    let details = report
        .cards
        .iter()
        .find(|c| c.card_id.as_deref() == Some("details"))
        .unwrap();
    assert_eq!(details.height, "0px");
    assert_eq!(details.visibility, "hidden");
    assert_eq!(details.aria_hidden.as_deref(), Some("true"));
}

#[test]
fn focus_rescue_scenario() {
    let report = run_fixture("focus_rescue.toml", &ControllerConfig::default());
    assert_eq!(report.events.len(), 2);
    assert!(report.events.iter().all(|e| e.immediate));
}

#[test]
fn fixture_config_enables_exclusive_groups() {
    let config = load_config(Some(fixtures().join("config.toml").as_path())).unwrap();
    assert!(config.enable_exclusive_groups);

    let scenario = Scenario::from_toml(
        r#"
        [[step]]
        action = "expand"
        target = "faq-3"
        "#,
    )
    .unwrap();
    let report = run_scenario(&faq_page(), &scenario, &config).unwrap();
    let kinds: Vec<_> = report.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CardEventKind::CollapseStart,
            CardEventKind::CollapseEnd,
            CardEventKind::ExpandStart,
            CardEventKind::ExpandEnd,
        ]
    );
    assert_eq!(report.events[0].card_id.as_deref(), Some("faq-1"));
}

#[test]
fn reduced_motion_collapses_immediately() {
    let mut config = ControllerConfig::default();
    config.motion.prefers_reduced_motion = true;
    let scenario = Scenario::from_toml(
        r#"
        [[step]]
        action = "collapse"
        target = "faq-1"

        [[step]]
        action = "expect"
        target = "faq-1"
        open = false
        "#,
    )
    .unwrap();
    let report = run_scenario(&faq_page(), &scenario, &config).unwrap();
    assert!(report.passed(), "{:?}", report.failures);
    assert!(report.events.iter().all(|e| e.immediate));
    assert_eq!(report.final_time_ms, 0);
}
