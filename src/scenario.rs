//! Scripted interaction against a page.
//!
//! A scenario is a TOML list of steps run in order against one controller:
//!
//! ```toml
//! [[step]]
//! action = "click"
//! target = "faq-1"
//!
//! [[step]]
//! action = "wait"
//! ms = 200
//!
//! [[step]]
//! action = "expect"
//! target = "faq-1"
//! open = true
//! ```
//!
//! The page is initialized with the config's options before the first step.
//! In `click`, `key`, `focus` and `expect.focused`, a target that names a
//! registered card stands for that card's toggle.
//! `expect` failures are collected, not fatal; a step that names an element
//! which does not exist aborts the run with [`ScenarioError::UnknownTarget`].
//! Transition calls (`expand`, `collapse`, `toggle`) on a missing card are
//! no-ops, as they are on the controller itself.

use crate::config::ControllerConfig;
use crate::controller::{CardState, Controller, InitOptions};
use crate::dom::{DomError, NodeId, parse_document};
use crate::event_log::{EventLog, EventLogEntry};
use crate::keyboard::{Key, UnknownKey};
use crate::print::PrintRestore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scenario parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Page error: {0}")]
    Dom(#[from] DomError),
    #[error("step {step}: no element matches `{target}`")]
    UnknownTarget { step: usize, target: String },
    #[error("Key error: {0}")]
    UnknownKey(#[from] UnknownKey),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Expand {
        target: String,
    },
    Collapse {
        target: String,
        #[serde(default = "default_true")]
        animate: bool,
    },
    Toggle {
        target: String,
    },
    /// Pointer activation of any element.
    Click {
        target: String,
    },
    Key {
        target: String,
        key: String,
    },
    Focus {
        target: String,
    },
    /// Let virtual time pass.
    Wait {
        ms: u64,
    },
    /// Run until nothing is queued.
    Settle,
    BeforePrint,
    AfterPrint,
    /// Append markup to `parent`.
    Insert {
        parent: String,
        markup: String,
    },
    /// Re-run initialization, optionally scoped and with other options.
    Init {
        root: Option<String>,
        exclusive: Option<bool>,
    },
    Expect {
        target: Option<String>,
        open: Option<bool>,
        focused: Option<String>,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Expand { .. } => "expand",
            Step::Collapse { .. } => "collapse",
            Step::Toggle { .. } => "toggle",
            Step::Click { .. } => "click",
            Step::Key { .. } => "key",
            Step::Focus { .. } => "focus",
            Step::Wait { .. } => "wait",
            Step::Settle => "settle",
            Step::BeforePrint => "before-print",
            Step::AfterPrint => "after-print",
            Step::Insert { .. } => "insert",
            Step::Init { .. } => "init",
            Step::Expect { .. } => "expect",
        }
    }
}

impl Scenario {
    pub fn from_toml(source: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml(&source)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub steps_run: usize,
    pub final_time_ms: u64,
    pub events: Vec<EventLogEntry>,
    pub cards: Vec<CardState>,
    pub failures: Vec<String>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load `page`, initialize it with `config`, run `scenario`, then settle.
pub fn run_scenario(
    page: &str,
    scenario: &Scenario,
    config: &ControllerConfig,
) -> Result<ScenarioReport, ScenarioError> {
    let document = parse_document(page)?;
    let mut ctl = Controller::new(document, config);
    let init = ctl.initialize(None, InitOptions::from(config));
    tracing::info!(
        registered = init.registered.len(),
        skipped = init.skipped.len(),
        steps = scenario.steps.len(),
        "scenario start"
    );
    let log = EventLog::attach(&mut ctl);

    let mut failures = Vec::new();
    for (index, step) in scenario.steps.iter().enumerate() {
        let number = index + 1;
        tracing::debug!(step = number, action = step.name(), t = ctl.now(), "step");
        run_step(&mut ctl, number, step, config, &mut failures)?;
    }
    ctl.run_until_idle();

    let events = log.borrow().entries().to_vec();
    Ok(ScenarioReport {
        steps_run: scenario.steps.len(),
        final_time_ms: ctl.now(),
        events,
        cards: ctl.card_states(),
        failures,
    })
}

fn element(ctl: &Controller, step: usize, target: &str) -> Result<NodeId, ScenarioError> {
    ctl.resolve(target).ok_or_else(|| ScenarioError::UnknownTarget {
        step,
        target: target.to_string(),
    })
}

/// Like [`element`], but a registered card maps to its toggle.
fn interactive(ctl: &Controller, step: usize, target: &str) -> Result<NodeId, ScenarioError> {
    let node = element(ctl, step, target)?;
    Ok(ctl.registry().get(node).map_or(node, |entry| entry.toggle))
}

fn run_step(
    ctl: &mut Controller,
    number: usize,
    step: &Step,
    config: &ControllerConfig,
    failures: &mut Vec<String>,
) -> Result<(), ScenarioError> {
    match step {
        Step::Expand { target } => {
            let _ = ctl.expand(target);
        }
        Step::Collapse { target, animate } => {
            let _ = ctl.collapse_with(target, *animate);
        }
        Step::Toggle { target } => {
            let _ = ctl.toggle(target);
        }
        Step::Click { target } => {
            let node = interactive(ctl, number, target)?;
            let _ = ctl.click(node);
        }
        Step::Key { target, key } => {
            let key: Key = key.parse()?;
            let node = interactive(ctl, number, target)?;
            let _ = ctl.key_down(node, key);
        }
        Step::Focus { target } => {
            let node = interactive(ctl, number, target)?;
            ctl.document_mut().focus(node);
        }
        Step::Wait { ms } => ctl.advance(*ms),
        Step::Settle => {
            ctl.run_until_idle();
        }
        Step::BeforePrint => {
            ctl.before_print();
        }
        Step::AfterPrint => {
            if ctl.after_print() == PrintRestore::SkippedUserInteracted {
                tracing::info!(step = number, "print restore skipped after user interaction");
            }
        }
        Step::Insert { parent, markup } => {
            let node = element(ctl, number, parent)?;
            ctl.document_mut().insert_markup(node, markup)?;
        }
        Step::Init { root, exclusive } => {
            let root = match root {
                Some(r) => Some(element(ctl, number, r)?),
                None => None,
            };
            let options = InitOptions {
                enable_exclusive_groups: exclusive.unwrap_or(config.enable_exclusive_groups),
            };
            let report = ctl.initialize(root, options);
            tracing::debug!(step = number, registered = report.registered.len(), "re-initialized");
        }
        Step::Expect {
            target,
            open,
            focused,
        } => check_expectation(ctl, number, target.as_deref(), *open, focused.as_deref(), failures),
    }
    Ok(())
}

fn check_expectation(
    ctl: &Controller,
    number: usize,
    target: Option<&str>,
    open: Option<bool>,
    focused: Option<&str>,
    failures: &mut Vec<String>,
) {
    let mut fail = |message: String| {
        tracing::warn!(step = number, "{message}");
        failures.push(format!("step {number}: {message}"));
    };

    if let Some(expected) = open {
        match target {
            None => fail("`open` needs a `target`".to_string()),
            Some(target) => match ctl.is_open(target) {
                Some(actual) if actual == expected => {}
                Some(actual) => fail(format!("`{target}` open={actual}, expected {expected}")),
                None => fail(format!("`{target}` is not a registered card")),
            },
        }
    }

    if let Some(expected) = focused {
        let wanted = interactive(ctl, number, expected).ok();
        let active = ctl.document().active_element();
        if wanted.is_none() {
            fail(format!("focus target `{expected}` does not exist"));
        } else if active != wanted {
            let actual = active
                .and_then(|n| ctl.document().id(n))
                .unwrap_or("<none>")
                .to_string();
            fail(format!("focus on `{actual}`, expected `{expected}`"));
        }
    }
}
