//! CLI output formatting.
//!
//! # Display Contract
//!
//! Cards are listed by positional index and id, with their wiring and state
//! as indented context lines. Elements without an id are shown by tag in
//! parentheses, since the tag is all that identifies them.
//!
//! ## Check
//!
//! ```text
//! Cards
//! 001 faq-1 (open)
//!     Toggle: card-toggle-1 → Panel: faq-1-body
//!     Group: faq
//! 002 (article) (closed)
//!     Toggle: card-toggle-2 → Panel: card-panel-3
//!
//! Skipped
//!     broken: missing toggle
//!
//! Registered 2 cards, skipped 1
//! ```
//!
//! ## Run
//!
//! ```text
//! Events
//!        0ms card:expand-start    faq-1  expanded=false hidden=true
//!      200ms card:expand-end      faq-1  expanded=true  hidden=-     visible
//!
//! Counts
//!     card:expand-start: 1
//!     ...
//!     Total: 2
//!
//! Cards
//! 001 faq-1 (open)
//!     aria-expanded=true aria-hidden=-
//!     height: auto
//!
//! Passed: 3 steps, 200ms
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::controller::{CardState, Controller};
use crate::dom::NodeId;
use crate::event_log::{EventLogEntry, count_by_kind};
use crate::events::CardEventKind;
use crate::registry::{InitReport, SkipReason};
use crate::scenario::ScenarioReport;
use indexmap::IndexMap;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn open_label(is_open: bool) -> &'static str {
    if is_open { "open" } else { "closed" }
}

/// An element's id, or its tag in parentheses when it has none.
fn element_label(ctl: &Controller, node: NodeId) -> String {
    let doc = ctl.document();
    match doc.id(node) {
        Some(id) => id.to_string(),
        None => format!("({})", doc.tag(node)),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// ```text
/// 001 faq-1 (open)
/// ```
fn card_header(index: usize, card_id: Option<&str>, is_open: bool) -> String {
    let name = card_id.unwrap_or("(card)");
    format!("{} {} ({})", format_index(index), name, open_label(is_open))
}

fn skip_reason(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::MissingToggle => "missing toggle",
        SkipReason::MissingPanel => "missing panel",
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the outcome of initializing a page.
pub fn format_init_report(ctl: &Controller, report: &InitReport) -> Vec<String> {
    let mut lines = vec!["Cards".to_string()];

    for (i, card) in report.registered.iter().enumerate() {
        let Some(state) = ctl.card_state(*card) else {
            continue;
        };
        let name = state.card_id.clone().unwrap_or_else(|| element_label(ctl, *card));
        lines.push(card_header(i + 1, Some(name.as_str()), state.is_open));
        lines.push(format!(
            "{}Toggle: {} → Panel: {}",
            indent(1),
            or_dash(state.toggle_id.as_deref()),
            or_dash(state.panel_id.as_deref())
        ));
        if let Some(group) = &state.group_id {
            lines.push(format!("{}Group: {}", indent(1), group));
        }
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for (card, reason) in &report.skipped {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                element_label(ctl, *card),
                skip_reason(*reason)
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Registered {} card{}, skipped {}",
        report.registered.len(),
        if report.registered.len() == 1 { "" } else { "s" },
        report.skipped.len()
    ));
    lines
}

/// Print the init report to stdout.
pub fn print_init_report(ctl: &Controller, report: &InitReport) {
    for line in format_init_report(ctl, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Run
// ============================================================================

/// One event log entry as a fixed-width line.
pub fn format_event_line(entry: &EventLogEntry) -> String {
    let mut line = format!(
        "{:>6}ms {:<20} {:<12} expanded={:<5} hidden={:<5}",
        entry.time_ms,
        entry.event,
        or_dash(entry.card_id.as_deref()),
        or_dash(entry.aria_expanded.as_deref()),
        or_dash(entry.aria_hidden.as_deref()),
    );
    if entry.panel_visible {
        line.push_str(" visible");
    }
    if entry.immediate {
        line.push_str(" immediate");
    }
    line.trim_end().to_string()
}

pub fn format_event_log(entries: &[EventLogEntry]) -> Vec<String> {
    let mut lines = vec!["Events".to_string()];
    if entries.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    lines.extend(entries.iter().map(format_event_line));
    lines
}

pub fn format_counts(counts: &IndexMap<CardEventKind, usize>) -> Vec<String> {
    let mut lines = vec!["Counts".to_string()];
    for (kind, count) in counts {
        lines.push(format!("{}{}: {}", indent(1), kind, count));
    }
    lines.push(format!("{}Total: {}", indent(1), counts.values().sum::<usize>()));
    lines
}

pub fn format_card_states(states: &[CardState]) -> Vec<String> {
    let mut lines = vec!["Cards".to_string()];
    for (i, state) in states.iter().enumerate() {
        lines.push(card_header(i + 1, state.card_id.as_deref(), state.is_open));
        lines.push(format!(
            "{}aria-expanded={} aria-hidden={}",
            indent(1),
            or_dash(state.aria_expanded.as_deref()),
            or_dash(state.aria_hidden.as_deref())
        ));
        if !state.height.is_empty() {
            lines.push(format!("{}height: {}", indent(1), state.height));
        }
    }
    lines
}

/// Format a full scenario report.
pub fn format_scenario_report(report: &ScenarioReport) -> Vec<String> {
    let mut lines = format_event_log(&report.events);
    lines.push(String::new());
    lines.extend(format_counts(&count_by_kind(&report.events)));
    lines.push(String::new());
    lines.extend(format_card_states(&report.cards));

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures".to_string());
        for failure in &report.failures {
            lines.push(format!("{}{}", indent(1), failure));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{}: {} steps, {}ms",
        if report.passed() { "Passed" } else { "Failed" },
        report.steps_run,
        report.final_time_ms
    ));
    lines
}

/// Print a scenario report to stdout.
pub fn print_scenario_report(report: &ScenarioReport) {
    for line in format_scenario_report(report) {
        println!("{}", line);
    }
}
