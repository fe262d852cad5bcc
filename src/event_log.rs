//! Recording of card lifecycle events.
//!
//! An [`EventLog`] subscribes to all four phases and captures, per event,
//! the ARIA state visible to a listener at dispatch time. Times are relative
//! to the moment the log was attached.

use crate::controller::Controller;
use crate::dom::Document;
use crate::events::{CardEvent, CardEventKind};
use indexmap::IndexMap;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLogEntry {
    pub time_ms: u64,
    pub event: &'static str,
    #[serde(skip)]
    pub kind: CardEventKind,
    pub card_id: Option<String>,
    pub toggle_id: Option<String>,
    pub aria_expanded: Option<String>,
    pub aria_hidden: Option<String>,
    pub panel_visible: bool,
    pub immediate: bool,
}

impl EventLogEntry {
    fn capture(event: &CardEvent, doc: &Document, started_at: u64) -> Self {
        let owned = |v: Option<&str>| v.map(str::to_string);
        Self {
            time_ms: event.time_ms.saturating_sub(started_at),
            event: event.kind.name(),
            kind: event.kind,
            card_id: owned(doc.id(event.card)),
            toggle_id: owned(doc.id(event.toggle)),
            aria_expanded: owned(doc.attribute(event.toggle, "aria-expanded")),
            aria_hidden: owned(doc.attribute(event.panel, "aria-hidden")),
            panel_visible: doc.style(event.panel, "visibility") != "hidden",
            immediate: event.immediate,
        }
    }
}

/// Tally `entries` by kind, in [`CardEventKind::ALL`] order.
pub fn count_by_kind(entries: &[EventLogEntry]) -> IndexMap<CardEventKind, usize> {
    let mut counts: IndexMap<_, _> = CardEventKind::ALL.iter().map(|k| (*k, 0)).collect();
    for entry in entries {
        *counts.entry(entry.kind).or_default() += 1;
    }
    counts
}

#[derive(Debug, Default)]
pub struct EventLog {
    started_at: u64,
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    /// Subscribe a fresh log to `controller`'s events.
    pub fn attach(controller: &mut Controller) -> Rc<RefCell<EventLog>> {
        let log = Rc::new(RefCell::new(EventLog {
            started_at: controller.now(),
            entries: Vec::new(),
        }));
        let sink = Rc::clone(&log);
        controller.subscribe(move |event, doc| {
            let mut log = sink.borrow_mut();
            let entry = EventLogEntry::capture(event, doc, log.started_at);
            log.entries.push(entry);
        });
        log
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Count per event kind. Every kind is present, zero when unseen.
    pub fn counts(&self) -> IndexMap<CardEventKind, usize> {
        count_by_kind(&self.entries)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}
