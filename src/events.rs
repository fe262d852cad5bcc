//! Lifecycle notifications.
//!
//! Four phases per transition, always dispatched in order for one card:
//! `card:expand-start` → `card:expand-end`, or
//! `card:collapse-start` → `card:collapse-end`. Every event carries the
//! card, panel and toggle handles; force-closes (accordion siblings,
//! reduced-motion and non-animated collapses) set `immediate`.
//!
//! Listeners subscribe on the controller's [`EventBus`] and receive the
//! document alongside the event so they can read ARIA state at dispatch
//! time. Events are flagged bubbling and cancelable to match the page-level
//! contract, but nothing checks cancellation: listeners observe, they do not
//! veto.

use crate::dom::{Document, NodeId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CardEventKind {
    ExpandStart,
    ExpandEnd,
    CollapseStart,
    CollapseEnd,
}

impl CardEventKind {
    pub const ALL: [CardEventKind; 4] = [
        CardEventKind::ExpandStart,
        CardEventKind::ExpandEnd,
        CardEventKind::CollapseStart,
        CardEventKind::CollapseEnd,
    ];

    /// Event type name as dispatched on a page.
    pub fn name(self) -> &'static str {
        match self {
            CardEventKind::ExpandStart => "card:expand-start",
            CardEventKind::ExpandEnd => "card:expand-end",
            CardEventKind::CollapseStart => "card:collapse-start",
            CardEventKind::CollapseEnd => "card:collapse-end",
        }
    }
}

impl std::fmt::Display for CardEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardEvent {
    pub kind: CardEventKind,
    pub card: NodeId,
    pub panel: NodeId,
    pub toggle: NodeId,
    pub immediate: bool,
    /// Virtual time of dispatch, in milliseconds.
    pub time_ms: u64,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl CardEvent {
    pub(crate) fn new(
        kind: CardEventKind,
        card: NodeId,
        panel: NodeId,
        toggle: NodeId,
        immediate: bool,
        time_ms: u64,
    ) -> Self {
        Self {
            kind,
            card,
            panel,
            toggle,
            immediate,
            time_ms,
            bubbles: true,
            cancelable: true,
        }
    }
}

pub type Listener = Box<dyn FnMut(&CardEvent, &Document)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: Option<CardEventKind>,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    /// Receive all four phases.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CardEvent, &Document) + 'static,
    ) -> SubscriptionId {
        self.add(None, Box::new(listener))
    }

    /// Receive one phase only.
    pub fn subscribe_kind(
        &mut self,
        kind: CardEventKind,
        listener: impl FnMut(&CardEvent, &Document) + 'static,
    ) -> SubscriptionId {
        self.add(Some(kind), Box::new(listener))
    }

    fn add(&mut self, kind: Option<CardEventKind>, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Deliver to listeners in subscription order.
    pub(crate) fn emit(&mut self, event: &CardEvent, doc: &Document) {
        tracing::trace!(event = event.kind.name(), card = event.card.index(), "dispatch");
        for sub in &mut self.subscriptions {
            if sub.kind.is_none_or(|k| k == event.kind) {
                (sub.listener)(event, doc);
            }
        }
    }
}
