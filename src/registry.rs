//! Card registry: which elements are cards, and their logical state.
//!
//! The registry owns identity only. One [`CardEntry`] exists per registered
//! card for the controller's lifetime, keyed by the card's [`NodeId`] and
//! kept in registration order. Behaviour lives in the transition engine,
//! which is also the only writer of [`CardEntry::is_open`].

use crate::dom::{NodeId, Selector};
use indexmap::IndexMap;
use serde::Serialize;

/// Structural markers of the markup contract.
pub mod markers {
    pub const CARD: &str = ".card--expandable[data-expandable]";
    pub const TOGGLE: &str = ".card__toggle";
    pub const PANEL: &str = ".card__content";
    pub const DYNAMIC_LABEL: &str = ".card__toggle-dyn";
    pub const GROUP: &str = "[data-accordion-group]";

    pub const OPEN_CLASS: &str = "is-open";
    pub const EXPANDED_ATTR: &str = "data-expanded";
    pub const LABEL_OPEN_ATTR: &str = "data-label-open";
    pub const LABEL_CLOSED_ATTR: &str = "data-label-closed";
}

/// Parsed forms of the marker selectors.
#[derive(Debug, Clone)]
pub struct Markers {
    pub card: Selector,
    pub toggle: Selector,
    pub panel: Selector,
    pub dynamic_label: Selector,
    pub group: Selector,
}

impl Default for Markers {
    fn default() -> Self {
        let parse = |s: &str| Selector::parse(s).expect("marker selectors are valid");
        Self {
            card: parse(markers::CARD),
            toggle: parse(markers::TOGGLE),
            panel: parse(markers::PANEL),
            dynamic_label: parse(markers::DYNAMIC_LABEL),
            group: parse(markers::GROUP),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    pub toggle: NodeId,
    pub panel: NodeId,
    /// Logical state. Flips when a transition starts, not when it settles.
    pub is_open: bool,
    /// Bumped by every transition; frame and settle work scheduled under an
    /// older generation is discarded.
    pub(crate) generation: u64,
    /// An animated transition has started and not yet settled.
    pub(crate) settling: bool,
}

impl CardEntry {
    pub(crate) fn new(toggle: NodeId, panel: NodeId, is_open: bool) -> Self {
        Self {
            toggle,
            panel,
            is_open,
            generation: 0,
            settling: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    cards: IndexMap<NodeId, CardEntry>,
}

impl Registry {
    pub fn contains(&self, card: NodeId) -> bool {
        self.cards.contains_key(&card)
    }

    pub fn get(&self, card: NodeId) -> Option<&CardEntry> {
        self.cards.get(&card)
    }

    pub(crate) fn get_mut(&mut self, card: NodeId) -> Option<&mut CardEntry> {
        self.cards.get_mut(&card)
    }

    /// Register `card`. Returns `false` (and keeps the existing entry) when
    /// it is already known.
    pub(crate) fn insert(&mut self, card: NodeId, entry: CardEntry) -> bool {
        if self.cards.contains_key(&card) {
            return false;
        }
        self.cards.insert(card, entry);
        true
    }

    pub fn is_open(&self, card: NodeId) -> Option<bool> {
        self.cards.get(&card).map(|e| e.is_open)
    }

    /// Registered cards in registration order.
    pub fn cards(&self) -> Vec<NodeId> {
        self.cards.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CardEntry)> {
        self.cards.iter().map(|(card, entry)| (*card, entry))
    }

    /// The card whose toggle is `toggle`.
    pub fn card_for_toggle(&self, toggle: NodeId) -> Option<NodeId> {
        self.iter()
            .find(|(_, entry)| entry.toggle == toggle)
            .map(|(card, _)| card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.cards.clear();
    }
}

/// Why a card-marked element was left out of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    MissingToggle,
    MissingPanel,
}

/// Outcome of one `initialize` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Cards registered by this pass, in document order.
    pub registered: Vec<NodeId>,
    /// Already-known cards the pass left alone.
    pub already_known: Vec<NodeId>,
    /// Card-marked elements with incomplete markup.
    pub skipped: Vec<(NodeId, SkipReason)>,
}
