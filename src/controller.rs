//! The card controller: one instance owns every piece of mutable state.
//!
//! [`Controller`] holds the document, the card registry, the scheduler, the
//! event bus, the cached motion tokens and the print snapshot. Nothing is
//! process-global, so two controllers (or two tests) never share state, and
//! [`Controller::reset`] returns one to a freshly constructed state without
//! touching the page.
//!
//! Behaviour is split across modules that each add an `impl Controller`
//! block:
//!
//! | Module | Operations |
//! |--------|------------|
//! | here | `initialize`, `resolve`, `click`, event-loop pumping |
//! | [`crate::transition`] | `expand`, `collapse`, `toggle` |
//! | [`crate::accordion`] | sibling force-close for exclusive groups |
//! | [`crate::keyboard`] | Enter/Space activation and roving focus |
//! | [`crate::print`] | `before_print` / `after_print` |

use crate::config::ControllerConfig;
use crate::dom::{Document, NodeId, Selector};
use crate::events::{CardEvent, CardEventKind, EventBus, SubscriptionId};
use crate::motion::MotionTokens;
use crate::print::PrintState;
use crate::registry::{CardEntry, InitReport, Markers, Registry, SkipReason, markers};
use crate::scheduler::{Completion, Scheduler};
use serde::Serialize;

/// Options for [`Controller::initialize`]. The most recent call wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    pub enable_exclusive_groups: bool,
}

impl From<&ControllerConfig> for InitOptions {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            enable_exclusive_groups: config.enable_exclusive_groups,
        }
    }
}

/// A reference to a card as accepted by the public operations.
///
/// Strings resolve in this order: `#id`, then a bare identifier looked up
/// as an id, then any selector (first match in the document).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRef<'a> {
    Element(NodeId),
    Query(&'a str),
}

impl From<NodeId> for CardRef<'_> {
    fn from(node: NodeId) -> Self {
        CardRef::Element(node)
    }
}

impl<'a> From<&'a str> for CardRef<'a> {
    fn from(query: &'a str) -> Self {
        CardRef::Query(query)
    }
}

impl<'a> From<&'a String> for CardRef<'a> {
    fn from(query: &'a String) -> Self {
        CardRef::Query(query.as_str())
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Observable state of one card, for reports and assertions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardState {
    pub card: NodeId,
    pub card_id: Option<String>,
    pub toggle_id: Option<String>,
    pub panel_id: Option<String>,
    pub group_id: Option<String>,
    pub is_open: bool,
    pub aria_expanded: Option<String>,
    pub aria_hidden: Option<String>,
    pub height: String,
    pub visibility: String,
}

#[derive(Debug)]
pub struct Controller {
    pub(crate) document: Document,
    pub(crate) registry: Registry,
    pub(crate) scheduler: Scheduler,
    pub(crate) events: EventBus,
    pub(crate) motion: MotionTokens,
    pub(crate) print: PrintState,
    pub(crate) markers: Markers,
    pub(crate) options: InitOptions,
    next_generated_id: usize,
}

impl Controller {
    pub fn new(document: Document, config: &ControllerConfig) -> Self {
        Self {
            document,
            registry: Registry::default(),
            scheduler: Scheduler::new(),
            events: EventBus::default(),
            motion: MotionTokens::new(config.motion.clone()),
            print: PrintState::default(),
            markers: Markers::default(),
            options: InitOptions::from(config),
            next_generated_id: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct page access, e.g. to insert markup before re-initializing.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn is_open<'a>(&self, card: impl Into<CardRef<'a>>) -> Option<bool> {
        self.resolve(card).and_then(|c| self.registry.is_open(c))
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CardEvent, &Document) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub(crate) fn emit(&mut self, kind: CardEventKind, card: NodeId, immediate: bool) {
        let Some(entry) = self.registry.get(card) else {
            return;
        };
        let event = CardEvent::new(
            kind,
            card,
            entry.panel,
            entry.toggle,
            immediate,
            self.scheduler.now(),
        );
        self.events.emit(&event, &self.document);
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register every card under `root` (the whole document when `None`).
    ///
    /// Safe to repeat: cards already in the registry are left alone, so a
    /// second pass after inserting markup only picks up the new cards.
    /// Card-marked elements without a toggle or panel are skipped.
    pub fn initialize(&mut self, root: Option<NodeId>, options: InitOptions) -> InitReport {
        self.options = options;
        let scope = root.unwrap_or_else(|| self.document.root());
        let mut report = InitReport::default();

        for card in self.document.query_selector_all(scope, &self.markers.card) {
            if self.registry.contains(card) {
                report.already_known.push(card);
                continue;
            }

            let toggle = self.document.query_selector(card, &self.markers.toggle);
            let panel = self.document.query_selector(card, &self.markers.panel);
            let (toggle, panel) = match (toggle, panel) {
                (Some(t), Some(p)) => (t, p),
                (None, _) => {
                    tracing::debug!(card = card.index(), "skipping card without toggle");
                    report.skipped.push((card, SkipReason::MissingToggle));
                    continue;
                }
                (_, None) => {
                    tracing::debug!(card = card.index(), "skipping card without panel");
                    report.skipped.push((card, SkipReason::MissingPanel));
                    continue;
                }
            };

            let toggle_id = self.ensure_id(toggle, "card-toggle");
            let panel_id = self.ensure_id(panel, "card-panel");
            self.document.set_attribute(toggle, "aria-controls", &panel_id);
            self.document.set_attribute(panel, "aria-labelledby", &toggle_id);
            self.document.set_attribute(panel, "role", "region");

            let is_open = self.document.has_attribute(card, markers::EXPANDED_ATTR)
                || self.document.has_class(card, markers::OPEN_CLASS);
            self.registry
                .insert(card, CardEntry::new(toggle, panel, is_open));

            // Initial state is written without events: nothing transitioned.
            if is_open {
                self.apply_open_state(card);
            } else {
                self.apply_closed_state(card);
            }
            tracing::debug!(card = card.index(), is_open, "registered card");
            report.registered.push(card);
        }

        report
    }

    fn ensure_id(&mut self, node: NodeId, prefix: &str) -> String {
        if let Some(id) = self.document.id(node) {
            return id.to_string();
        }
        let id = loop {
            self.next_generated_id += 1;
            let candidate = format!("{prefix}-{}", self.next_generated_id);
            if self.document.get_element_by_id(&candidate).is_none() {
                break candidate;
            }
        };
        self.document.set_attribute(node, "id", &id);
        id
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve a reference to an element. Does not check registration.
    pub fn resolve<'a>(&self, card: impl Into<CardRef<'a>>) -> Option<NodeId> {
        match card.into() {
            CardRef::Element(node) => (node.index() < self.document.len()).then_some(node),
            CardRef::Query(query) => {
                let query = query.trim();
                if let Some(id) = query.strip_prefix('#') {
                    return self.document.get_element_by_id(id);
                }
                if is_plain_identifier(query) {
                    if let Some(found) = self.document.get_element_by_id(query) {
                        return Some(found);
                    }
                }
                let selector = Selector::parse(query).ok()?;
                self.document.query_selector(self.document.root(), &selector)
            }
        }
    }

    /// Resolve to a registered card, or `None` for anything else.
    pub(crate) fn resolve_registered<'a>(&self, card: impl Into<CardRef<'a>>) -> Option<NodeId> {
        self.resolve(card).filter(|c| self.registry.contains(*c))
    }

    /// The registered card whose toggle is `target` or contains it.
    pub(crate) fn card_for_activation(&self, target: NodeId) -> Option<NodeId> {
        let mut cursor = self.resolve(target);
        while let Some(node) = cursor {
            if let Some(card) = self.registry.card_for_toggle(node) {
                return Some(card);
            }
            cursor = self.document.parent(node);
        }
        None
    }

    // ------------------------------------------------------------------
    // Pointer activation
    // ------------------------------------------------------------------

    /// A click on `target`. Activates the card when `target` is (inside) a
    /// registered toggle and counts as user interaction for print restore.
    pub fn click(&mut self, target: NodeId) -> Completion {
        let Some(card) = self.card_for_activation(target) else {
            return Completion::ready();
        };
        self.print.user_interacted = true;
        self.document.focus(target);
        self.toggle(card)
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    pub fn run_microtasks(&mut self) {
        while let Some(task) = self.scheduler.pop_microtask() {
            self.run_task(task);
        }
    }

    /// Drain microtasks, then run one rendering opportunity.
    pub fn next_frame(&mut self) {
        self.run_microtasks();
        for task in self.scheduler.take_frame() {
            self.run_task(task);
        }
        self.run_microtasks();
    }

    /// Let `ms` of virtual time pass, running everything that falls due.
    pub fn advance(&mut self, ms: u64) {
        let deadline = self.scheduler.now().saturating_add(ms);
        self.next_frame();
        while let Some(task) = self.scheduler.pop_timer_due_by(deadline) {
            self.run_task(task);
            self.next_frame();
        }
        self.scheduler.advance_clock_to(deadline);
    }

    /// Run until no work is queued. Returns the virtual time reached.
    pub fn run_until_idle(&mut self) -> u64 {
        while self.scheduler.has_pending_work() {
            self.step();
        }
        self.scheduler.now()
    }

    /// Run until `completion` resolves (or nothing is left to run).
    /// Returns whether it resolved.
    pub fn wait(&mut self, completion: Completion) -> bool {
        while !self.scheduler.is_resolved(&completion) && self.scheduler.has_pending_work() {
            self.step();
        }
        self.scheduler.is_resolved(&completion)
    }

    pub fn is_resolved(&self, completion: &Completion) -> bool {
        self.scheduler.is_resolved(completion)
    }

    fn step(&mut self) {
        self.next_frame();
        if let Some(due) = self.scheduler.next_timer_due() {
            if let Some(task) = self.scheduler.pop_timer_due_by(due) {
                self.run_task(task);
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Forget every card, queued transition, print snapshot and cached
    /// motion token. The page and event subscriptions are kept.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.scheduler.clear();
        self.print = PrintState::default();
        self.motion.reset();
        self.options = InitOptions::default();
    }

    /// Tear the controller down and hand back the page.
    pub fn dispose(mut self) -> Document {
        self.reset();
        self.document
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    pub fn card_state(&self, card: NodeId) -> Option<CardState> {
        let entry = self.registry.get(card)?;
        let doc = &self.document;
        let owned = |v: Option<&str>| v.map(str::to_string);
        Some(CardState {
            card,
            card_id: owned(doc.id(card)),
            toggle_id: owned(doc.id(entry.toggle)),
            panel_id: owned(doc.id(entry.panel)),
            group_id: doc
                .closest(card, &self.markers.group)
                .and_then(|g| owned(doc.id(g))),
            is_open: entry.is_open,
            aria_expanded: owned(doc.attribute(entry.toggle, "aria-expanded")),
            aria_hidden: owned(doc.attribute(entry.panel, "aria-hidden")),
            height: doc.style(entry.panel, "height").to_string(),
            visibility: doc.style(entry.panel, "visibility").to_string(),
        })
    }

    /// States of all registered cards in registration order.
    pub fn card_states(&self) -> Vec<CardState> {
        self.registry
            .cards()
            .into_iter()
            .filter_map(|c| self.card_state(c))
            .collect()
    }
}
