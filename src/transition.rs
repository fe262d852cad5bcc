//! Transition engine: height-animated expand and collapse with ARIA, class,
//! label and focus updates kept in step.
//!
//! # Expand
//!
//! ```text
//! call:   expand-start, measure scrollHeight, height=0px, visible,
//!         aria-expanded=true, .is-open, no aria-hidden, is_open=true
//! frame:  force layout, height=<measured>px
//! +dur:   height=auto, expand-end
//! ```
//!
//! The height write is split across a frame with a forced layout read in
//! between. Writing `0px` and the target in the same turn would let the
//! browser coalesce them and skip the animation.
//!
//! # Collapse
//!
//! ```text
//! call:   collapse-start, pin height=<rendered>px, is_open=false
//! frame:  force layout, height=0px
//! +dur:   hidden, inert, aria-hidden, aria-expanded=false, no .is-open,
//!         collapse-end
//! ```
//!
//! The immediate path (non-animated calls, reduced motion, accordion
//! siblings) writes the settled state in one go and emits both events with
//! `immediate` set. Focus left inside the hidden panel is moved to the
//! toggle on the next microtask.
//!
//! # Generations
//!
//! Every transition bumps the card's generation. Frame and settle tasks
//! carry the generation they were scheduled under and skip their writes
//! once a newer transition has started, so a quick expand → collapse →
//! expand cannot be overwritten by a stale settle. Their completion still
//! resolves.

use crate::controller::{CardRef, Controller};
use crate::dom::NodeId;
use crate::events::CardEventKind;
use crate::registry::markers;
use crate::scheduler::{Completion, Task};

impl Controller {
    /// Expand a card. No-op (resolved completion) when it is already open
    /// or the reference does not resolve to a registered card.
    pub fn expand<'a>(&mut self, card: impl Into<CardRef<'a>>) -> Completion {
        let Some(card) = self.resolve_registered(card) else {
            return Completion::ready();
        };
        if self.registry.is_open(card) != Some(false) {
            return Completion::ready();
        }

        if self.options.enable_exclusive_groups {
            self.close_open_siblings(card);
        }

        let motion = self.motion.resolve(&self.document);
        let generation = self.begin_transition(card, true, true);
        let Some(entry) = self.registry.get(card).cloned() else {
            return Completion::ready();
        };
        let (toggle, panel) = (entry.toggle, entry.panel);

        self.emit(CardEventKind::ExpandStart, card, false);

        let target_height = self.document.scroll_height(panel);
        self.document.set_style(panel, "height", "0px");
        self.document.set_style(panel, "visibility", "visible");
        self.document.set_style(panel, "pointer-events", "auto");
        self.scheduler.request_animation_frame(Task::ExpandFrame {
            card,
            generation,
            target_height,
        });

        self.document.set_attribute(toggle, "aria-expanded", "true");
        self.document.add_class(card, markers::OPEN_CLASS);
        self.document.remove_attribute(panel, "aria-hidden");
        self.update_dynamic_labels(toggle, true);

        let (completion, id) = self.scheduler.new_completion();
        self.scheduler.set_timeout(
            Task::ExpandSettle {
                card,
                generation,
                completion: id,
            },
            motion.duration_ms,
        );
        tracing::debug!(
            card = card.index(),
            target_height,
            duration_ms = motion.duration_ms,
            "expand"
        );
        completion
    }

    /// Collapse a card with animation (unless reduced motion is preferred).
    pub fn collapse<'a>(&mut self, card: impl Into<CardRef<'a>>) -> Completion {
        self.collapse_with(card, true)
    }

    /// Collapse a card. `animate = false`, or a reduced-motion preference,
    /// takes the immediate path and returns a resolved completion.
    pub fn collapse_with<'a>(
        &mut self,
        card: impl Into<CardRef<'a>>,
        animate: bool,
    ) -> Completion {
        let Some(card) = self.resolve_registered(card) else {
            return Completion::ready();
        };
        if self.registry.is_open(card) != Some(true) {
            return Completion::ready();
        }

        if !animate || self.motion.prefers_reduced_motion() {
            self.force_close_immediate(card);
            return Completion::ready();
        }

        let motion = self.motion.resolve(&self.document);
        let generation = self.begin_transition(card, false, true);
        let Some(panel) = self.registry.get(card).map(|e| e.panel) else {
            return Completion::ready();
        };

        self.emit(CardEventKind::CollapseStart, card, false);

        let current = self.document.offset_height(panel);
        self.document
            .set_style(panel, "height", &format!("{}px", format_px(current)));
        self.scheduler
            .request_animation_frame(Task::CollapseFrame { card, generation });

        let (completion, id) = self.scheduler.new_completion();
        self.scheduler.set_timeout(
            Task::CollapseSettle {
                card,
                generation,
                completion: id,
            },
            motion.duration_ms,
        );
        tracing::debug!(
            card = card.index(),
            from_height = current,
            duration_ms = motion.duration_ms,
            "collapse"
        );
        completion
    }

    /// Collapse when open, expand when closed.
    pub fn toggle<'a>(&mut self, card: impl Into<CardRef<'a>>) -> Completion {
        let Some(card) = self.resolve_registered(card) else {
            return Completion::ready();
        };
        match self.registry.is_open(card) {
            Some(true) => self.collapse(card),
            Some(false) => self.expand(card),
            None => Completion::ready(),
        }
    }

    /// Close without intermediate frames. Emits `collapse-start` and
    /// `collapse-end`, both flagged `immediate`.
    pub(crate) fn force_close_immediate(&mut self, card: NodeId) {
        if self.registry.is_open(card) != Some(true) {
            return;
        }
        self.begin_transition(card, false, false);
        let Some(entry) = self.registry.get(card).cloned() else {
            return;
        };

        self.emit(CardEventKind::CollapseStart, card, true);
        self.apply_closed_state(card);
        self.scheduler.queue_microtask(Task::RestoreFocus {
            panel: entry.panel,
            toggle: entry.toggle,
        });
        self.emit(CardEventKind::CollapseEnd, card, true);
        tracing::debug!(card = card.index(), "collapse (immediate)");
    }

    /// Bump the generation and set the logical state. Returns the new
    /// generation.
    fn begin_transition(&mut self, card: NodeId, open: bool, animated: bool) -> u64 {
        match self.registry.get_mut(card) {
            Some(entry) => {
                entry.generation += 1;
                entry.is_open = open;
                entry.settling = animated;
                entry.generation
            }
            None => 0,
        }
    }

    fn is_current(&self, card: NodeId, generation: u64) -> bool {
        self.registry
            .get(card)
            .is_some_and(|e| e.generation == generation)
    }

    fn finish_settle(&mut self, card: NodeId) {
        if let Some(entry) = self.registry.get_mut(card) {
            entry.settling = false;
        }
    }

    /// Settled closed state: style, ARIA, class and labels.
    pub(crate) fn apply_closed_state(&mut self, card: NodeId) {
        let Some(entry) = self.registry.get(card).cloned() else {
            return;
        };
        let doc = &mut self.document;
        doc.set_style(entry.panel, "height", "0px");
        doc.set_style(entry.panel, "visibility", "hidden");
        doc.set_style(entry.panel, "pointer-events", "none");
        doc.set_attribute(entry.panel, "aria-hidden", "true");
        doc.set_attribute(entry.toggle, "aria-expanded", "false");
        doc.remove_class(card, markers::OPEN_CLASS);
        self.update_dynamic_labels(entry.toggle, false);
    }

    /// Settled open state without touching inline style.
    pub(crate) fn apply_open_state(&mut self, card: NodeId) {
        let Some(entry) = self.registry.get(card).cloned() else {
            return;
        };
        let doc = &mut self.document;
        doc.set_attribute(entry.toggle, "aria-expanded", "true");
        doc.add_class(card, markers::OPEN_CLASS);
        doc.remove_attribute(entry.panel, "aria-hidden");
        self.update_dynamic_labels(entry.toggle, true);
    }

    /// Swap `.card__toggle-dyn` text when the toggle declares both labels.
    fn update_dynamic_labels(&mut self, toggle: NodeId, open: bool) {
        let Some(label) = self
            .document
            .query_selector(toggle, &self.markers.dynamic_label)
        else {
            return;
        };
        let open_label = self.document.attribute(toggle, markers::LABEL_OPEN_ATTR);
        let closed_label = self.document.attribute(toggle, markers::LABEL_CLOSED_ATTR);
        if let (Some(open_label), Some(closed_label)) = (open_label, closed_label) {
            let text = if open { open_label } else { closed_label }.to_string();
            self.document.set_text(label, &text);
        }
    }

    pub(crate) fn run_task(&mut self, task: Task) {
        match task {
            Task::ExpandFrame {
                card,
                generation,
                target_height,
            } => {
                if !self.is_current(card, generation) {
                    return;
                }
                let Some(panel) = self.registry.get(card).map(|e| e.panel) else {
                    return;
                };
                self.document.offset_height(panel);
                self.document
                    .set_style(panel, "height", &format!("{}px", format_px(target_height)));
            }
            Task::ExpandSettle {
                card,
                generation,
                completion,
            } => {
                self.scheduler.resolve(completion);
                if !self.is_current(card, generation) {
                    tracing::debug!(card = card.index(), "discarding stale expand settle");
                    return;
                }
                let Some(panel) = self.registry.get(card).map(|e| e.panel) else {
                    return;
                };
                self.finish_settle(card);
                self.document.set_style(panel, "height", "auto");
                self.emit(CardEventKind::ExpandEnd, card, false);
            }
            Task::CollapseFrame { card, generation } => {
                if !self.is_current(card, generation) {
                    return;
                }
                let Some(panel) = self.registry.get(card).map(|e| e.panel) else {
                    return;
                };
                self.document.offset_height(panel);
                self.document.set_style(panel, "height", "0px");
            }
            Task::CollapseSettle {
                card,
                generation,
                completion,
            } => {
                self.scheduler.resolve(completion);
                if !self.is_current(card, generation) {
                    tracing::debug!(card = card.index(), "discarding stale collapse settle");
                    return;
                }
                let Some(entry) = self.registry.get(card).cloned() else {
                    return;
                };
                self.finish_settle(card);
                self.apply_closed_state(card);
                self.scheduler.queue_microtask(Task::RestoreFocus {
                    panel: entry.panel,
                    toggle: entry.toggle,
                });
                self.emit(CardEventKind::CollapseEnd, card, false);
            }
            Task::RestoreFocus { panel, toggle } => {
                if self
                    .document
                    .active_element()
                    .is_some_and(|active| self.document.contains(panel, active))
                {
                    self.document.focus(toggle);
                }
            }
        }
    }
}

/// `120.0` → `"120"`, `120.5` → `"120.5"`.
fn format_px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
