//! Print snapshot and restore.
//!
//! `beforeprint` snapshots every registered card and forces closed panels
//! visible so the printout shows all content. The override is presentation
//! only: `is_open` is not touched.
//!
//! `afterprint` puts things back unless a toggle was activated in between
//! (a click or Enter/Space), in which case the user's choice stands and
//! nothing is restored. For each card whose live `is_open` no longer matches
//! the snapshot, the normal expand or immediate collapse path brings it
//! back; every other card gets its snapshotted style and `aria-hidden`
//! values written back verbatim.
//!
//! A card caught mid-transition is snapshotted with the values its
//! transition settles on, not the in-between values on the page. Restoring
//! those verbatim keeps `aria-hidden` the complement of `is_open`.
//!
//! The snapshot is taken out of the controller before any restore work
//! starts, so it is gone after `after_print` no matter how that returns.

use crate::controller::Controller;
use crate::dom::NodeId;
use crate::scheduler::Completion;
use indexmap::IndexMap;
use serde::Serialize;

/// Pre-print state of one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintSnapshot {
    pub is_open: bool,
    pub height: String,
    pub visibility: String,
    pub pointer_events: String,
    pub aria_hidden: Option<String>,
}

impl PrintSnapshot {
    /// Where an unsettled transition toward `is_open` ends up.
    fn settled(is_open: bool) -> Self {
        if is_open {
            Self {
                is_open,
                height: "auto".to_string(),
                visibility: "visible".to_string(),
                pointer_events: "auto".to_string(),
                aria_hidden: None,
            }
        } else {
            Self {
                is_open,
                height: "0px".to_string(),
                visibility: "hidden".to_string(),
                pointer_events: "none".to_string(),
                aria_hidden: Some("true".to_string()),
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PrintState {
    snapshots: IndexMap<NodeId, PrintSnapshot>,
    /// Set by toggle activations, reset at `beforeprint`.
    pub(crate) user_interacted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintRestore {
    /// A toggle was activated during printing; nothing was restored.
    SkippedUserInteracted,
    Restored {
        /// Cards whose style/ARIA values were written back verbatim.
        verbatim: Vec<NodeId>,
        /// Cards driven back through expand or immediate collapse, with the
        /// completion of each transition.
        transitioned: Vec<(NodeId, Completion)>,
    },
}

impl Controller {
    /// Handle `beforeprint`. Returns how many closed panels were revealed.
    pub fn before_print(&mut self) -> usize {
        self.print.user_interacted = false;
        self.print.snapshots.clear();

        let mut revealed = 0;
        let cards: Vec<_> = self
            .registry
            .iter()
            .map(|(card, entry)| (card, entry.panel, entry.is_open, entry.settling))
            .collect();
        for (card, panel, is_open, settling) in cards {
            let doc = &mut self.document;
            let snapshot = if settling {
                PrintSnapshot::settled(is_open)
            } else {
                PrintSnapshot {
                    is_open,
                    height: doc.style(panel, "height").to_string(),
                    visibility: doc.style(panel, "visibility").to_string(),
                    pointer_events: doc.style(panel, "pointer-events").to_string(),
                    aria_hidden: doc.attribute(panel, "aria-hidden").map(str::to_string),
                }
            };
            self.print.snapshots.insert(card, snapshot);

            if !is_open {
                doc.set_style(panel, "height", "auto");
                doc.set_style(panel, "visibility", "visible");
                doc.set_style(panel, "pointer-events", "auto");
                doc.remove_attribute(panel, "aria-hidden");
                revealed += 1;
            }
        }

        tracing::debug!(
            cards = self.print.snapshots.len(),
            revealed,
            "beforeprint: snapshot taken, closed panels revealed"
        );
        revealed
    }

    /// Handle `afterprint`.
    pub fn after_print(&mut self) -> PrintRestore {
        let snapshots = std::mem::take(&mut self.print.snapshots);

        if self.print.user_interacted {
            tracing::debug!("afterprint: user interacted, keeping current state");
            return PrintRestore::SkippedUserInteracted;
        }

        let mut verbatim = Vec::new();
        let mut transitioned = Vec::new();
        for (card, snapshot) in snapshots {
            let Some(entry) = self.registry.get(card).cloned() else {
                continue;
            };

            if entry.is_open != snapshot.is_open {
                let completion = if snapshot.is_open {
                    self.expand(card)
                } else {
                    self.collapse_with(card, false)
                };
                transitioned.push((card, completion));
                continue;
            }

            let doc = &mut self.document;
            doc.set_style(entry.panel, "height", &snapshot.height);
            doc.set_style(entry.panel, "visibility", &snapshot.visibility);
            doc.set_style(entry.panel, "pointer-events", &snapshot.pointer_events);
            match &snapshot.aria_hidden {
                Some(value) => doc.set_attribute(entry.panel, "aria-hidden", value),
                None => doc.remove_attribute(entry.panel, "aria-hidden"),
            }
            verbatim.push(card);
        }

        tracing::debug!(
            verbatim = verbatim.len(),
            transitioned = transitioned.len(),
            "afterprint: restored"
        );
        PrintRestore::Restored {
            verbatim,
            transitioned,
        }
    }

    pub fn user_interacted_during_print(&self) -> bool {
        self.print.user_interacted
    }

    /// The pending snapshot of `card`, between `beforeprint` and `afterprint`.
    pub fn print_snapshot(&self, card: NodeId) -> Option<&PrintSnapshot> {
        self.print.snapshots.get(&card)
    }

    pub fn print_snapshot_len(&self) -> usize {
        self.print.snapshots.len()
    }
}
