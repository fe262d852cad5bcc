//! Accordion coordination for exclusive groups.
//!
//! A group is not stored anywhere: it is the nearest `[data-accordion-group]`
//! ancestor of a card, and its members are the registered cards beneath it.
//! With `enable_exclusive_groups` on, expanding a card first force-closes
//! every other open member through the immediate path, so their
//! `collapse-start`/`collapse-end` pairs precede the card's `expand-start`.
//! Each sibling is closed on its own; one that is no longer registered is
//! skipped and the expand goes ahead regardless.

use crate::controller::{CardRef, Controller};
use crate::dom::NodeId;

impl Controller {
    /// The group container of `card`, if any.
    pub fn group_of<'a>(&self, card: impl Into<CardRef<'a>>) -> Option<NodeId> {
        let card = self.resolve(card)?;
        self.document.closest(card, &self.markers.group)
    }

    /// Registered cards under `group`, in document order.
    pub fn group_cards(&self, group: NodeId) -> Vec<NodeId> {
        self.document
            .query_selector_all(group, &self.markers.card)
            .into_iter()
            .filter(|c| self.registry.contains(*c))
            .collect()
    }

    /// Force-close the open peers of `card`. Returns the cards closed.
    pub(crate) fn close_open_siblings(&mut self, card: NodeId) -> Vec<NodeId> {
        let Some(group) = self.group_of(card) else {
            return Vec::new();
        };
        let open: Vec<NodeId> = self
            .group_cards(group)
            .into_iter()
            .filter(|c| *c != card && self.registry.is_open(*c) == Some(true))
            .collect();

        if !open.is_empty() {
            tracing::debug!(
                card = card.index(),
                group = group.index(),
                closing = open.len(),
                "accordion: closing open siblings"
            );
        }
        for sibling in &open {
            self.force_close_immediate(*sibling);
        }
        open
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::InitOptions;
    use crate::events::CardEventKind;
    use crate::test_helpers::*;

    const EXCLUSIVE: InitOptions = InitOptions {
        enable_exclusive_groups: true,
    };

    fn two_card_group() -> String {
        page(&[group_markup(
            "g",
            &[card_markup("a", true, 60), card_markup("b", false, 90)],
        )])
    }

    #[test]
    fn siblings_close_immediately_before_expand_start() {
        let mut ctl = controller(&two_card_group(), false);
        ctl.initialize(None, EXCLUSIVE);
        let a = ctl.resolve("a").unwrap();
        let b = ctl.resolve("b").unwrap();
        let log = record_events(&mut ctl);

        let done = ctl.expand(b);
        {
            let log = log.borrow();
            let seen: Vec<_> = log.iter().map(|e| (e.kind, e.card, e.immediate)).collect();
            assert_eq!(
                seen,
                vec![
                    (CardEventKind::CollapseStart, a, true),
                    (CardEventKind::CollapseEnd, a, true),
                    (CardEventKind::ExpandStart, b, false),
                ]
            );
        }
        ctl.wait(done);
        assert_eq!(ctl.is_open(a), Some(false));
        assert_eq!(ctl.is_open(b), Some(true));
    }

    #[test]
    fn at_most_one_open_after_every_expand() {
        let markup = page(&[group_markup(
            "g",
            &[
                card_markup("a", false, 10),
                card_markup("b", false, 10),
                card_markup("c", false, 10),
            ],
        )]);
        let mut ctl = controller(&markup, false);
        ctl.initialize(None, EXCLUSIVE);
        let group = ctl.resolve("#g").unwrap();

        for id in ["a", "c", "b", "a", "a", "c"] {
            let done = ctl.expand(id);
            ctl.wait(done);
            let open = ctl
                .group_cards(group)
                .into_iter()
                .filter(|c| ctl.is_open(*c) == Some(true))
                .count();
            assert_eq!(open, 1, "after expanding {id}");
        }
    }

    #[test]
    fn disabled_exclusivity_leaves_siblings_open() {
        let mut ctl = controller(&two_card_group(), false);
        ctl.initialize(None, InitOptions::default());
        let done = ctl.expand("b");
        ctl.wait(done);
        assert_eq!(ctl.is_open("a"), Some(true));
        assert_eq!(ctl.is_open("b"), Some(true));
    }

    #[test]
    fn other_groups_are_untouched() {
        let markup = page(&[
            group_markup("g1", &[card_markup("a", true, 10)]),
            group_markup("g2", &[card_markup("b", false, 10)]),
            card_markup("loose", true, 10),
        ]);
        let mut ctl = controller(&markup, false);
        ctl.initialize(None, EXCLUSIVE);
        let done = ctl.expand("b");
        ctl.wait(done);
        assert_eq!(ctl.is_open("a"), Some(true));
        assert_eq!(ctl.is_open("loose"), Some(true));
    }

    #[test]
    fn sibling_mid_expand_is_closed_and_its_settle_discarded() {
        let markup = page(&[group_markup(
            "g",
            &[card_markup("a", false, 60), card_markup("b", false, 90)],
        )]);
        let mut ctl = controller(&markup, false);
        ctl.initialize(None, EXCLUSIVE);
        let a = ctl.resolve("a").unwrap();

        let _ = ctl.expand(a);
        ctl.advance(20);
        let _ = ctl.expand("b");
        ctl.run_until_idle();

        let state = ctl.card_state(a).unwrap();
        assert!(!state.is_open);
        assert_eq!(state.height, "0px");
        assert_eq!(state.aria_hidden.as_deref(), Some("true"));
    }

    #[test]
    fn group_lookup() {
        let mut ctl = controller(&two_card_group(), false);
        ctl.initialize(None, EXCLUSIVE);
        let group = ctl.resolve("#g").unwrap();
        assert_eq!(ctl.group_of("a"), Some(group));
        assert_eq!(
            ctl.group_cards(group),
            vec![ctl.resolve("a").unwrap(), ctl.resolve("b").unwrap()]
        );
    }
}
