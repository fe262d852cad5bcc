//! Keyboard handling for card toggles.
//!
//! `Enter` and `Space` activate the focused toggle. Inside a group container
//! the arrow keys, `Home` and `End` move focus between the group's toggles
//! (wrapping at both ends) without opening or closing anything. Outside a
//! group those keys are not handled and keep their default behaviour.

use crate::controller::Controller;
use crate::dom::NodeId;
use crate::scheduler::Completion;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    ArrowDown,
    ArrowUp,
    Home,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported key `{0}`")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    /// Accepts `KeyboardEvent.key` values, plus `Space`/`Spacebar`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Enter" => Ok(Key::Enter),
            " " | "Space" | "Spacebar" => Ok(Key::Space),
            "ArrowDown" => Ok(Key::ArrowDown),
            "ArrowUp" => Ok(Key::ArrowUp),
            "Home" => Ok(Key::Home),
            "End" => Ok(Key::End),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    /// The key was handled and its default action (scrolling) suppressed.
    pub default_prevented: bool,
    /// Set when the key toggled a card.
    pub activation: Option<Completion>,
    /// Set when focus moved to another toggle.
    pub focused: Option<NodeId>,
}

impl Controller {
    /// Handle a key press whose target is `target` (normally the focused
    /// toggle).
    pub fn key_down(&mut self, target: NodeId, key: Key) -> KeyOutcome {
        let Some(card) = self.card_for_activation(target) else {
            return KeyOutcome::default();
        };

        let next = match key {
            Key::Enter | Key::Space => {
                self.print.user_interacted = true;
                return KeyOutcome {
                    default_prevented: true,
                    activation: Some(self.toggle(card)),
                    focused: None,
                };
            }
            Key::ArrowDown | Key::ArrowUp | Key::Home | Key::End => {
                let Some(group) = self.group_of(card) else {
                    return KeyOutcome::default();
                };
                let cards = self.group_cards(group);
                let Some(current) = cards.iter().position(|c| *c == card) else {
                    return KeyOutcome::default();
                };
                let last = cards.len() - 1;
                let index = match key {
                    Key::ArrowDown => (current + 1) % cards.len(),
                    Key::ArrowUp => current.checked_sub(1).unwrap_or(last),
                    Key::Home => 0,
                    _ => last,
                };
                cards[index]
            }
        };

        let Some(toggle) = self.registry.get(next).map(|e| e.toggle) else {
            return KeyOutcome::default();
        };
        self.document.focus(toggle);
        KeyOutcome {
            default_prevented: true,
            activation: None,
            focused: Some(toggle),
        }
    }
}
