//! # card-expandable
//!
//! A headless controller for expandable content cards: a toggle button
//! reveals or hides a panel with a height animation, keeps ARIA state in
//! step, optionally behaves as an accordion within a group, supports
//! keyboard navigation, honours a reduced-motion preference, and shows all
//! content while printing.
//!
//! # Architecture
//!
//! The page is an in-memory [`dom::Document`] loaded from XHTML. A
//! [`controller::Controller`] owns the document together with every piece of
//! mutable state, and drives transitions on a cooperative event loop with a
//! virtual clock:
//!
//! ```text
//! XHTML ──parse──▶ Document ──initialize──▶ Registry
//!                      ▲                        │
//!                      │ style / ARIA writes    ▼
//!                  Scheduler ◀── frames, timers ── expand / collapse
//!                                                   │
//!                                                   ▼
//!                                               EventBus ──▶ listeners
//! ```
//!
//! Every state-changing call returns a [`scheduler::Completion`] that
//! resolves when the transition settles. Nothing blocks: callers pump the
//! loop with [`controller::Controller::advance`],
//! [`controller::Controller::wait`] or
//! [`controller::Controller::run_until_idle`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dom`] | Arena document, compound selectors, XHTML loading |
//! | [`registry`] | Card identity, markup markers, logical open state |
//! | [`scheduler`] | Microtask, frame and timer queues on a virtual clock |
//! | [`motion`] | Duration tokens and the reduced-motion preference |
//! | [`events`] | The four lifecycle notifications and their bus |
//! | [`controller`] | Initialization, reference resolution, loop pumping, lifecycle |
//! | [`transition`] | Expand / collapse / toggle with generation-guarded settles |
//! | [`accordion`] | Exclusive groups |
//! | [`keyboard`] | Enter/Space activation and roving focus |
//! | [`print`] | Print snapshot and restore |
//! | [`event_log`] | Event recording with ARIA state at dispatch |
//! | [`scenario`] | TOML-scripted interaction runs |
//! | [`config`] | Layered `config.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Logical State Flips Early
//!
//! `is_open` changes the moment a transition starts, so a second `expand`
//! during an opening animation is a no-op and `toggle` always reverses the
//! latest intent. Visual and ARIA state catch up when the transition
//! settles.
//!
//! ## Generations Instead Of Cancellation
//!
//! Timers are never cancelled. Each transition bumps a per-card generation
//! and settle work checks it before writing, which makes a stale settle a
//! cheap no-op while its completion still resolves.
//!
//! ## One Owner, No Globals
//!
//! Registry, print snapshot and motion cache all live on the controller.
//! Tests build as many controllers as they like and
//! [`controller::Controller::reset`] restores a fresh state.

pub mod accordion;
pub mod config;
pub mod controller;
pub mod dom;
pub mod event_log;
pub mod events;
pub mod keyboard;
pub mod motion;
pub mod output;
pub mod print;
pub mod registry;
pub mod scenario;
pub mod scheduler;
pub mod transition;

pub use controller::{CardRef, CardState, Controller, InitOptions};
pub use events::{CardEvent, CardEventKind};
pub use scheduler::Completion;

#[cfg(test)]
pub(crate) mod test_helpers;
