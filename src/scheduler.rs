//! Cooperative event loop with a virtual clock.
//!
//! Transitions suspend in exactly two ways: waiting for the next rendering
//! opportunity (an animation frame) and waiting for a timer equal to the
//! motion duration. Focus rescue after an immediate collapse waits for a
//! microtask. The scheduler only queues [`Task`]s; the controller pumps them,
//! since every task needs mutable access to the document and registry.
//!
//! Ordering within one pump:
//!
//! 1. microtasks, until the queue is empty
//! 2. one rendering opportunity: every frame callback queued *before* it
//!    started (callbacks requested while it runs wait for the next frame)
//! 3. timers in `(due, insertion)` order, each followed by steps 1-2
//!
//! The clock moves only when a timer fires or an `advance` deadline is
//! reached. Nothing here blocks.

use crate::dom::NodeId;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

/// Identity of one pending completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompletionId(u64);

/// Deferred completion returned by every state-changing call.
///
/// Resolved immediately for no-ops and immediate collapses; otherwise
/// resolved when the transition's settle step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a completion reports when the transition settles"]
pub struct Completion(Option<CompletionId>);

impl Completion {
    pub fn ready() -> Self {
        Self(None)
    }

    pub fn id(&self) -> Option<CompletionId> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Task {
    /// Second half of the expand height write: force layout, then set the
    /// measured target height.
    ExpandFrame {
        card: NodeId,
        generation: u64,
        target_height: f64,
    },
    ExpandSettle {
        card: NodeId,
        generation: u64,
        completion: CompletionId,
    },
    /// Second half of the collapse height write: force layout, then 0.
    CollapseFrame { card: NodeId, generation: u64 },
    CollapseSettle {
        card: NodeId,
        generation: u64,
        completion: CompletionId,
    },
    /// Move focus back to the toggle if it is still inside the hidden panel.
    RestoreFocus { panel: NodeId, toggle: NodeId },
}

#[derive(Debug)]
struct Timer {
    due: u64,
    seq: u64,
    task: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl Eq for Timer {}

impl Ord for Timer {
    // Reversed: BinaryHeap is a max-heap and the earliest timer must win.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    seq: u64,
    microtasks: VecDeque<Task>,
    frames: Vec<Task>,
    timers: BinaryHeap<Timer>,
    next_completion: u64,
    pending: HashSet<CompletionId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub(crate) fn queue_microtask(&mut self, task: Task) {
        self.microtasks.push_back(task);
    }

    pub(crate) fn pop_microtask(&mut self) -> Option<Task> {
        self.microtasks.pop_front()
    }

    pub(crate) fn request_animation_frame(&mut self, task: Task) {
        self.frames.push(task);
    }

    /// Callbacks for the rendering opportunity that starts now.
    pub(crate) fn take_frame(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.frames)
    }

    pub(crate) fn set_timeout(&mut self, task: Task, delay_ms: u64) {
        self.seq += 1;
        self.timers.push(Timer {
            due: self.now.saturating_add(delay_ms),
            seq: self.seq,
            task,
        });
    }

    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.peek().map(|t| t.due)
    }

    /// Pop the earliest timer if it is due by `deadline`, moving the clock
    /// to its due time.
    pub(crate) fn pop_timer_due_by(&mut self, deadline: u64) -> Option<Task> {
        if self.timers.peek()?.due > deadline {
            return None;
        }
        let timer = self.timers.pop()?;
        self.now = self.now.max(timer.due);
        Some(timer.task)
    }

    pub(crate) fn advance_clock_to(&mut self, time: u64) {
        self.now = self.now.max(time);
    }

    pub fn has_pending_work(&self) -> bool {
        !self.microtasks.is_empty() || !self.frames.is_empty() || !self.timers.is_empty()
    }

    pub(crate) fn new_completion(&mut self) -> (Completion, CompletionId) {
        self.next_completion += 1;
        let id = CompletionId(self.next_completion);
        self.pending.insert(id);
        (Completion(Some(id)), id)
    }

    pub(crate) fn resolve(&mut self, id: CompletionId) {
        self.pending.remove(&id);
    }

    pub fn is_resolved(&self, completion: &Completion) -> bool {
        completion.0.is_none_or(|id| !self.pending.contains(&id))
    }

    /// Drop all queued work and resolve every pending completion. The clock
    /// keeps its value.
    pub(crate) fn clear(&mut self) {
        self.microtasks.clear();
        self.frames.clear();
        self.timers.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus_task(n: usize) -> Task {
        let mut doc = crate::dom::Document::new();
        let mut last = doc.root();
        for _ in 0..n {
            last = doc.create_element("div");
        }
        Task::RestoreFocus {
            panel: last,
            toggle: last,
        }
    }

    #[test]
    fn timers_fire_by_due_time_then_insertion_order() {
        let mut s = Scheduler::new();
        s.set_timeout(focus_task(1), 200);
        s.set_timeout(focus_task(2), 50);
        s.set_timeout(focus_task(3), 50);

        assert_eq!(s.pop_timer_due_by(40), None);
        assert_eq!(s.pop_timer_due_by(500), Some(focus_task(2)));
        assert_eq!(s.now(), 50);
        assert_eq!(s.pop_timer_due_by(500), Some(focus_task(3)));
        assert_eq!(s.pop_timer_due_by(500), Some(focus_task(1)));
        assert_eq!(s.now(), 200);
        assert!(!s.has_pending_work());
    }

    #[test]
    fn timer_due_saturates_at_end_of_time() {
        let mut s = Scheduler::new();
        s.advance_clock_to(u64::MAX - 10);
        s.set_timeout(focus_task(1), 200);
        assert_eq!(s.next_timer_due(), Some(u64::MAX));
        assert_eq!(s.pop_timer_due_by(u64::MAX), Some(focus_task(1)));
    }

    #[test]
    fn frames_requested_during_a_frame_wait_for_the_next_one() {
        let mut s = Scheduler::new();
        s.request_animation_frame(focus_task(1));
        let frame = s.take_frame();
        s.request_animation_frame(focus_task(2));
        assert_eq!(frame, vec![focus_task(1)]);
        assert_eq!(s.take_frame(), vec![focus_task(2)]);
    }

    #[test]
    fn completions_resolve_individually() {
        let mut s = Scheduler::new();
        let (a, a_id) = s.new_completion();
        let (b, _) = s.new_completion();
        assert!(!s.is_resolved(&a));
        s.resolve(a_id);
        assert!(s.is_resolved(&a));
        assert!(!s.is_resolved(&b));
        assert!(s.is_resolved(&Completion::ready()));
        s.clear();
        assert!(s.is_resolved(&b));
    }
}
