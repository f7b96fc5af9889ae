//! This module contains the two timer sources the engine is driven by: the periodic ticker that
//! accumulates elapsed time, and the set of pending delayed removals that finish a target's
//! fade-out.
//!
//! Both run on the engine's logical clock, so nothing here ever sleeps or spawns. The engine asks
//! each source when it is next due and fires it from `GameEngine::advance()`.

use std::collections::BTreeMap;
use std::time::Duration;

/// This struct identifies a single scheduled removal. Identifiers are handed out in increasing
/// order and never reused within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct RemovalId(u64);

/// This struct holds a removal that came due and was taken out of the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Removal {
    /// This field contains the logical instant at which the removal was due.
    pub(crate) due: Duration,
    /// This field contains the handle the removal was scheduled under.
    pub(crate) handle: RemovalId,
    /// This field contains the id of the target to take off the field.
    pub(crate) target: u32,
}

/// This struct owns every outstanding delayed removal. Dropping a handle out of this set is the
/// only way to cancel it, and a dropped handle never fires.
#[derive(Debug, Default)]
pub(crate) struct PendingRemovals {
    /// This field contains the identifier the next scheduled removal will receive.
    next_id: u64,
    /// This field contains the scheduled removals ordered by due time, then by scheduling order.
    pending: BTreeMap<(Duration, RemovalId), u32>,
}

impl PendingRemovals {
    /// This function drains the whole set and returns how many removals were canceled.
    pub(crate) fn cancel_all(&mut self) -> usize {
        let canceled = self.pending.len();
        self.pending.clear();
        canceled
    }

    /// This function returns the number of removals still waiting to fire.
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// This function returns the logical instant of the earliest pending removal, if any.
    pub(crate) fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|&(due, _)| due)
    }

    /// This function takes the earliest pending removal out of the set.
    pub(crate) fn pop_next(&mut self) -> Option<Removal> {
        self.pending
            .pop_first()
            .map(|((due, handle), target)| Removal {
                due,
                handle,
                target,
            })
    }

    /// This function schedules the removal of `target` at the logical instant `due`.
    pub(crate) fn schedule(&mut self, due: Duration, target: u32) -> RemovalId {
        let handle = RemovalId(self.next_id);
        self.next_id += 1;

        // handles are fresh, so the key can never collide with an existing entry
        let _ = self.pending.insert((due, handle), target);
        handle
    }
}

/// This struct is the periodic elapsed-time source. It is either running, with the instant of its
/// next tick, or stopped.
#[derive(Debug)]
pub(crate) struct Ticker {
    /// This field contains the instant of the next tick while the ticker runs.
    next_due: Option<Duration>,
    /// This field contains the interval between two ticks.
    period: Duration,
}

impl Ticker {
    /// This function moves the next tick one period forward after a tick has been applied.
    pub(crate) fn fire(&mut self) {
        self.next_due = self.next_due.map(|due| due + self.period);
    }

    /// This function creates a stopped ticker with the given period.
    pub(crate) const fn new(period: Duration) -> Self {
        Self {
            next_due: None,
            period,
        }
    }

    /// This function returns the instant of the next tick, or `None` while stopped.
    pub(crate) const fn next_due(&self) -> Option<Duration> {
        self.next_due
    }

    /// This function (re)starts the ticker so that its first tick lands one period after `now`.
    pub(crate) fn start(&mut self, now: Duration) {
        self.next_due = Some(now + self.period);
    }

    /// This function stops the ticker.
    pub(crate) fn stop(&mut self) {
        self.next_due = None;
    }
}
