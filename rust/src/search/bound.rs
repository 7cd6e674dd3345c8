//! Best-known bound shared by every search unit, and the monitoring snapshot.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::Cost;
use crate::schedule::Schedule;

/// Monotone "improve-if-better" cell holding the best complete schedule.
///
/// The cost is mirrored in an atomic so pruning never waits on the lock.
/// Writers re-check the cost under the lock, so no improvement is lost.
#[derive(Debug)]
pub struct SharedBound {
    cost: AtomicU32,
    best: Mutex<Option<Schedule>>,
}

impl SharedBound {
    pub fn new() -> Self {
        Self {
            cost: AtomicU32::new(Cost::MAX),
            best: Mutex::new(None),
        }
    }

    /// Latest known best cost (`Cost::MAX` until a schedule is known).
    #[inline]
    pub fn current(&self) -> Cost {
        self.cost.load(Ordering::Acquire)
    }

    /// Install `schedule` if it is strictly better than the current best.
    pub fn improve(&self, schedule: &Schedule) -> bool {
        let cost = schedule.end_time();
        if cost >= self.current() {
            return false;
        }

        let mut best = self.lock();
        if cost >= self.cost.load(Ordering::Acquire) {
            return false;
        }
        *best = Some(schedule.clone());
        self.cost.store(cost, Ordering::Release);
        true
    }

    /// Consistent copy of the best cost and schedule.
    pub fn best(&self) -> Option<(Cost, Schedule)> {
        let best = self.lock();
        best.as_ref()
            .map(|schedule| (self.cost.load(Ordering::Acquire), schedule.clone()))
    }

    fn reset(&self) {
        let mut best = self.lock();
        *best = None;
        self.cost.store(Cost::MAX, Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, Option<Schedule>> {
        // the guarded value is replaced whole, so a poisoned lock is still valid
        self.best.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedBound {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a running search.
#[derive(Clone, Debug)]
pub struct SearchSnapshot {
    pub best_cost: Option<Cost>,
    pub best_schedule: Option<Schedule>,
    pub active_units: usize,
    pub completed_units: usize,
    pub frontier_size: usize,
    pub expanded: u64,
    pub pruned: u64,
}

/// Live state of a search, safe to read from any thread while it runs.
#[derive(Debug, Default)]
pub struct SearchMonitor {
    bound: SharedBound,
    active_units: AtomicUsize,
    completed_units: AtomicUsize,
    frontier_size: AtomicUsize,
    expanded: AtomicU64,
    pruned: AtomicU64,
    timed_out: AtomicBool,
}

impl SearchMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self) -> &SharedBound {
        &self.bound
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let best = self.bound.best();
        SearchSnapshot {
            best_cost: best.as_ref().map(|(cost, _)| *cost),
            best_schedule: best.map(|(_, schedule)| schedule),
            active_units: self.active_units.load(Ordering::Acquire),
            completed_units: self.completed_units.load(Ordering::Relaxed),
            frontier_size: self.frontier_size.load(Ordering::Acquire),
            expanded: self.expanded.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
        }
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.bound.reset();
        self.active_units.store(0, Ordering::Relaxed);
        self.completed_units.store(0, Ordering::Relaxed);
        self.frontier_size.store(0, Ordering::Relaxed);
        self.expanded.store(0, Ordering::Relaxed);
        self.pruned.store(0, Ordering::Relaxed);
        self.timed_out.store(false, Ordering::Relaxed);
    }

    pub(crate) fn set_frontier_size(&self, size: usize) {
        self.frontier_size.store(size, Ordering::Release);
    }

    /// Published after the frontier size, so a reader that sees an active
    /// unit also sees the frontier it belongs to.
    pub(crate) fn unit_started(&self) {
        self.active_units.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn unit_finished(&self) {
        self.active_units.fetch_sub(1, Ordering::Relaxed);
        self.completed_units.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_work(&self, expanded: u64, pruned: u64) {
        self.expanded.fetch_add(expanded, Ordering::Relaxed);
        self.pruned.fetch_add(pruned, Ordering::Relaxed);
    }

    pub(crate) fn mark_timed_out(&self) {
        self.timed_out.store(true, Ordering::Relaxed);
    }
}
