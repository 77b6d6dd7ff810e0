//
// trailcp is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License  v3
// as published by the Free Software Foundation.
//
// mini-cp is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY.
// See the GNU Lesser General Public License  for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with mini-cp. If not, see http://www.gnu.org/licenses/lgpl-3.0.en.html
//
// Copyright (c)  2022 by X. Gillard
//

//! This module provides the delta logs and the delta monitors.
//!
//! Every set and graph variable owns an append only log of the changes made
//! to its domain. A propagator does not read that log directly: it goes
//! through a `DeltaMonitor` which remembers how far the propagator has
//! already consumed the log. A drain always follows the same protocol:
//!
//! 1. `freeze` snapshots the current end of the log,
//! 2. `for_each_element` / `for_each_arc` replay the entries between the
//!    drain position and the frozen end (any number of times),
//! 3. `unfreeze` moves the drain position to the frozen end.
//!
//! The callbacks receive the domain store, so they may narrow other
//! variables (or even the monitored one). The entries appended meanwhile lie
//! past the frozen end and are only seen after the next freeze.
//!
//! The logs are cleared by the engine whenever the deltas become meaningless
//! (fixpoint, failure, rollback). Each clear bumps the store's delta epoch,
//! which is how a monitor notices it must restart from the beginning of the
//! log.

use crate::{trailcp_assert_simple, CPResult, Cause, DomainEvent, DomainStore, PropagatorId, Variable};

/// One change in the domain of a set or graph variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeltaEntry {
    /// What happened
    pub event: DomainEvent,
    /// The value, node or arc source the change bore on
    pub first: usize,
    /// The arc destination (only meaningful for arc events)
    pub second: usize,
    /// Who made the change
    pub cause: Cause,
}

/// The change log of one variable
#[derive(Debug, Clone, Default)]
pub struct DeltaLog {
    entries: Vec<DeltaEntry>,
}
impl DeltaLog {
    /// Appends an entry at the end of the log
    pub fn push(&mut self, entry: DeltaEntry) {
        self.entries.push(entry)
    }
    /// Returns the number of entries in the log
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    /// Returns true iff the log has no entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Returns the entry at position `i`
    pub fn get(&self, i: usize) -> DeltaEntry {
        self.entries[i]
    }
    /// Forgets all entries
    pub fn clear(&mut self) {
        self.entries.clear()
    }
}

/// The view a propagator has on the delta log of one variable
#[derive(Debug, Clone)]
pub struct DeltaMonitor {
    /// The monitored variable
    variable: Variable,
    /// The propagator owning this monitor. Its own modifications are never
    /// replayed to it.
    owner: PropagatorId,
    /// The delta epoch of the store when the drain position was last valid
    epoch: usize,
    /// Entries before this position have already been consumed
    drained: usize,
    /// The end of the log at the time of the freeze (when frozen)
    frozen: Option<usize>,
}

impl DeltaMonitor {
    /// Creates a monitor of `variable` on behalf of the propagator `owner`
    pub fn new(variable: Variable, owner: PropagatorId) -> Self {
        Self {
            variable,
            owner,
            epoch: usize::MAX,
            drained: 0,
            frozen: None,
        }
    }
    /// Returns the monitored variable
    pub fn variable(&self) -> Variable {
        self.variable
    }
    /// Returns true iff the monitor is between a freeze and an unfreeze
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }
    /// Snapshots the end of the log.
    ///
    /// # Panics
    /// When the monitor is already frozen
    pub fn freeze(&mut self, store: &dyn DomainStore) {
        assert!(
            self.frozen.is_none(),
            "delta monitor of {:?} frozen twice",
            self.variable
        );
        let epoch = store.delta_epoch();
        if epoch != self.epoch {
            self.epoch = epoch;
            self.drained = 0;
        }
        self.frozen = Some(store.delta(self.variable).len());
    }
    /// Moves the drain position to the frozen end of the log.
    ///
    /// # Panics
    /// When the monitor is not frozen
    pub fn unfreeze(&mut self) {
        match self.frozen.take() {
            Some(end) => self.drained = end,
            None => panic!("delta monitor of {:?} unfrozen without freeze", self.variable),
        }
    }
    /// Calls `f` with each value (or node) which underwent `event` since the
    /// last drain, in the order the changes happened.
    ///
    /// # Panics
    /// When the monitor is not frozen
    pub fn for_each_element<F>(
        &self,
        store: &mut dyn DomainStore,
        event: DomainEvent,
        mut f: F,
    ) -> CPResult<()>
    where
        F: FnMut(&mut dyn DomainStore, usize) -> CPResult<()>,
    {
        self.for_each_entry(store, event, |store, entry| f(store, entry.first))
    }
    /// Calls `f` with the endpoints of each arc which underwent `event` since
    /// the last drain, in the order the changes happened.
    ///
    /// # Panics
    /// When the monitor is not frozen
    pub fn for_each_arc<F>(
        &self,
        store: &mut dyn DomainStore,
        event: DomainEvent,
        mut f: F,
    ) -> CPResult<()>
    where
        F: FnMut(&mut dyn DomainStore, usize, usize) -> CPResult<()>,
    {
        self.for_each_entry(store, event, |store, entry| {
            f(store, entry.first, entry.second)
        })
    }

    fn for_each_entry<F>(&self, store: &mut dyn DomainStore, event: DomainEvent, mut f: F) -> CPResult<()>
    where
        F: FnMut(&mut dyn DomainStore, DeltaEntry) -> CPResult<()>,
    {
        let end = match self.frozen {
            Some(end) => end,
            None => panic!("delta monitor of {:?} drained without freeze", self.variable),
        };
        trailcp_assert_simple!(
            store.delta_epoch() == self.epoch,
            "delta log of {:?} cleared while its monitor was frozen",
            self.variable
        );

        let own = Cause::Propagator(self.owner);
        for i in self.drained..end {
            // the callback may append to the log, hence the copy
            let entry = store.delta(self.variable).get(i);
            if entry.event == event && entry.cause != own {
                f(store, entry)?;
            }
        }
        Ok(())
    }
}
