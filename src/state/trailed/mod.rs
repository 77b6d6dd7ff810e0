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

//! This module defines the data structures and utilities that are used to
//! save and restore data from the solver trail.
//!
//! The trail is an arena of undo records. Each saved level remembers the
//! length of the trail at the moment it was opened; restoring a level replays
//! the records above that length from the newest to the oldest and then
//! drops them. A record is only pushed the first time a cell is modified
//! within a given level (see the `clock` field), but restoring newest first
//! means duplicates would be harmless anyway.
use super::*;

mod bounded_set;
mod sparse_set;

pub use bounded_set::*;
pub use sparse_set::*;

//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~ TRAIL DATA ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// This structure keeps track of the information about one given level: the
/// length of its trail and the count of each kind of resources that are managed
/// by the state manager
#[derive(Debug, Clone, Copy, Default)]
struct Level {
    /// the length of the trail at the moment this layer was started
    trail_size: usize,
    /// the value of the clock when this level was opened
    clock: usize,

    /// how many integers have already been recorded ? (note: booleans are
    /// simply mapped onto integers)
    integers: usize,

    /// how many sparse sets have already been recorded ?
    sparse_sets: usize,
    /// length of the sparse sets data
    sparse_set_data: usize,

    /// how many bounded sets have already been recorded ?
    bounded_sets: usize,
    /// length of the bounded sets data
    bounded_set_data: usize,
}

/// An entry that is used to save/restore data from the trail
#[derive(Debug, Clone, Copy)]
enum TrailEntry {
    /// An entry related to the restoration of an integer value
    IntEntry(IntState),
}

//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~ STATE MANAGER ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// A simple state manager that can manage booleans, integers, sparse sets and
/// bounded sets (basically any reversible data structure ends up being managed
/// by this struct)
#[derive(Debug, Clone)]
pub struct TrailedStateManager {
    /// A monotonic clock which ticks on every save. A value stamped with the
    /// current clock has already been saved since the last level was opened.
    clock: usize,
    /// The previous values that are saved on the trail
    trail: Vec<TrailEntry>,
    /// Some book keeping to track what needs and what doesn't need
    /// to be restored upon manager `pop`
    levels: Vec<Level>,

    /// The current value of the various managed data
    integers: Vec<IntState>,

    /// Holds the metadata about sparse sets
    sparse_sets: Vec<SparseSet>,
    /// Holds the actual content of the sparse sets
    sparse_set_data: Vec<usize>,
    /// Holds the indices of the data in a sparse set
    sparse_set_idx: Vec<usize>,

    /// Holds the metadata about bounded sets
    bounded_sets: Vec<BoundedSet>,
    /// Holds the permutation of the ground set of each bounded set
    bounded_set_data: Vec<usize>,
    /// Holds the position of each value in `bounded_set_data`
    bounded_set_idx: Vec<usize>,
}
impl Default for TrailedStateManager {
    fn default() -> Self {
        Self::new()
    }
}
impl TrailedStateManager {
    /// Creates a new state manager with only the root level
    pub fn new() -> Self {
        Self {
            clock: 0,
            trail: vec![],
            levels: vec![Level::default()],
            //
            integers: vec![],
            //
            sparse_sets: vec![],
            sparse_set_data: vec![],
            sparse_set_idx: vec![],
            //
            bounded_sets: vec![],
            bounded_set_data: vec![],
            bounded_set_idx: vec![],
        }
    }
    /// Returns the number of undo records currently on the trail
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }
}
impl StateManager for TrailedStateManager {}
//------------------------------------------------------------------------------
// Save and Restore management
//------------------------------------------------------------------------------
impl SaveAndRestore for TrailedStateManager {
    fn save_state(&mut self) {
        self.clock += 1;

        self.levels.push(Level {
            trail_size: self.trail.len(),
            clock: self.clock,
            //
            integers: self.integers.len(),
            //
            sparse_sets: self.sparse_sets.len(),
            sparse_set_data: self.sparse_set_data.len(),
            //
            bounded_sets: self.bounded_sets.len(),
            bounded_set_data: self.bounded_set_data.len(),
        })
    }

    fn restore_state(&mut self) {
        assert!(
            self.levels.len() > 1,
            "cannot pop above the root level of the state manager"
        );
        let level = self
            .levels
            .pop()
            .expect("cannot pop above the root level of the state manager");

        // restore whatever needs to be restored (newest first)
        for e in self.trail.iter().skip(level.trail_size).rev().copied() {
            match e {
                TrailEntry::IntEntry(state) => self.integers[state.id.0] = state,
            }
        }
        // drop stale trail entry
        self.trail.truncate(level.trail_size);

        // resources created after the level was opened are discarded
        self.integers.truncate(level.integers);
        self.sparse_sets.truncate(level.sparse_sets);
        self.sparse_set_data.truncate(level.sparse_set_data);
        self.sparse_set_idx.truncate(level.sparse_set_data);
        self.bounded_sets.truncate(level.bounded_sets);
        self.bounded_set_data.truncate(level.bounded_set_data);
        self.bounded_set_idx.truncate(level.bounded_set_data);
    }

    fn checkpoint(&mut self) -> Checkpoint {
        let depth = self.depth();
        self.save_state();
        Checkpoint {
            depth,
            clock: self.clock,
        }
    }

    fn rollback(&mut self, mark: Checkpoint) {
        let live = self
            .levels
            .get(mark.depth + 1)
            .map(|level| level.clock == mark.clock)
            .unwrap_or(false);
        assert!(live, "rollback to a checkpoint that is no longer live: {mark:?}");

        while self.levels.len() > mark.depth + 1 {
            self.restore_state();
        }
    }

    fn depth(&self) -> usize {
        self.levels.len() - 1
    }
}
//------------------------------------------------------------------------------
// Int management
//------------------------------------------------------------------------------
/// The state of an integer that can be saved and restored
#[derive(Debug, Clone, Copy)]
struct IntState {
    /// The identifier of the managed resource
    id: ReversibleInt,
    /// At what 'time' was this data modified to the point where it needed being saved ?
    clock: usize,
    /// The value that will be restored in the managed data
    value: isize,
}

impl IntManager for TrailedStateManager {
    fn manage_int(&mut self, value: isize) -> ReversibleInt {
        let id = ReversibleInt(self.integers.len());
        self.integers.push(IntState {
            id,
            clock: self.clock,
            value,
        });
        id
    }

    fn get_int(&self, id: ReversibleInt) -> isize {
        self.integers[id.0].value
    }

    fn set_int(&mut self, id: ReversibleInt, value: isize) -> isize {
        let curr = self.integers[id.0];
        if value != curr.value {
            // only the first modification within a level needs to be trailed
            if curr.clock < self.clock {
                self.trail.push(TrailEntry::IntEntry(curr));
                self.integers[id.0] = IntState {
                    id,
                    clock: self.clock,
                    value,
                }
            } else {
                self.integers[id.0].value = value;
            }
        }
        value
    }
}
//------------------------------------------------------------------------------
// Bool management
//------------------------------------------------------------------------------
impl BoolManager for TrailedStateManager {
    fn manage_bool(&mut self, v: bool) -> ReversibleBool {
        ReversibleBool(self.manage_int(v as isize))
    }

    fn get_bool(&self, id: ReversibleBool) -> bool {
        self.get_int(id.0) != 0
    }

    fn set_bool(&mut self, id: ReversibleBool, value: bool) -> bool {
        self.set_int(id.0, value as isize) != 0
    }
}

// #############################################################################
// ### UNIT TESTS ##############################################################
// #############################################################################


#[cfg(test)]
mod tests_manager_int {
    use crate::{IntManager, SaveAndRestore, TrailedStateManager};

    #[test]
    fn it_works() {
        let mut mgr = TrailedStateManager::new();

        let a = mgr.manage_int(0);
        assert_eq!(mgr.get_int(a), 0);

        mgr.save_state();
        assert_eq!(mgr.get_int(a), 0);

        mgr.set_int(a, 1);
        assert_eq!(mgr.get_int(a), 1);

        mgr.save_state();
        assert_eq!(mgr.get_int(a), 1);

        mgr.set_int(a, 2);
        assert_eq!(mgr.get_int(a), 2);

        mgr.set_int(a, 42);
        assert_eq!(mgr.get_int(a), 42);

        mgr.restore_state();
        assert_eq!(mgr.get_int(a), 1);

        mgr.restore_state();
        assert_eq!(mgr.get_int(a), 0);
    }

    #[test]
    fn a_value_is_only_trailed_once_per_level() {
        let mut mgr = TrailedStateManager::new();
        let a = mgr.manage_int(0);

        mgr.save_state();
        for i in 1..=10 {
            mgr.increment(a);
            assert_eq!(mgr.get_int(a), i);
        }
        assert_eq!(1, mgr.trail_len());

        mgr.restore_state();
        assert_eq!(0, mgr.trail_len());
        assert_eq!(mgr.get_int(a), 0);
    }

    #[test]
    fn modifications_after_a_restore_are_trailed_again() {
        let mut mgr = TrailedStateManager::new();
        let a = mgr.manage_int(0);

        mgr.save_state();
        mgr.set_int(a, 1);
        mgr.save_state();
        mgr.set_int(a, 2);
        mgr.restore_state();
        assert_eq!(mgr.get_int(a), 1);

        mgr.set_int(a, 3);
        mgr.restore_state();
        assert_eq!(mgr.get_int(a), 0);
    }

    #[test]
    #[should_panic]
    fn one_cannot_use_an_item_that_has_been_managed_at_a_later_stage() {
        let mut mgr = TrailedStateManager::new();

        let a = mgr.manage_int(10);
        assert_eq!(mgr.get_int(a), 10);

        mgr.save_state();
        let b = mgr.manage_int(20);

        assert_eq!(mgr.get_int(a), 10);
        assert_eq!(mgr.get_int(b), 20);

        mgr.set_int(a, 30);
        assert_eq!(mgr.get_int(a), 30);
        assert_eq!(mgr.get_int(b), 20);

        mgr.restore_state();
        assert_eq!(mgr.get_int(a), 10);
        mgr.get_int(b); // this is where the panic must occur
    }

    #[test]
    #[should_panic]
    fn one_cannot_restore_the_root_level() {
        let mut mgr = TrailedStateManager::new();
        mgr.restore_state();
    }
}

#[cfg(test)]
mod tests_manager_checkpoint {
    use crate::{IntManager, SaveAndRestore, TrailedStateManager};

    #[test]
    fn rollback_restores_the_values_seen_at_checkpoint_time() {
        let mut mgr = TrailedStateManager::new();
        let a = mgr.manage_int(0);
        let b = mgr.manage_int(100);

        let root = mgr.checkpoint();
        mgr.set_int(a, 1);
        let first = mgr.checkpoint();
        mgr.set_int(a, 2);
        mgr.set_int(b, 50);
        let _second = mgr.checkpoint();
        mgr.set_int(a, 3);
        mgr.set_int(b, 25);
        assert_eq!(3, mgr.depth());

        mgr.rollback(first);
        assert_eq!(1, mgr.depth());
        assert_eq!(1, mgr.get_int(a));
        assert_eq!(100, mgr.get_int(b));

        mgr.rollback(root);
        assert_eq!(0, mgr.depth());
        assert_eq!(0, mgr.get_int(a));
        assert_eq!(100, mgr.get_int(b));
    }

    #[test]
    fn a_checkpoint_can_be_rolled_back_to_right_after_it_is_taken() {
        let mut mgr = TrailedStateManager::new();
        let a = mgr.manage_int(7);

        let mark = mgr.checkpoint();
        mgr.rollback(mark);
        assert_eq!(0, mgr.depth());
        assert_eq!(7, mgr.get_int(a));
    }

    #[test]
    #[should_panic]
    fn rolling_back_twice_to_the_same_mark_is_a_contract_violation() {
        let mut mgr = TrailedStateManager::new();
        let mark = mgr.checkpoint();
        mgr.rollback(mark);
        mgr.rollback(mark);
    }

    #[test]
    #[should_panic]
    fn a_stale_mark_is_detected_even_at_the_same_depth() {
        let mut mgr = TrailedStateManager::new();
        let stale = mgr.checkpoint();
        mgr.rollback(stale);
        let _fresh = mgr.checkpoint();
        mgr.rollback(stale);
    }
}
