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

//! The state module comprises all traits and datastructures related to
//! the reversible state (save and restore) management.
//!
//! Every piece of solver state that must survive or be discarded across a
//! backtrack lives in a state manager. The rest of the solver only ever holds
//! *identifiers* of managed resources (`ReversibleInt`, `ReversibleBool`, ...)
//! and goes through the manager to read or mutate them. This is the single
//! path by which a mutation becomes undoable.
//!
//! # Note
//! The state manager have been thought of in terms of a visitor pattern. This
//! keeps the reversible objects themselves dead simple (plain indices into the
//! manager arenas) and avoids any back reference between a cell and the trail.

use std::ops::Not;

//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~ MANAGED RESOURCES ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// The identifier of a managed integer resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReversibleInt(usize);

/// The identifier of a managed boolean resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReversibleBool(ReversibleInt);

/// The identifier of a managed sparse set resource (the domain of an
/// integer variable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReversibleSparseSet(usize);

/// The identifier of a managed bounded set resource. A bounded set is a pair
/// (kernel, envelope) of subsets of a ground set `0..n` where the kernel is
/// always included in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReversibleBoundedSet(usize);

/// An opaque mark returned by `checkpoint` that can later be handed back to
/// `rollback` in order to restore the state that was current when the mark
/// was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checkpoint {
    /// number of saved levels at the time the checkpoint was taken
    depth: usize,
    /// clock value of the level that was opened by this checkpoint. Because
    /// the clock is monotonic, it identifies that level uniquely, which lets
    /// us detect stale marks.
    clock: usize,
}
impl Checkpoint {
    /// Returns the depth (number of enclosing checkpoints) of this mark
    pub fn depth(&self) -> usize {
        self.depth
    }
}

//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~ MANAGER TRAITS ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// A state manager is an object capable of saving and restoring the state of
/// all types of managed resources.
pub trait StateManager:
    SaveAndRestore + IntManager + BoolManager + SparseSetManager + BoundedSetManager
{
}

/// An implementation of this type is capable of saving and restoring the
/// state of the resources it manages.
pub trait SaveAndRestore {
    /// Saves the current state of all managed resources
    fn save_state(&mut self);
    /// Restores the previous state of all managed resources
    fn restore_state(&mut self);
    /// Saves the current state and returns a mark identifying it
    fn checkpoint(&mut self) -> Checkpoint;
    /// Restores the state that was current when `mark` was taken, undoing
    /// all the levels that have been saved since then.
    ///
    /// # Panics
    /// When the mark is no longer live (it has already been rolled back or it
    /// belongs to a level that has since been discarded).
    fn rollback(&mut self, mark: Checkpoint);
    /// Returns the number of saved levels
    fn depth(&self) -> usize;
}

/// All the operations that can be made on an integer resource
pub trait IntManager {
    /// creates a new managed integer
    fn manage_int(&mut self, value: isize) -> ReversibleInt;
    /// returns the value of a managed integer
    fn get_int(&self, id: ReversibleInt) -> isize;
    /// sets a managed integer's value and returns the new value
    fn set_int(&mut self, id: ReversibleInt, value: isize) -> isize;
    /// increments a managed integer's value
    fn increment(&mut self, id: ReversibleInt) -> isize {
        self.set_int(id, self.get_int(id) + 1)
    }
    /// decrements a managed integer's value
    fn decrement(&mut self, id: ReversibleInt) -> isize {
        self.set_int(id, self.get_int(id) - 1)
    }
}

/// All the operations that can be made on a boolean resource
pub trait BoolManager {
    /// creates a new managed boolean
    fn manage_bool(&mut self, v: bool) -> ReversibleBool;
    /// returns the value of a managed boolean
    fn get_bool(&self, id: ReversibleBool) -> bool;
    /// sets a managed boolean's value and returns the new value
    fn set_bool(&mut self, id: ReversibleBool, value: bool) -> bool;
    /// flips a boolean's value and returns it
    fn flip_bool(&mut self, id: ReversibleBool) -> bool {
        self.set_bool(id, self.get_bool(id).not())
    }
}

/// All the operations that can be applied to a sparse set
pub trait SparseSetManager {
    /// creates a new managed sparse set with values
    /// [0 + value_offset, 1 + value_offset, 2 + value_offset, ... , n-1 + value_offset]
    ///
    /// # Params
    /// - n: the number of values in the sparse set
    /// - val_offset: the "offset" of the first value that belongs to the set
    fn manage_sparse_set(&mut self, n: usize, val_offset: isize) -> ReversibleSparseSet;
    /// returns the size of the given sparse set
    fn sparse_set_size(&self, id: ReversibleSparseSet) -> usize;
    /// returns true iff the sparse set is empty
    fn sparse_set_is_empty(&self, id: ReversibleSparseSet) -> bool {
        self.sparse_set_size(id) == 0
    }
    /// returns the minimum value of the sparse set (if it exists)
    fn sparse_set_get_min(&self, id: ReversibleSparseSet) -> Option<isize>;
    /// returns the maximum value of the sparse set (if it exists)
    fn sparse_set_get_max(&self, id: ReversibleSparseSet) -> Option<isize>;
    /// returns true iff the sparse set contains the designated value
    fn sparse_set_contains(&self, id: ReversibleSparseSet, value: isize) -> bool;
    /// removes the given value from the sparse set and returns a boolean telling
    /// whether or not the value was actually deleted from the set
    fn sparse_set_remove(&mut self, id: ReversibleSparseSet, value: isize) -> bool;
    /// removes all values in the set
    fn sparse_set_remove_all(&mut self, id: ReversibleSparseSet);
    /// removes all values in the set except the given value (if it belongs to the set)
    fn sparse_set_remove_all_but(&mut self, id: ReversibleSparseSet, value: isize);
    /// remove from the set all the items having a value lower than the given `value`
    fn sparse_set_remove_below(&mut self, id: ReversibleSparseSet, value: isize);
    /// remove from the set all the items having a value higher than the given `value`
    fn sparse_set_remove_above(&mut self, id: ReversibleSparseSet, value: isize);
    /// Calls the function f once for each value in the reversible sparse set
    /// identified with 'id'
    fn sparse_set_for_each<F: FnMut(isize)>(&self, id: ReversibleSparseSet, f: F);
}

/// All the operations that can be applied to a bounded (kernel, envelope) set.
///
/// The values of a bounded set are taken from the ground set `0..capacity`.
/// Values in the kernel are mandatory, values of the envelope that are not
/// in the kernel are undecided and the values outside of the envelope are
/// forbidden. The kernel can only grow and the envelope can only shrink
/// (until the state is restored).
pub trait BoundedSetManager {
    /// creates a new managed bounded set over the ground set `0..n`, with an
    /// empty kernel and a full envelope
    fn manage_bounded_set(&mut self, n: usize) -> ReversibleBoundedSet;
    /// returns the size of the ground set
    fn bounded_set_capacity(&self, id: ReversibleBoundedSet) -> usize;
    /// returns the number of values in the kernel
    fn bounded_set_kernel_size(&self, id: ReversibleBoundedSet) -> usize;
    /// returns the number of values in the envelope
    fn bounded_set_envelope_size(&self, id: ReversibleBoundedSet) -> usize;
    /// returns true iff the value belongs to the kernel
    fn bounded_set_kernel_contains(&self, id: ReversibleBoundedSet, value: usize) -> bool;
    /// returns true iff the value belongs to the envelope
    fn bounded_set_envelope_contains(&self, id: ReversibleBoundedSet, value: usize) -> bool;
    /// moves an undecided value into the kernel. Returns false when the value
    /// was already in the kernel.
    ///
    /// # Panics
    /// When the value lies outside of the envelope
    fn bounded_set_enforce(&mut self, id: ReversibleBoundedSet, value: usize) -> bool;
    /// drops an undecided value from the envelope. Returns false when the
    /// value already was outside of the envelope.
    ///
    /// # Panics
    /// When the value belongs to the kernel
    fn bounded_set_remove(&mut self, id: ReversibleBoundedSet, value: usize) -> bool;
    /// Calls the function f once for each value of the kernel
    fn bounded_set_for_each_kernel<F: FnMut(usize)>(&self, id: ReversibleBoundedSet, f: F);
    /// Calls the function f once for each value of the envelope
    fn bounded_set_for_each_envelope<F: FnMut(usize)>(&self, id: ReversibleBoundedSet, f: F);
}

/// The state manager is in charge of storing and restoring the data from
/// and to the trail
mod trailed;

pub use trailed::*;
