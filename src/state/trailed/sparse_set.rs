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

//! Reversible sparse sets: the representation of integer domains.
//!
//! The values `0..capa` (shifted by `val_offset`) are stored in a permutation.
//! The values that belong to the set occupy the `size` first positions of
//! that permutation. Removing a value swaps it past the frontier and
//! decrements `size`, hence restoring `size` is all it takes to restore the
//! set.

use super::*;

/// The information that needs to be maintained in order to deal with a
/// sparse set
#[derive(Debug, Clone, Copy)]
pub(super) struct SparseSet {
    /// offset of the values
    val_offset: isize,
    /// start index of the sparse set (included)
    start: usize,
    /// capacity of the sparse set
    capa: usize,
    /// the current size of the sparse set
    size: ReversibleInt,
    /// the minimum value in the set (included, without offset)
    min: ReversibleInt,
    /// the maximum value in the set (included, without offset)
    max: ReversibleInt,
}

impl SparseSetManager for TrailedStateManager {
    fn manage_sparse_set(&mut self, n: usize, val_offset: isize) -> ReversibleSparseSet {
        let id = self.sparse_sets.len();
        let start = self.sparse_set_data.len();

        for i in 0..n {
            self.sparse_set_data.push(i);
            self.sparse_set_idx.push(i);
        }

        let size = self.manage_int(n as isize);
        let min = self.manage_int(0);
        let max = self.manage_int(n as isize - 1);

        self.sparse_sets.push(SparseSet {
            val_offset,
            start,
            capa: n,
            size,
            min,
            max,
        });
        ReversibleSparseSet(id)
    }

    fn sparse_set_size(&self, id: ReversibleSparseSet) -> usize {
        self.get_int(self.sparse_sets[id.0].size) as usize
    }

    fn sparse_set_get_min(&self, id: ReversibleSparseSet) -> Option<isize> {
        let ss = self.sparse_sets[id.0];
        if self.get_int(ss.size) <= 0 {
            None
        } else {
            Some(self.get_int(ss.min) + ss.val_offset)
        }
    }

    fn sparse_set_get_max(&self, id: ReversibleSparseSet) -> Option<isize> {
        let ss = self.sparse_sets[id.0];
        if self.get_int(ss.size) <= 0 {
            None
        } else {
            Some(self.get_int(ss.max) + ss.val_offset)
        }
    }

    fn sparse_set_contains(&self, id: ReversibleSparseSet, value: isize) -> bool {
        let ss = self.sparse_sets[id.0];
        let val = value - ss.val_offset;

        if val < 0 || val >= ss.capa as isize {
            false
        } else {
            let size = self.get_int(ss.size) as usize;
            self.sparse_set_idx[ss.start + val as usize] < size
        }
    }

    fn sparse_set_remove(&mut self, id: ReversibleSparseSet, value: isize) -> bool {
        if !self.sparse_set_contains(id, value) {
            return false;
        }
        let ss = self.sparse_sets[id.0];
        let val = (value - ss.val_offset) as usize;
        let last = self.get_int(ss.size) as usize - 1;

        self.sparse_set_swap(ss, val, self.sparse_set_data[ss.start + last]);
        let size = self.decrement(ss.size) as usize;

        // maintain the bounds
        if size > 0 {
            let min = self.get_int(ss.min) as usize;
            let max = self.get_int(ss.max) as usize;
            if val == min {
                let new_min = (min + 1..=max)
                    .find(|v| self.sparse_set_idx[ss.start + v] < size)
                    .unwrap_or(max);
                self.set_int(ss.min, new_min as isize);
            }
            if val == max {
                let new_max = (min..max)
                    .rev()
                    .find(|v| self.sparse_set_idx[ss.start + v] < size)
                    .unwrap_or(min);
                self.set_int(ss.max, new_max as isize);
            }
        }
        true
    }

    fn sparse_set_remove_all(&mut self, id: ReversibleSparseSet) {
        self.set_int(self.sparse_sets[id.0].size, 0);
    }

    fn sparse_set_remove_all_but(&mut self, id: ReversibleSparseSet, value: isize) {
        if self.sparse_set_contains(id, value) {
            // it suffices to place the desired item in position 0
            let ss = self.sparse_sets[id.0];
            let val = (value - ss.val_offset) as usize;
            self.sparse_set_swap(ss, val, self.sparse_set_data[ss.start]);

            self.set_int(ss.size, 1);
            self.set_int(ss.min, val as isize);
            self.set_int(ss.max, val as isize);
        } else {
            self.sparse_set_remove_all(id);
        }
    }

    fn sparse_set_remove_below(&mut self, id: ReversibleSparseSet, value: isize) {
        let ss = self.sparse_sets[id.0];
        if self.sparse_set_is_empty(id) {
            return;
        }
        let val = value - ss.val_offset;
        let min = self.get_int(ss.min);
        let max = self.get_int(ss.max);
        if val > max {
            self.sparse_set_remove_all(id);
        } else {
            for x in min..val {
                self.sparse_set_remove(id, x + ss.val_offset);
            }
        }
    }

    fn sparse_set_remove_above(&mut self, id: ReversibleSparseSet, value: isize) {
        let ss = self.sparse_sets[id.0];
        if self.sparse_set_is_empty(id) {
            return;
        }
        let val = value - ss.val_offset;
        let min = self.get_int(ss.min);
        let max = self.get_int(ss.max);
        if val < min {
            self.sparse_set_remove_all(id);
        } else {
            for x in (val + 1..=max).rev() {
                self.sparse_set_remove(id, x + ss.val_offset);
            }
        }
    }

    fn sparse_set_for_each<F: FnMut(isize)>(&self, id: ReversibleSparseSet, f: F) {
        let ss = self.sparse_sets[id.0];
        let len = self.get_int(ss.size) as usize;

        self.sparse_set_data[ss.start..ss.start + len]
            .iter()
            .map(|v| *v as isize + ss.val_offset)
            .for_each(f)
    }
}

impl TrailedStateManager {
    /// swaps the positions of the values a and b (both without offset) in the
    /// permutation of the given sparse set
    fn sparse_set_swap(&mut self, ss: SparseSet, a: usize, b: usize) {
        let pa = self.sparse_set_idx[ss.start + a];
        let pb = self.sparse_set_idx[ss.start + b];
        self.sparse_set_data.swap(ss.start + pa, ss.start + pb);
        self.sparse_set_idx.swap(ss.start + a, ss.start + b);
    }
}

#[cfg(test)]
mod tests_manager_sparse_set {
    use crate::{SaveAndRestore, SparseSetManager, TrailedStateManager};

    fn sorted_content(mgr: &TrailedStateManager, id: crate::ReversibleSparseSet) -> Vec<isize> {
        let mut out = vec![];
        mgr.sparse_set_for_each(id, |v| out.push(v));
        out.sort_unstable();
        out
    }

    #[test]
    fn contains_is_always_false_for_items_not_supposed_to_be_in_set() {
        let mut mgr = TrailedStateManager::new();
        let set = mgr.manage_sparse_set(5, 10);

        assert!(!mgr.sparse_set_contains(set, 9));
        assert!(mgr.sparse_set_contains(set, 10));
        assert!(mgr.sparse_set_contains(set, 14));
        assert!(!mgr.sparse_set_contains(set, 15));
    }

    #[test]
    fn remove_maintains_size_and_bounds() {
        let mut mgr = TrailedStateManager::new();
        let set = mgr.manage_sparse_set(5, 0);

        assert!(mgr.sparse_set_remove(set, 0));
        assert!(!mgr.sparse_set_remove(set, 0));
        assert_eq!(4, mgr.sparse_set_size(set));
        assert_eq!(Some(1), mgr.sparse_set_get_min(set));

        assert!(mgr.sparse_set_remove(set, 4));
        assert_eq!(Some(3), mgr.sparse_set_get_max(set));

        assert!(mgr.sparse_set_remove(set, 2));
        assert_eq!(Some(1), mgr.sparse_set_get_min(set));
        assert_eq!(Some(3), mgr.sparse_set_get_max(set));
        assert_eq!(vec![1, 3], sorted_content(&mgr, set));
    }

    #[test]
    fn get_min_is_not_affected_by_holes() {
        let mut mgr = TrailedStateManager::new();
        let set = mgr.manage_sparse_set(5, 0);

        mgr.sparse_set_remove(set, 1);
        mgr.sparse_set_remove(set, 2);
        assert_eq!(Some(0), mgr.sparse_set_get_min(set));
        mgr.sparse_set_remove(set, 0);
        assert_eq!(Some(3), mgr.sparse_set_get_min(set));
    }

    #[test]
    fn remove_below_and_above() {
        let mut mgr = TrailedStateManager::new();
        let set = mgr.manage_sparse_set(10, -5);

        mgr.sparse_set_remove_below(set, -2);
        mgr.sparse_set_remove_above(set, 2);
        assert_eq!(vec![-2, -1, 0, 1, 2], sorted_content(&mgr, set));
        assert_eq!(Some(-2), mgr.sparse_set_get_min(set));
        assert_eq!(Some(2), mgr.sparse_set_get_max(set));

        mgr.sparse_set_remove_below(set, 10);
        assert!(mgr.sparse_set_is_empty(set));
        assert_eq!(None, mgr.sparse_set_get_min(set));
    }

    #[test]
    fn remove_all_but() {
        let mut mgr = TrailedStateManager::new();
        let set = mgr.manage_sparse_set(10, 0);

        mgr.sparse_set_remove_all_but(set, 7);
        assert_eq!(vec![7], sorted_content(&mgr, set));

        mgr.sparse_set_remove_all_but(set, 3);
        assert!(mgr.sparse_set_is_empty(set));
    }

    #[test]
    fn restore_brings_back_removed_values() {
        let mut mgr = TrailedStateManager::new();
        let set = mgr.manage_sparse_set(6, 0);

        mgr.save_state();
        mgr.sparse_set_remove(set, 3);
        mgr.sparse_set_remove_below(set, 2);
        assert_eq!(vec![2, 4, 5], sorted_content(&mgr, set));

        mgr.save_state();
        mgr.sparse_set_remove_all_but(set, 5);
        assert_eq!(vec![5], sorted_content(&mgr, set));

        mgr.restore_state();
        assert_eq!(vec![2, 4, 5], sorted_content(&mgr, set));
        assert_eq!(Some(2), mgr.sparse_set_get_min(set));

        mgr.restore_state();
        assert_eq!(vec![0, 1, 2, 3, 4, 5], sorted_content(&mgr, set));
        assert_eq!(Some(0), mgr.sparse_set_get_min(set));
        assert_eq!(Some(5), mgr.sparse_set_get_max(set));
    }
}
