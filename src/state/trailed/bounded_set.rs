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

//! Reversible bounded sets: the (kernel, envelope) representation used by
//! set and graph variables.
//!
//! This is a two sided version of the sparse set. The ground set `0..capa` is
//! kept in a permutation split by two reversible frontiers:
//!
//! ```text
//!  [ kernel ........ | undecided ........ | forbidden ........ ]
//!  0                 kernel_size          envelope_size        capa
//! ```
//!
//! Enforcing a value swaps it to the kernel frontier and bumps `kernel_size`,
//! removing a value swaps it to the envelope frontier and lowers
//! `envelope_size`. Values only ever move within the undecided zone, so
//! restoring the two frontiers is enough to restore both sets.

use super::*;
use crate::trailcp_assert_moderate;

/// The information that needs to be maintained in order to deal with a
/// bounded set
#[derive(Debug, Clone, Copy)]
pub(super) struct BoundedSet {
    /// start index of the bounded set in the shared data
    start: usize,
    /// size of the ground set
    capa: usize,
    /// number of values in the kernel
    kernel_size: ReversibleInt,
    /// number of values in the envelope
    envelope_size: ReversibleInt,
}

impl BoundedSetManager for TrailedStateManager {
    fn manage_bounded_set(&mut self, n: usize) -> ReversibleBoundedSet {
        let id = self.bounded_sets.len();
        let start = self.bounded_set_data.len();

        for i in 0..n {
            self.bounded_set_data.push(i);
            self.bounded_set_idx.push(i);
        }

        let kernel_size = self.manage_int(0);
        let envelope_size = self.manage_int(n as isize);
        self.bounded_sets.push(BoundedSet {
            start,
            capa: n,
            kernel_size,
            envelope_size,
        });
        ReversibleBoundedSet(id)
    }

    fn bounded_set_capacity(&self, id: ReversibleBoundedSet) -> usize {
        self.bounded_sets[id.0].capa
    }

    fn bounded_set_kernel_size(&self, id: ReversibleBoundedSet) -> usize {
        self.get_int(self.bounded_sets[id.0].kernel_size) as usize
    }

    fn bounded_set_envelope_size(&self, id: ReversibleBoundedSet) -> usize {
        self.get_int(self.bounded_sets[id.0].envelope_size) as usize
    }

    fn bounded_set_kernel_contains(&self, id: ReversibleBoundedSet, value: usize) -> bool {
        let bs = self.bounded_sets[id.0];
        value < bs.capa && self.bounded_set_idx[bs.start + value] < self.bounded_set_kernel_size(id)
    }

    fn bounded_set_envelope_contains(&self, id: ReversibleBoundedSet, value: usize) -> bool {
        let bs = self.bounded_sets[id.0];
        value < bs.capa
            && self.bounded_set_idx[bs.start + value] < self.bounded_set_envelope_size(id)
    }

    fn bounded_set_enforce(&mut self, id: ReversibleBoundedSet, value: usize) -> bool {
        assert!(
            self.bounded_set_envelope_contains(id, value),
            "cannot enforce {value}: it does not belong to the envelope"
        );
        if self.bounded_set_kernel_contains(id, value) {
            return false;
        }
        let bs = self.bounded_sets[id.0];
        let frontier = self.bounded_set_kernel_size(id);
        self.bounded_set_swap(bs, value, self.bounded_set_data[bs.start + frontier]);
        self.increment(bs.kernel_size);

        trailcp_assert_moderate!(
            self.bounded_set_kernel_size(id) <= self.bounded_set_envelope_size(id)
        );
        true
    }

    fn bounded_set_remove(&mut self, id: ReversibleBoundedSet, value: usize) -> bool {
        assert!(
            !self.bounded_set_kernel_contains(id, value),
            "cannot remove {value}: it belongs to the kernel"
        );
        if !self.bounded_set_envelope_contains(id, value) {
            return false;
        }
        let bs = self.bounded_sets[id.0];
        let frontier = self.bounded_set_envelope_size(id) - 1;
        self.bounded_set_swap(bs, value, self.bounded_set_data[bs.start + frontier]);
        self.decrement(bs.envelope_size);

        trailcp_assert_moderate!(
            self.bounded_set_kernel_size(id) <= self.bounded_set_envelope_size(id)
        );
        true
    }

    fn bounded_set_for_each_kernel<F: FnMut(usize)>(&self, id: ReversibleBoundedSet, f: F) {
        let bs = self.bounded_sets[id.0];
        let len = self.bounded_set_kernel_size(id);
        self.bounded_set_data[bs.start..bs.start + len]
            .iter()
            .copied()
            .for_each(f)
    }

    fn bounded_set_for_each_envelope<F: FnMut(usize)>(&self, id: ReversibleBoundedSet, f: F) {
        let bs = self.bounded_sets[id.0];
        let len = self.bounded_set_envelope_size(id);
        self.bounded_set_data[bs.start..bs.start + len]
            .iter()
            .copied()
            .for_each(f)
    }
}

impl TrailedStateManager {
    /// swaps the positions of the values a and b in the permutation of the
    /// given bounded set
    fn bounded_set_swap(&mut self, bs: BoundedSet, a: usize, b: usize) {
        let pa = self.bounded_set_idx[bs.start + a];
        let pb = self.bounded_set_idx[bs.start + b];
        self.bounded_set_data.swap(bs.start + pa, bs.start + pb);
        self.bounded_set_idx.swap(bs.start + a, bs.start + b);
    }
}
