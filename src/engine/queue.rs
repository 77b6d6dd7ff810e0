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

//! The queue of the propagators which are scheduled for propagation

use std::{cmp::Reverse, collections::{BinaryHeap, VecDeque}};

use rustc_hash::FxHashSet;

use crate::{trailcp_assert_moderate, PropagatorId, PropagatorPriority};

/// One FIFO queue per priority class. Popping always serves the cheapest
/// non empty class, and within a class the propagators are served in the
/// order they were scheduled. A propagator is never present twice.
#[derive(Debug, Clone)]
pub struct PropagatorQueue {
    /// the scheduled propagators of each priority class
    queues: Vec<VecDeque<PropagatorId>>,
    /// the propagators that are currently in the queue
    present_propagators: FxHashSet<PropagatorId>,
    /// the priority classes having at least one scheduled propagator
    present_priorities: BinaryHeap<Reverse<usize>>,
}

impl Default for PropagatorQueue {
    fn default() -> Self {
        Self {
            queues: vec![VecDeque::new(); PropagatorPriority::COUNT],
            present_propagators: FxHashSet::default(),
            present_priorities: BinaryHeap::new(),
        }
    }
}

impl PropagatorQueue {
    /// Returns true iff no propagator is scheduled
    pub fn is_empty(&self) -> bool {
        self.present_propagators.is_empty()
    }
    /// Returns the number of scheduled propagators
    pub fn len(&self) -> usize {
        self.present_propagators.len()
    }
    /// Returns true iff the given propagator is scheduled
    pub fn contains(&self, id: PropagatorId) -> bool {
        self.present_propagators.contains(&id)
    }
    /// Schedules a propagator (no-op if it already is)
    pub fn enqueue(&mut self, id: PropagatorId, priority: PropagatorPriority) {
        if self.present_propagators.insert(id) {
            let priority = priority.index();
            if self.queues[priority].is_empty() {
                self.present_priorities.push(Reverse(priority));
            }
            self.queues[priority].push_back(id);
        }
    }
    /// Removes the next propagator to run from the queue
    pub fn pop(&mut self) -> Option<PropagatorId> {
        let Reverse(top_priority) = *self.present_priorities.peek()?;
        let next = self.queues[top_priority].pop_front();
        trailcp_assert_moderate!(next.is_some());

        if self.queues[top_priority].is_empty() {
            self.present_priorities.pop();
        }
        if let Some(id) = next {
            self.present_propagators.remove(&id);
        }
        next
    }
    /// Unschedules all propagators
    pub fn clear(&mut self) {
        while let Some(Reverse(priority)) = self.present_priorities.pop() {
            trailcp_assert_moderate!(!self.queues[priority].is_empty());
            self.queues[priority].clear();
        }
        self.present_propagators.clear();
    }
}
