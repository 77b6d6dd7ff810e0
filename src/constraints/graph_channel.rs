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

//! This module provides the implementation of the channeling between a graph
//! variable and the set variables representing the successors of its nodes.

use crate::prelude::*;

/// This constraint enforces that the successors of node `i` in a graph are
/// exactly the values of the i-th set variable. That is, for all i and j:
/// `i -> j` is an arc of the graph iff `j` belongs to `sets[i]`.
#[derive(Debug, Clone)]
pub struct GraphChannel {
    /// the graph variable
    graph: GraphVar,
    /// the successors of each node
    sets: Vec<SetVar>,
    /// one monitor per set, followed by the monitor of the graph
    monitors: Vec<DeltaMonitor>,
    /// the cause of the modifications made by this propagator
    cause: Cause,
}

impl GraphChannel {
    /// Creates a new channeling propagator. The graph must have as many nodes
    /// as there are sets.
    pub fn new(graph: GraphVar, sets: Vec<SetVar>) -> Self {
        Self {
            graph,
            sets,
            monitors: vec![],
            cause: Cause::Decision,
        }
    }

    /// Forwards the changes of the i-th set onto the successors of node `i`
    fn drain_set(&self, store: &mut dyn DomainStore, i: usize) -> CPResult<()> {
        let (graph, cause) = (self.graph, self.cause);
        let monitor = &self.monitors[i];
        monitor.for_each_element(store, DomainEvent::AddToKernel, |store, j| {
            store.enforce_arc(graph, i, j, cause).map(|_| ())
        })?;
        monitor.for_each_element(store, DomainEvent::RemoveFromEnvelope, |store, j| {
            store.remove_arc(graph, i, j, cause).map(|_| ())
        })
    }

    /// Forwards the changes of the arcs onto the sets
    fn drain_graph(&self, store: &mut dyn DomainStore) -> CPResult<()> {
        let (sets, cause) = (&self.sets, self.cause);
        let monitor = &self.monitors[sets.len()];
        monitor.for_each_arc(store, DomainEvent::EnforceArc, |store, i, j| {
            store.add_to_kernel(sets[i], j, cause).map(|_| ())
        })?;
        monitor.for_each_arc(store, DomainEvent::RemoveArc, |store, i, j| {
            store.remove_from_envelope(sets[i], j, cause).map(|_| ())
        })
    }
}

impl Propagator for GraphChannel {
    fn name(&self) -> &'static str {
        "GraphChannel"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Linear
    }

    fn initialise(&mut self, context: &mut PropagatorInitialisationContext) {
        assert_eq!(
            self.sets.len(),
            context.store().nb_nodes(self.graph),
            "there must be exactly one set per node of the graph"
        );
        self.cause = Cause::Propagator(context.propagator_id());
        self.monitors.clear();

        for set in self.sets.iter().copied() {
            context.register(set, DomainEvent::AddToKernel | DomainEvent::RemoveFromEnvelope);
            self.monitors.push(context.monitor(set));
        }
        context.register(self.graph, DomainEvent::EnforceArc | DomainEvent::RemoveArc);
        self.monitors.push(context.monitor(self.graph));
    }

    fn propagate(&mut self, store: &mut dyn DomainStore) -> CPResult<()> {
        let (graph, cause) = (self.graph, self.cause);
        for (i, set) in self.sets.iter().copied().enumerate() {
            for j in store.kernel_values(set) {
                store.enforce_arc(graph, i, j, cause)?;
            }
            for j in store.kernel_successors(graph, i) {
                store.add_to_kernel(set, j, cause)?;
            }
            for j in store.envelope_values(set) {
                if !store.arc_in_envelope(graph, i, j) {
                    store.remove_from_envelope(set, j, cause)?;
                }
            }
            for j in store.envelope_successors(graph, i) {
                if !store.envelope_contains(set, j) {
                    store.remove_arc(graph, i, j, cause)?;
                }
            }
        }
        // everything that happened so far has been covered by the sweep
        for monitor in self.monitors.iter_mut() {
            monitor.freeze(store);
            monitor.unfreeze();
        }
        Ok(())
    }

    fn propagate_on(
        &mut self,
        store: &mut dyn DomainStore,
        local_index: usize,
        _mask: EventMask,
    ) -> CPResult<()> {
        self.monitors[local_index].freeze(store);
        let result = if local_index < self.sets.len() {
            self.drain_set(store, local_index)
        } else {
            self.drain_graph(store)
        };
        self.monitors[local_index].unfreeze();
        result
    }

    fn entailment(&self, store: &dyn DomainStore) -> Entailment {
        for (i, set) in self.sets.iter().copied().enumerate() {
            let forced_in_set = store.kernel_values(set);
            if forced_in_set.iter().any(|&j| !store.arc_in_envelope(self.graph, i, j)) {
                return Entailment::False;
            }
            let forced_in_graph = store.kernel_successors(self.graph, i);
            if forced_in_graph.iter().any(|&j| !store.envelope_contains(set, j)) {
                return Entailment::False;
            }
        }
        let instantiated = store.is_instantiated(self.graph.into())
            && self.sets.iter().all(|s| store.is_instantiated((*s).into()));
        if instantiated {
            Entailment::True
        } else {
            Entailment::Undefined
        }
    }
}
