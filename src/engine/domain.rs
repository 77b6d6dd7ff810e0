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

//! This module provides the definition and implementation of the domain
//! store: the entity which creates the variables and is the only way to
//! narrow their domains.

use crate::{
    trailcp_assert_advanced, trailcp_assert_extreme, BoundedSetManager, CPResult, Cause,
    Checkpoint, Contradiction, ContradictionReason, DeltaEntry, DeltaLog, DomainEvent, Element,
    EventMask, EventSink, GraphVar, IntManager, IntVar, PendingEvent, PropagatorId,
    ReversibleBoundedSet, ReversibleInt, ReversibleSparseSet, SaveAndRestore, SetVar,
    SparseSetManager, StateManager, Variable,
};

/// The current domain of a variable, as plain values. Two snapshots of the
/// same variable are equal iff the domains are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainSnapshot {
    /// The values of an integer variable (sorted)
    Int(Vec<isize>),
    /// The kernel and envelope of a set variable (sorted)
    Set {
        kernel: Vec<usize>,
        envelope: Vec<usize>,
    },
    /// The kernel and envelope of a graph variable (sorted)
    Graph {
        kernel_nodes: Vec<usize>,
        envelope_nodes: Vec<usize>,
        kernel_arcs: Vec<(usize, usize)>,
        envelope_arcs: Vec<(usize, usize)>,
    },
}

/// A domain store is the entity that gives a hook to propagators for
/// modifying the variables domains. (Note however that no propagator can
/// decide to save or restore the state of these domains to a previous value,
/// nor dispatch the events. These are the responsibilities devoted to a
/// DomainBroker -- which is typically implemented by the same structure as
/// DomainStore; but it helps to split responsibilities).
///
/// All narrowing operations are monotonic: they either leave the domain
/// untouched or make it smaller. A narrowing that would leave an inconsistent
/// domain does not touch the domain and returns a `Contradiction` instead.
pub trait DomainStore {
    /// Returns the number of live variables
    fn nb_vars(&self) -> usize;
    /// Returns true iff the domain of the variable is reduced to one single
    /// assignment (whatever the kind of the variable)
    fn is_instantiated(&self, var: Variable) -> bool;
    /// Returns a copy of the current domain of the variable
    fn snapshot(&self, var: Variable) -> DomainSnapshot;
    /// Returns the change log of a set or graph variable (the log of an
    /// integer variable is always empty)
    fn delta(&self, var: Variable) -> &DeltaLog;
    /// Returns the number of times the change logs have been cleared
    fn delta_epoch(&self) -> usize;
    /// Returns the propagator which is currently being executed (if any)
    fn running(&self) -> Option<PropagatorId>;

    // --- integer variables -------------------------------------------------
    /// Creates a new integer variable covering the min..=max range of values
    fn new_int_var(&mut self, min: isize, max: isize) -> IntVar;
    /// Creates a new binary 0,1 variable
    fn new_bool_var(&mut self) -> IntVar {
        self.new_int_var(0, 1)
    }
    /// Returns the minimum value of the domain of this variable (if it exists)
    fn min(&self, var: IntVar) -> Option<isize>;
    /// Returns the maximum value of the domain of this variable (if it exists)
    fn max(&self, var: IntVar) -> Option<isize>;
    /// Returns the size of the domain of this variable
    fn size(&self, var: IntVar) -> usize;
    /// Returns true iff the domain of the target `var` contains the specified `value`
    fn contains(&self, var: IntVar, value: isize) -> bool;
    /// Returns true iff the value of the target variable is fixed/imposed
    fn is_fixed(&self, var: IntVar) -> bool {
        self.size(var) == 1
    }
    /// Forces the value of this variable. It returns a Contradiction when
    /// the value does not belong to the domain
    fn fix(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()>;
    /// Removes the specified value from the domain of the target variable.
    /// A Contradiction is returned when the domain would become empty
    fn remove(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()>;
    /// Removes all value less than (<) the specified value from the domain
    /// of the target variable. A Contradiction is returned when the domain
    /// would become empty
    fn remove_below(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()>;
    /// Removes all value greater than (>) the specified value from the domain
    /// of the target variable. A Contradiction is returned when the domain
    /// would become empty
    fn remove_above(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()>;

    // --- set variables -----------------------------------------------------
    /// Creates a new set variable over the ground set `0..n`, with an empty
    /// kernel and a full envelope
    fn new_set_var(&mut self, n: usize) -> SetVar;
    /// Returns the size of the ground set of the variable
    fn ground_size(&self, var: SetVar) -> usize;
    /// Returns true iff `value` is mandatory in the set
    fn kernel_contains(&self, var: SetVar, value: usize) -> bool;
    /// Returns true iff `value` is possible in the set
    fn envelope_contains(&self, var: SetVar, value: usize) -> bool;
    /// Returns the number of mandatory values
    fn kernel_size(&self, var: SetVar) -> usize;
    /// Returns the number of possible values
    fn envelope_size(&self, var: SetVar) -> usize;
    /// Returns the mandatory values (sorted)
    fn kernel_values(&self, var: SetVar) -> Vec<usize>;
    /// Returns the possible values (sorted)
    fn envelope_values(&self, var: SetVar) -> Vec<usize>;
    /// Makes `value` mandatory. Returns false when it already was mandatory.
    /// A Contradiction is returned when the value is forbidden.
    ///
    /// # Panics
    /// When the value lies outside of the ground set
    fn add_to_kernel(&mut self, var: SetVar, value: usize, cause: Cause) -> CPResult<bool>;
    /// Forbids `value`. Returns false when it already was forbidden.
    /// A Contradiction is returned when the value is mandatory.
    ///
    /// # Panics
    /// When the value lies outside of the ground set
    fn remove_from_envelope(&mut self, var: SetVar, value: usize, cause: Cause)
        -> CPResult<bool>;

    // --- graph variables ---------------------------------------------------
    /// Creates a new directed graph variable over the nodes `0..n`. The
    /// kernel is empty and the envelope is the complete digraph (loops
    /// included).
    fn new_graph_var(&mut self, n: usize) -> GraphVar;
    /// Returns the number of nodes the graph is defined upon
    fn nb_nodes(&self, var: GraphVar) -> usize;
    /// Returns true iff node `i` is mandatory
    fn node_in_kernel(&self, var: GraphVar, i: usize) -> bool;
    /// Returns true iff node `i` is possible
    fn node_in_envelope(&self, var: GraphVar, i: usize) -> bool;
    /// Returns true iff the arc `i -> j` is mandatory
    fn arc_in_kernel(&self, var: GraphVar, i: usize, j: usize) -> bool;
    /// Returns true iff the arc `i -> j` is possible
    fn arc_in_envelope(&self, var: GraphVar, i: usize, j: usize) -> bool;
    /// Returns the mandatory nodes (sorted)
    fn kernel_nodes(&self, var: GraphVar) -> Vec<usize>;
    /// Returns the possible nodes (sorted)
    fn envelope_nodes(&self, var: GraphVar) -> Vec<usize>;
    /// Returns the mandatory successors of node `i` (sorted)
    fn kernel_successors(&self, var: GraphVar, i: usize) -> Vec<usize>;
    /// Returns the possible successors of node `i` (sorted)
    fn envelope_successors(&self, var: GraphVar, i: usize) -> Vec<usize>;
    /// Makes node `i` mandatory. Returns false when it already was.
    fn enforce_node(&mut self, var: GraphVar, i: usize, cause: Cause) -> CPResult<bool>;
    /// Forbids node `i` together with all its incident arcs. Returns false
    /// when it already was forbidden.
    fn remove_node(&mut self, var: GraphVar, i: usize, cause: Cause) -> CPResult<bool>;
    /// Makes the arc `i -> j` mandatory (and both its endpoints). Returns
    /// false when it already was.
    fn enforce_arc(&mut self, var: GraphVar, i: usize, j: usize, cause: Cause) -> CPResult<bool>;
    /// Forbids the arc `i -> j`. Returns false when it already was forbidden.
    fn remove_arc(&mut self, var: GraphVar, i: usize, j: usize, cause: Cause) -> CPResult<bool>;
}

/// The domain broker is the facet of the domain store which is in charge of
/// tracking all changes occurring in the domain of the variables. A domain
/// broker is the object which is used by the engine to schedule the
/// propagation of the various propagators.
pub trait DomainBroker {
    /// goes over all the events that have occurred on the variables
    fn for_each_event<F: FnMut(PendingEvent)>(&self, f: F);
    /// forgets all events that have happened on the variables
    fn clear_events(&mut self);
    /// forgets the change logs of all variables
    fn clear_deltas(&mut self);
    /// returns true iff some events are waiting to be dispatched
    fn has_events(&self) -> bool;
    /// tells which propagator is being executed (if any)
    fn set_running(&mut self, propagator: Option<PropagatorId>);
}

/// The representation of a graph domain
#[derive(Debug, Clone)]
struct GraphDomain {
    /// the nodes of the graph
    nodes: ReversibleBoundedSet,
    /// the successors of each node
    successors: Vec<ReversibleBoundedSet>,
}

/// The domain of a variable, depending on its kind
#[derive(Debug, Clone)]
enum VariableDomain {
    Int(ReversibleSparseSet),
    Set(ReversibleBoundedSet),
    Graph(GraphDomain),
}

/// This is a simple implementation of a domain store. It implements both the
/// DomainStore and the DomainBroker traits, which means it really is an entity
/// that encompasses the complete lifecycle of a variable (but has nothing to
/// do with the higher level constructs that *use* the events applied to these
/// variables)
#[derive(Debug, Clone)]
pub struct DomainStoreImpl<T: StateManager> {
    /// The state manager in charge of saving/restoring the domains states
    state: T,
    /// How many variables are there right now ?
    n_vars: ReversibleInt,
    /// The domains of all variables (some of them might be dead after a
    /// rollback; the live ones are the `n_vars` first)
    domains: Vec<VariableDomain>,
    /// The change log of each variable
    deltas: Vec<DeltaLog>,
    /// How many times the change logs have been cleared
    delta_epoch: usize,
    /// The events that are waiting to be dispatched
    events: EventSink,
    /// The propagator which is currently being executed (if any)
    running: Option<PropagatorId>,
}

impl<T: StateManager> DomainStoreImpl<T> {
    /// Creates a new instance of the domain store based on the given state
    /// manager
    pub fn new(mut state: T) -> Self {
        let n_vars = state.manage_int(0);
        Self {
            state,
            n_vars,
            domains: vec![],
            deltas: vec![],
            delta_epoch: 0,
            events: EventSink::default(),
            running: None,
        }
    }
    /// Returns the underlying state manager
    pub fn state_manager(&self) -> &T {
        &self.state
    }
    /// Returns the underlying state manager in a mutable way
    pub fn state_manager_mut(&mut self) -> &mut T {
        &mut self.state
    }

    /// Registers a freshly created domain and returns the new variable.
    /// The slots of the variables that died on a rollback are recycled.
    fn register(&mut self, domain: VariableDomain) -> Variable {
        let id = self.nb_vars();
        self.domains.truncate(id);
        self.deltas.truncate(id);
        self.domains.push(domain);
        self.deltas.push(DeltaLog::default());
        self.state.increment(self.n_vars);
        Variable(id)
    }
    fn domain(&self, var: Variable) -> &VariableDomain {
        assert!(var.0 < self.nb_vars(), "{var:?} is no longer alive");
        &self.domains[var.0]
    }
    fn int_domain(&self, var: IntVar) -> ReversibleSparseSet {
        match self.domain(var.0) {
            VariableDomain::Int(dom) => *dom,
            _ => panic!("{var:?} is not an integer variable"),
        }
    }
    fn set_domain(&self, var: SetVar) -> ReversibleBoundedSet {
        match self.domain(var.0) {
            VariableDomain::Set(dom) => *dom,
            _ => panic!("{var:?} is not a set variable"),
        }
    }
    fn graph_domain(&self, var: GraphVar) -> &GraphDomain {
        match self.domain(var.0) {
            VariableDomain::Graph(dom) => dom,
            _ => panic!("{var:?} is not a graph variable"),
        }
    }
    fn graph_nodes(&self, var: GraphVar) -> ReversibleBoundedSet {
        self.graph_domain(var).nodes
    }
    fn graph_successors(&self, var: GraphVar, i: usize) -> ReversibleBoundedSet {
        let dom = self.graph_domain(var);
        assert!(i < dom.successors.len(), "{var:?} has no node {i}");
        dom.successors[i]
    }

    /// Appends a change to the log of the variable and notifies it to the
    /// event sink
    fn record(&mut self, var: Variable, event: DomainEvent, first: usize, second: usize, cause: Cause) {
        self.deltas[var.0].push(DeltaEntry {
            event,
            first,
            second,
            cause,
        });
        self.events.push(var, event, cause);
    }
    /// Notifies the event sink of the events on an integer variable
    fn notify(&mut self, var: IntVar, mask: EventMask, cause: Cause) {
        for event in mask.iter() {
            self.events.push(var.0, event, cause);
        }
    }

    fn bounded_values(&self, set: ReversibleBoundedSet, kernel: bool) -> Vec<usize> {
        let mut out = vec![];
        if kernel {
            self.state.bounded_set_for_each_kernel(set, |v| out.push(v));
        } else {
            self.state.bounded_set_for_each_envelope(set, |v| out.push(v));
        }
        out.sort_unstable();
        out
    }
    fn bounded_is_instantiated(&self, set: ReversibleBoundedSet) -> bool {
        self.state.bounded_set_kernel_size(set) == self.state.bounded_set_envelope_size(set)
    }
    fn check_ground(&self, set: ReversibleBoundedSet, value: usize, var: Variable) {
        assert!(
            value < self.state.bounded_set_capacity(set),
            "{value} is not in the ground set of {var:?}"
        );
    }
    /// The arcs in the kernel of a graph only connect nodes of its kernel
    fn graph_is_consistent(&self, var: GraphVar) -> bool {
        let dom = self.graph_domain(var);
        (0..dom.successors.len()).all(|i| {
            self.bounded_values(dom.successors[i], true)
                .iter()
                .all(|&j| {
                    self.state.bounded_set_kernel_contains(dom.nodes, i)
                        && self.state.bounded_set_kernel_contains(dom.nodes, j)
                })
        })
    }
    /// Clears the events and change logs that no longer mean anything
    fn forget_changes(&mut self) {
        self.events.clear();
        self.clear_deltas();
    }
}

impl<T: StateManager> From<T> for DomainStoreImpl<T> {
    fn from(state: T) -> Self {
        Self::new(state)
    }
}
impl<T: StateManager + Default> Default for DomainStoreImpl<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: StateManager> DomainStore for DomainStoreImpl<T> {
    fn nb_vars(&self) -> usize {
        self.state.get_int(self.n_vars) as usize
    }

    fn is_instantiated(&self, var: Variable) -> bool {
        match self.domain(var) {
            VariableDomain::Int(dom) => self.state.sparse_set_size(*dom) == 1,
            VariableDomain::Set(dom) => self.bounded_is_instantiated(*dom),
            VariableDomain::Graph(dom) => {
                self.bounded_is_instantiated(dom.nodes)
                    && dom
                        .successors
                        .iter()
                        .all(|s| self.bounded_is_instantiated(*s))
            }
        }
    }

    fn snapshot(&self, var: Variable) -> DomainSnapshot {
        match self.domain(var) {
            VariableDomain::Int(dom) => {
                let mut values = vec![];
                self.state.sparse_set_for_each(*dom, |v| values.push(v));
                values.sort_unstable();
                DomainSnapshot::Int(values)
            }
            VariableDomain::Set(dom) => DomainSnapshot::Set {
                kernel: self.bounded_values(*dom, true),
                envelope: self.bounded_values(*dom, false),
            },
            VariableDomain::Graph(dom) => {
                let arcs = |kernel: bool| {
                    let mut arcs = vec![];
                    for (i, succ) in dom.successors.iter().enumerate() {
                        for j in self.bounded_values(*succ, kernel) {
                            arcs.push((i, j));
                        }
                    }
                    arcs
                };
                DomainSnapshot::Graph {
                    kernel_nodes: self.bounded_values(dom.nodes, true),
                    envelope_nodes: self.bounded_values(dom.nodes, false),
                    kernel_arcs: arcs(true),
                    envelope_arcs: arcs(false),
                }
            }
        }
    }

    fn delta(&self, var: Variable) -> &DeltaLog {
        assert!(var.0 < self.nb_vars(), "{var:?} is no longer alive");
        &self.deltas[var.0]
    }

    fn delta_epoch(&self) -> usize {
        self.delta_epoch
    }

    fn running(&self) -> Option<PropagatorId> {
        self.running
    }

    // --- integer variables -------------------------------------------------
    fn new_int_var(&mut self, min: isize, max: isize) -> IntVar {
        assert!(min <= max, "cannot create an empty integer variable");
        let n = (max - min + 1) as usize;
        let domain = self.state.manage_sparse_set(n, min);
        IntVar(self.register(VariableDomain::Int(domain)))
    }

    fn min(&self, var: IntVar) -> Option<isize> {
        self.state.sparse_set_get_min(self.int_domain(var))
    }

    fn max(&self, var: IntVar) -> Option<isize> {
        self.state.sparse_set_get_max(self.int_domain(var))
    }

    fn size(&self, var: IntVar) -> usize {
        self.state.sparse_set_size(self.int_domain(var))
    }

    fn contains(&self, var: IntVar, value: isize) -> bool {
        self.state.sparse_set_contains(self.int_domain(var), value)
    }

    fn fix(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        if !self.contains(var, value) {
            return Err(Contradiction::new(var.into(), cause, ContradictionReason::DomainWipeout));
        }
        if self.is_fixed(var) {
            // if there is nothing to do, then we're done
            return Ok(());
        }
        let mut mask = DomainEvent::Instantiate | DomainEvent::Removal;
        if self.min(var) != Some(value) {
            mask |= DomainEvent::LowerBound;
        }
        if self.max(var) != Some(value) {
            mask |= DomainEvent::UpperBound;
        }
        let dom = self.int_domain(var);
        self.state.sparse_set_remove_all_but(dom, value);
        self.notify(var, mask, cause);
        Ok(())
    }

    fn remove(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        if !self.contains(var, value) {
            // there is nothing to do
            return Ok(());
        }
        if self.is_fixed(var) {
            return Err(Contradiction::new(var.into(), cause, ContradictionReason::DomainWipeout));
        }
        let mut mask = EventMask::only(DomainEvent::Removal);
        if self.min(var) == Some(value) {
            mask |= DomainEvent::LowerBound;
        }
        if self.max(var) == Some(value) {
            mask |= DomainEvent::UpperBound;
        }
        let dom = self.int_domain(var);
        self.state.sparse_set_remove(dom, value);
        if self.is_fixed(var) {
            mask |= DomainEvent::Instantiate;
        }
        self.notify(var, mask, cause);
        Ok(())
    }

    fn remove_below(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        match (self.min(var), self.max(var)) {
            (Some(min), _) if min >= value => Ok(()),
            (_, Some(max)) if max < value => Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::DomainWipeout,
            )),
            _ => {
                let dom = self.int_domain(var);
                self.state.sparse_set_remove_below(dom, value);
                let mut mask = DomainEvent::LowerBound | DomainEvent::Removal;
                if self.is_fixed(var) {
                    mask |= DomainEvent::Instantiate;
                }
                self.notify(var, mask, cause);
                Ok(())
            }
        }
    }

    fn remove_above(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        match (self.min(var), self.max(var)) {
            (_, Some(max)) if max <= value => Ok(()),
            (Some(min), _) if min > value => Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::DomainWipeout,
            )),
            _ => {
                let dom = self.int_domain(var);
                self.state.sparse_set_remove_above(dom, value);
                let mut mask = DomainEvent::UpperBound | DomainEvent::Removal;
                if self.is_fixed(var) {
                    mask |= DomainEvent::Instantiate;
                }
                self.notify(var, mask, cause);
                Ok(())
            }
        }
    }

    // --- set variables -----------------------------------------------------
    fn new_set_var(&mut self, n: usize) -> SetVar {
        let domain = self.state.manage_bounded_set(n);
        SetVar(self.register(VariableDomain::Set(domain)))
    }

    fn ground_size(&self, var: SetVar) -> usize {
        self.state.bounded_set_capacity(self.set_domain(var))
    }

    fn kernel_contains(&self, var: SetVar, value: usize) -> bool {
        self.state.bounded_set_kernel_contains(self.set_domain(var), value)
    }

    fn envelope_contains(&self, var: SetVar, value: usize) -> bool {
        self.state.bounded_set_envelope_contains(self.set_domain(var), value)
    }

    fn kernel_size(&self, var: SetVar) -> usize {
        self.state.bounded_set_kernel_size(self.set_domain(var))
    }

    fn envelope_size(&self, var: SetVar) -> usize {
        self.state.bounded_set_envelope_size(self.set_domain(var))
    }

    fn kernel_values(&self, var: SetVar) -> Vec<usize> {
        self.bounded_values(self.set_domain(var), true)
    }

    fn envelope_values(&self, var: SetVar) -> Vec<usize> {
        self.bounded_values(self.set_domain(var), false)
    }

    fn add_to_kernel(&mut self, var: SetVar, value: usize, cause: Cause) -> CPResult<bool> {
        let set = self.set_domain(var);
        self.check_ground(set, value, var.into());

        if self.state.bounded_set_kernel_contains(set, value) {
            return Ok(false);
        }
        if !self.state.bounded_set_envelope_contains(set, value) {
            return Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::EnforceForbidden(Element::Value(value)),
            ));
        }
        self.state.bounded_set_enforce(set, value);
        self.record(var.into(), DomainEvent::AddToKernel, value, 0, cause);
        Ok(true)
    }

    fn remove_from_envelope(&mut self, var: SetVar, value: usize, cause: Cause) -> CPResult<bool> {
        let set = self.set_domain(var);
        self.check_ground(set, value, var.into());

        if !self.state.bounded_set_envelope_contains(set, value) {
            return Ok(false);
        }
        if self.state.bounded_set_kernel_contains(set, value) {
            return Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::RemoveMandatory(Element::Value(value)),
            ));
        }
        self.state.bounded_set_remove(set, value);
        self.record(var.into(), DomainEvent::RemoveFromEnvelope, value, 0, cause);
        Ok(true)
    }

    // --- graph variables ---------------------------------------------------
    fn new_graph_var(&mut self, n: usize) -> GraphVar {
        let nodes = self.state.manage_bounded_set(n);
        let successors = (0..n).map(|_| self.state.manage_bounded_set(n)).collect();
        GraphVar(self.register(VariableDomain::Graph(GraphDomain { nodes, successors })))
    }

    fn nb_nodes(&self, var: GraphVar) -> usize {
        self.graph_domain(var).successors.len()
    }

    fn node_in_kernel(&self, var: GraphVar, i: usize) -> bool {
        self.state.bounded_set_kernel_contains(self.graph_nodes(var), i)
    }

    fn node_in_envelope(&self, var: GraphVar, i: usize) -> bool {
        self.state.bounded_set_envelope_contains(self.graph_nodes(var), i)
    }

    fn arc_in_kernel(&self, var: GraphVar, i: usize, j: usize) -> bool {
        i < self.nb_nodes(var)
            && self.state.bounded_set_kernel_contains(self.graph_successors(var, i), j)
    }

    fn arc_in_envelope(&self, var: GraphVar, i: usize, j: usize) -> bool {
        i < self.nb_nodes(var)
            && self.state.bounded_set_envelope_contains(self.graph_successors(var, i), j)
    }

    fn kernel_nodes(&self, var: GraphVar) -> Vec<usize> {
        self.bounded_values(self.graph_nodes(var), true)
    }

    fn envelope_nodes(&self, var: GraphVar) -> Vec<usize> {
        self.bounded_values(self.graph_nodes(var), false)
    }

    fn kernel_successors(&self, var: GraphVar, i: usize) -> Vec<usize> {
        self.bounded_values(self.graph_successors(var, i), true)
    }

    fn envelope_successors(&self, var: GraphVar, i: usize) -> Vec<usize> {
        self.bounded_values(self.graph_successors(var, i), false)
    }

    fn enforce_node(&mut self, var: GraphVar, i: usize, cause: Cause) -> CPResult<bool> {
        let nodes = self.graph_nodes(var);
        self.check_ground(nodes, i, var.into());

        if self.state.bounded_set_kernel_contains(nodes, i) {
            return Ok(false);
        }
        if !self.state.bounded_set_envelope_contains(nodes, i) {
            return Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::EnforceForbidden(Element::Node(i)),
            ));
        }
        self.state.bounded_set_enforce(nodes, i);
        self.record(var.into(), DomainEvent::EnforceNode, i, 0, cause);
        Ok(true)
    }

    fn remove_node(&mut self, var: GraphVar, i: usize, cause: Cause) -> CPResult<bool> {
        let nodes = self.graph_nodes(var);
        self.check_ground(nodes, i, var.into());

        if !self.state.bounded_set_envelope_contains(nodes, i) {
            return Ok(false);
        }
        if self.state.bounded_set_kernel_contains(nodes, i) {
            return Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::RemoveMandatory(Element::Node(i)),
            ));
        }
        // a node which is not mandatory has no mandatory incident arc
        for j in self.envelope_successors(var, i) {
            self.remove_arc(var, i, j, cause)?;
        }
        for j in 0..self.nb_nodes(var) {
            self.remove_arc(var, j, i, cause)?;
        }
        self.state.bounded_set_remove(nodes, i);
        self.record(var.into(), DomainEvent::RemoveNode, i, 0, cause);

        trailcp_assert_advanced!(self.graph_is_consistent(var));
        Ok(true)
    }

    fn enforce_arc(&mut self, var: GraphVar, i: usize, j: usize, cause: Cause) -> CPResult<bool> {
        let succ = self.graph_successors(var, i);
        self.check_ground(succ, j, var.into());

        if self.state.bounded_set_kernel_contains(succ, j) {
            return Ok(false);
        }
        if !self.state.bounded_set_envelope_contains(succ, j) {
            return Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::EnforceForbidden(Element::Arc(i, j)),
            ));
        }
        self.enforce_node(var, i, cause)?;
        self.enforce_node(var, j, cause)?;
        self.state.bounded_set_enforce(succ, j);
        self.record(var.into(), DomainEvent::EnforceArc, i, j, cause);

        trailcp_assert_extreme!(self.graph_is_consistent(var));
        Ok(true)
    }

    fn remove_arc(&mut self, var: GraphVar, i: usize, j: usize, cause: Cause) -> CPResult<bool> {
        let succ = self.graph_successors(var, i);
        self.check_ground(succ, j, var.into());

        if !self.state.bounded_set_envelope_contains(succ, j) {
            return Ok(false);
        }
        if self.state.bounded_set_kernel_contains(succ, j) {
            return Err(Contradiction::new(
                var.into(),
                cause,
                ContradictionReason::RemoveMandatory(Element::Arc(i, j)),
            ));
        }
        self.state.bounded_set_remove(succ, j);
        self.record(var.into(), DomainEvent::RemoveArc, i, j, cause);
        Ok(true)
    }
}

impl<T: StateManager> DomainBroker for DomainStoreImpl<T> {
    fn for_each_event<F: FnMut(PendingEvent)>(&self, f: F) {
        self.events.iter().copied().for_each(f)
    }

    fn clear_events(&mut self) {
        self.events.clear()
    }

    fn clear_deltas(&mut self) {
        self.deltas.iter_mut().for_each(DeltaLog::clear);
        self.delta_epoch += 1;
    }

    fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn set_running(&mut self, propagator: Option<PropagatorId>) {
        self.running = propagator;
    }
}

impl<T: StateManager> SaveAndRestore for DomainStoreImpl<T> {
    fn save_state(&mut self) {
        self.state.save_state()
    }

    fn restore_state(&mut self) {
        self.state.restore_state();
        self.forget_changes();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.state.checkpoint()
    }

    fn rollback(&mut self, mark: Checkpoint) {
        self.state.rollback(mark);
        self.forget_changes();
    }

    fn depth(&self) -> usize {
        self.state.depth()
    }
}

// #############################################################################
// ### UNIT TESTS ##############################################################
// #############################################################################



#[cfg(test)]
mod test_domainstoreimpl_graph {
    use crate::{
        Cause, ContradictionReason, DomainEvent, DomainStore, DomainStoreImpl, Element,
        TrailedStateManager,
    };

    type Store = DomainStoreImpl<TrailedStateManager>;

    #[test]
    fn a_fresh_graph_is_the_complete_digraph() {
        let mut store = Store::default();
        let g = store.new_graph_var(3);

        assert_eq!(3, store.nb_nodes(g));
        assert!(store.kernel_nodes(g).is_empty());
        assert_eq!(vec![0, 1, 2], store.envelope_nodes(g));
        for i in 0..3 {
            assert_eq!(vec![0, 1, 2], store.envelope_successors(g, i));
            assert!(store.kernel_successors(g, i).is_empty());
        }
    }

    #[test]
    fn enforcing_an_arc_enforces_its_endpoints() {
        let mut store = Store::default();
        let g = store.new_graph_var(4);

        assert_eq!(Ok(true), store.enforce_arc(g, 1, 3, Cause::Decision));
        assert_eq!(Ok(false), store.enforce_arc(g, 1, 3, Cause::Decision));
        assert!(store.arc_in_kernel(g, 1, 3));
        assert_eq!(vec![1, 3], store.kernel_nodes(g));

        let events = (0..store.delta(g.into()).len())
            .map(|i| store.delta(g.into()).get(i).event)
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                DomainEvent::EnforceNode,
                DomainEvent::EnforceNode,
                DomainEvent::EnforceArc
            ],
            events
        );
    }

    #[test]
    fn removing_a_node_removes_its_incident_arcs() {
        let mut store = Store::default();
        let g = store.new_graph_var(3);

        assert_eq!(Ok(true), store.remove_node(g, 1, Cause::Decision));
        assert_eq!(vec![0, 2], store.envelope_nodes(g));
        assert!(store.envelope_successors(g, 1).is_empty());
        assert_eq!(vec![0, 2], store.envelope_successors(g, 0));
        assert_eq!(vec![0, 2], store.envelope_successors(g, 2));

        let err = store.enforce_arc(g, 0, 1, Cause::Decision).unwrap_err();
        assert_eq!(
            ContradictionReason::EnforceForbidden(Element::Arc(0, 1)),
            err.reason
        );
    }

    #[test]
    fn a_mandatory_node_cannot_be_removed() {
        let mut store = Store::default();
        let g = store.new_graph_var(3);
        store.enforce_arc(g, 0, 2, Cause::Decision).unwrap();

        let err = store.remove_node(g, 2, Cause::Decision).unwrap_err();
        assert_eq!(
            ContradictionReason::RemoveMandatory(Element::Node(2)),
            err.reason
        );
        let err = store.remove_arc(g, 0, 2, Cause::Decision).unwrap_err();
        assert_eq!(
            ContradictionReason::RemoveMandatory(Element::Arc(0, 2)),
            err.reason
        );
    }

    #[test]
    fn a_graph_is_instantiated_when_all_its_parts_are() {
        let mut store = Store::default();
        let g = store.new_graph_var(2);

        store.enforce_arc(g, 0, 1, Cause::Decision).unwrap();
        store.remove_arc(g, 0, 0, Cause::Decision).unwrap();
        store.remove_arc(g, 1, 0, Cause::Decision).unwrap();
        assert!(!store.is_instantiated(g.into()));
        store.remove_arc(g, 1, 1, Cause::Decision).unwrap();
        assert!(store.is_instantiated(g.into()));
    }
}
