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

//! This module provides the definition and implementation of the
//! propagation engine.

use log::{debug, trace};

use crate::{
    trailcp_assert_eq_simple, BoolManager, CPResult, Cause, Checkpoint, DeltaLog, DomainBroker,
    DomainSnapshot, DomainStore, DomainStoreImpl, Entailment, EventMask, GraphVar, IntManager,
    IntVar, Propagator, PropagatorId, PropagatorInitialisationContext, PropagatorPriority,
    PropagatorQueue, ReversibleBool, ReversibleInt, SaveAndRestore, SetVar, StateManager,
    TrailedStateManager, Variable,
};

/// Where a propagator stands in the propagation process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropagatorState {
    /// Nothing to do
    Idle,
    /// Waiting in the propagation queue
    Scheduled,
    /// Being executed. While it runs, a propagator only sees the domain
    /// store, which tells who is running through `DomainStore::running`.
    Running,
}

/// A constraint store is the entity responsible for storing the propagators
/// (hence the name), and running them when the domains of the variables
/// change until a fixpoint is reached.
pub trait ConstraintStore {
    /// Posts the given propagator and schedules its complete filtering
    fn post(&mut self, propagator: Box<dyn Propagator>) -> PropagatorId;
    /// Propagate all constraints until a fixpoint is reached. When a
    /// contradiction is detected, all the remaining work is dropped and the
    /// contradiction is returned.
    fn fixpoint(&mut self) -> CPResult<()>;
    /// Tells whether the constraint of the given propagator is satisfied,
    /// violated or undecided
    fn is_entailed(&self, propagator: PropagatorId) -> Entailment;
    /// Re-activates a propagator and schedules its complete filtering
    fn enable(&mut self, propagator: PropagatorId);
    /// De-activates a propagator until it is enabled again (or the state is
    /// restored to a point where it was active)
    fn disable(&mut self, propagator: PropagatorId);
    /// Returns true iff the propagator is active
    fn is_active(&self, propagator: PropagatorId) -> bool;
    /// Returns the current state of the propagator
    fn state(&self, propagator: PropagatorId) -> PropagatorState;
}

/// The basic expectation of a CP model is that it lets us create variables
/// (hence the DomainStore responsibility), post propagators bearing on
/// these variables (hence the ConstraintStore responsibility) and that its
/// state can be efficiently saved and restored to a previous snapshot during
/// the search for a satisfying -- or optimal -- solution (hence the
/// SaveAndRestore responsibility). A CP model *must* implement all three of
/// these responsibilities in order to match common expectations.
pub trait CpModel: DomainStore + ConstraintStore + SaveAndRestore {}

/// This is the type of the CP model you will likely want to work with. \
/// Currently, this is the only available implementation of a CP Model, but it
/// *might* possibly change in the future.
pub type DefaultCpModel = CpModelImpl<TrailedStateManager>;

/// A variable a propagator registered to
#[derive(Debug, Clone, Copy)]
struct Subscription {
    /// the subscriber
    propagator: PropagatorId,
    /// the index under which the subscriber knows the variable
    local_index: usize,
    /// the events the subscriber wants to react to
    mask: EventMask,
}

/// Everything the engine knows about a posted propagator
struct PropagatorData {
    /// the propagator itself
    propagator: Box<dyn Propagator>,
    /// its priority class (queried once at post time)
    priority: PropagatorPriority,
    /// whether the propagator has been enabled (or never disabled)
    enabled: ReversibleBool,
    /// whether the propagator has been found entailed
    entailed: ReversibleBool,
    /// the next run must be a complete filtering
    coarse: bool,
    /// the events waiting to be handled by the next fine grained run
    pending: Vec<(usize, EventMask)>,
}
impl PropagatorData {
    /// A propagator is passive when it is either entailed or disabled
    fn is_active<S: BoolManager>(&self, sm: &S) -> bool {
        sm.get_bool(self.enabled) && !sm.get_bool(self.entailed)
    }
}

/// This is a simple implementation of a propagation engine.
///
/// # Note
/// Because it would be very inconvenient to always force a client to go through
/// the domain store of the model, I let this struct be a domain store with
/// save and restore capabilities. The implementation of these traits is
/// simply delegated to another structure that actually implements some
/// business logic for it.
pub struct CpModelImpl<T: StateManager> {
    /// The domain store which is used to manage the problem variables
    domains: DomainStoreImpl<T>,
    /// These are the propagators that might be used to effectively trim down
    /// the variable domains
    propagators: Vec<PropagatorData>,
    /// This tracks the number of propagators that are alive at any given
    /// point in time. The point of this variable is to be able to drop the
    /// propagators as soon as they are no longer required.
    propagator_sz: ReversibleInt,
    /// The subscriptions of the propagators to each variable
    subscriptions: Vec<Vec<Subscription>>,
    /// The propagators which are scheduled for propagation
    queue: PropagatorQueue,
    /// For each open level, whether some propagation work was still waiting
    /// when it was opened
    unsettled_levels: Vec<bool>,
}
//------------------------------------------------------------------------------
// Obviously, we want a CpModelImpl to be an implementation of a CpModel
// even though it adds absolutely no behavior.
//------------------------------------------------------------------------------
impl<T: StateManager> CpModel for CpModelImpl<T> {}
//------------------------------------------------------------------------------
// Domain store facet
//------------------------------------------------------------------------------
impl<T: StateManager> DomainStore for CpModelImpl<T> {
    fn nb_vars(&self) -> usize {
        self.domains.nb_vars()
    }

    fn is_instantiated(&self, var: Variable) -> bool {
        self.domains.is_instantiated(var)
    }

    fn snapshot(&self, var: Variable) -> DomainSnapshot {
        self.domains.snapshot(var)
    }

    fn delta(&self, var: Variable) -> &DeltaLog {
        self.domains.delta(var)
    }

    fn delta_epoch(&self) -> usize {
        self.domains.delta_epoch()
    }

    fn running(&self) -> Option<PropagatorId> {
        self.domains.running()
    }

    fn new_int_var(&mut self, min: isize, max: isize) -> IntVar {
        self.domains.new_int_var(min, max)
    }

    fn new_bool_var(&mut self) -> IntVar {
        self.domains.new_bool_var()
    }

    fn min(&self, var: IntVar) -> Option<isize> {
        self.domains.min(var)
    }

    fn max(&self, var: IntVar) -> Option<isize> {
        self.domains.max(var)
    }

    fn size(&self, var: IntVar) -> usize {
        self.domains.size(var)
    }

    fn contains(&self, var: IntVar, value: isize) -> bool {
        self.domains.contains(var, value)
    }

    fn fix(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        self.domains.fix(var, value, cause)
    }

    fn remove(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        self.domains.remove(var, value, cause)
    }

    fn remove_below(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        self.domains.remove_below(var, value, cause)
    }

    fn remove_above(&mut self, var: IntVar, value: isize, cause: Cause) -> CPResult<()> {
        self.domains.remove_above(var, value, cause)
    }

    fn new_set_var(&mut self, n: usize) -> SetVar {
        self.domains.new_set_var(n)
    }

    fn ground_size(&self, var: SetVar) -> usize {
        self.domains.ground_size(var)
    }

    fn kernel_contains(&self, var: SetVar, value: usize) -> bool {
        self.domains.kernel_contains(var, value)
    }

    fn envelope_contains(&self, var: SetVar, value: usize) -> bool {
        self.domains.envelope_contains(var, value)
    }

    fn kernel_size(&self, var: SetVar) -> usize {
        self.domains.kernel_size(var)
    }

    fn envelope_size(&self, var: SetVar) -> usize {
        self.domains.envelope_size(var)
    }

    fn kernel_values(&self, var: SetVar) -> Vec<usize> {
        self.domains.kernel_values(var)
    }

    fn envelope_values(&self, var: SetVar) -> Vec<usize> {
        self.domains.envelope_values(var)
    }

    fn add_to_kernel(&mut self, var: SetVar, value: usize, cause: Cause) -> CPResult<bool> {
        self.domains.add_to_kernel(var, value, cause)
    }

    fn remove_from_envelope(&mut self, var: SetVar, value: usize, cause: Cause) -> CPResult<bool> {
        self.domains.remove_from_envelope(var, value, cause)
    }

    fn new_graph_var(&mut self, n: usize) -> GraphVar {
        self.domains.new_graph_var(n)
    }

    fn nb_nodes(&self, var: GraphVar) -> usize {
        self.domains.nb_nodes(var)
    }

    fn node_in_kernel(&self, var: GraphVar, i: usize) -> bool {
        self.domains.node_in_kernel(var, i)
    }

    fn node_in_envelope(&self, var: GraphVar, i: usize) -> bool {
        self.domains.node_in_envelope(var, i)
    }

    fn arc_in_kernel(&self, var: GraphVar, i: usize, j: usize) -> bool {
        self.domains.arc_in_kernel(var, i, j)
    }

    fn arc_in_envelope(&self, var: GraphVar, i: usize, j: usize) -> bool {
        self.domains.arc_in_envelope(var, i, j)
    }

    fn kernel_nodes(&self, var: GraphVar) -> Vec<usize> {
        self.domains.kernel_nodes(var)
    }

    fn envelope_nodes(&self, var: GraphVar) -> Vec<usize> {
        self.domains.envelope_nodes(var)
    }

    fn kernel_successors(&self, var: GraphVar, i: usize) -> Vec<usize> {
        self.domains.kernel_successors(var, i)
    }

    fn envelope_successors(&self, var: GraphVar, i: usize) -> Vec<usize> {
        self.domains.envelope_successors(var, i)
    }

    fn enforce_node(&mut self, var: GraphVar, i: usize, cause: Cause) -> CPResult<bool> {
        self.domains.enforce_node(var, i, cause)
    }

    fn remove_node(&mut self, var: GraphVar, i: usize, cause: Cause) -> CPResult<bool> {
        self.domains.remove_node(var, i, cause)
    }

    fn enforce_arc(&mut self, var: GraphVar, i: usize, j: usize, cause: Cause) -> CPResult<bool> {
        self.domains.enforce_arc(var, i, j, cause)
    }

    fn remove_arc(&mut self, var: GraphVar, i: usize, j: usize, cause: Cause) -> CPResult<bool> {
        self.domains.remove_arc(var, i, j, cause)
    }
}
//------------------------------------------------------------------------------
// Save and Restore management
//------------------------------------------------------------------------------
impl<T: StateManager> SaveAndRestore for CpModelImpl<T> {
    fn save_state(&mut self) {
        let unsettled = self.has_pending_work();
        self.unsettled_levels.push(unsettled);
        self.domains.save_state()
    }

    fn restore_state(&mut self) {
        self.domains.restore_state();
        let unsettled = self.unsettled_levels.pop().unwrap_or(false);
        self.drop_dead_propagators(unsettled);
    }

    fn checkpoint(&mut self) -> Checkpoint {
        let unsettled = self.has_pending_work();
        self.unsettled_levels.push(unsettled);
        self.domains.checkpoint()
    }

    fn rollback(&mut self, mark: Checkpoint) {
        self.domains.rollback(mark);
        let unsettled = self.unsettled_levels.get(mark.depth()).copied().unwrap_or(false);
        self.unsettled_levels.truncate(mark.depth());
        self.drop_dead_propagators(unsettled);
        debug!(
            "rolled back to depth {} ({} propagators alive)",
            mark.depth(),
            self.propagators.len()
        );
    }

    fn depth(&self) -> usize {
        self.domains.depth()
    }
}
//------------------------------------------------------------------------------
// Constraint store
//------------------------------------------------------------------------------
impl<T: StateManager> ConstraintStore for CpModelImpl<T> {
    fn post(&mut self, mut propagator: Box<dyn Propagator>) -> PropagatorId {
        let id = PropagatorId(self.prop_size());
        // the propagators which died on a rollback are dropped for good
        self.propagators.truncate(id.0);

        let mut context = PropagatorInitialisationContext::new(id, &self.domains);
        propagator.initialise(&mut context);
        let registrations = context.into_registrations();

        self.subscriptions.resize_with(self.domains.nb_vars(), Vec::new);
        for (local_index, (var, mask)) in registrations.into_iter().enumerate() {
            self.subscriptions[var.0].push(Subscription {
                propagator: id,
                local_index,
                mask,
            });
        }

        let enabled = self.sm_mut().manage_bool(true);
        let entailed = self.sm_mut().manage_bool(false);
        let priority = propagator.priority();
        debug!("post {} as {:?} ({:?})", propagator.name(), id, priority);
        self.propagators.push(PropagatorData {
            propagator,
            priority,
            enabled,
            entailed,
            coarse: false,
            pending: vec![],
        });
        self.inc_prop_size();

        self.schedule_coarse(id);
        id
    }

    fn fixpoint(&mut self) -> CPResult<()> {
        let result = self.run_to_fixpoint();
        match result {
            Ok(()) => trace!("fixpoint reached"),
            Err(contradiction) => {
                debug!("propagation failed: {contradiction}");
                self.queue.clear();
                for data in self.propagators.iter_mut() {
                    data.coarse = false;
                    data.pending.clear();
                }
                self.domains.clear_events();
            }
        }
        self.domains.clear_deltas();
        result
    }

    fn is_entailed(&self, propagator: PropagatorId) -> Entailment {
        let data = self.data(propagator);
        if self.sm().get_bool(data.entailed) {
            Entailment::True
        } else {
            data.propagator.entailment(&self.domains)
        }
    }

    fn enable(&mut self, propagator: PropagatorId) {
        let enabled = self.data(propagator).enabled;
        self.sm_mut().set_bool(enabled, true);
        self.schedule_coarse(propagator);
    }

    fn disable(&mut self, propagator: PropagatorId) {
        let enabled = self.data(propagator).enabled;
        self.sm_mut().set_bool(enabled, false);
        self.propagators[propagator.0].pending.clear();
    }

    fn is_active(&self, propagator: PropagatorId) -> bool {
        self.data(propagator).is_active(self.sm())
    }

    fn state(&self, propagator: PropagatorId) -> PropagatorState {
        if self.domains.running() == Some(propagator) {
            PropagatorState::Running
        } else if self.queue.contains(propagator) {
            PropagatorState::Scheduled
        } else {
            PropagatorState::Idle
        }
    }
}

impl<T: StateManager> From<T> for CpModelImpl<T> {
    fn from(sm: T) -> Self {
        Self::new(sm)
    }
}
impl<T: StateManager + Default> Default for CpModelImpl<T> {
    fn default() -> Self {
        Self::from(T::default())
    }
}
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// ~~~ UTILITY METHODS ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
impl<T: StateManager> CpModelImpl<T> {
    /// Creates a new instance of the propagation engine
    pub fn new(mut sm: T) -> Self {
        let propagator_sz = sm.manage_int(0);
        Self {
            domains: DomainStoreImpl::from(sm),
            propagators: vec![],
            propagator_sz,
            subscriptions: vec![],
            queue: PropagatorQueue::default(),
            unsettled_levels: vec![],
        }
    }
    /// Returns the number of propagators which are alive
    pub fn nb_propagators(&self) -> usize {
        self.prop_size()
    }
    /// Utility to reach the underlying state manager
    fn sm(&self) -> &T {
        self.domains.state_manager()
    }
    /// Utility to reach the underlying state manager in a mutable way
    fn sm_mut(&mut self) -> &mut T {
        self.domains.state_manager_mut()
    }
    /// returns the size of the propagators list
    fn prop_size(&self) -> usize {
        self.sm().get_int(self.propagator_sz) as usize
    }
    /// increments the size of the propagators list
    fn inc_prop_size(&mut self) -> usize {
        let var = self.propagator_sz;
        self.sm_mut().increment(var) as usize
    }
    /// returns the data of a live propagator
    fn data(&self, propagator: PropagatorId) -> &PropagatorData {
        assert!(
            propagator.0 < self.prop_size(),
            "{propagator:?} is no longer alive"
        );
        &self.propagators[propagator.0]
    }

    /// Returns true iff some events or some propagators are still waiting
    /// to be handled
    fn has_pending_work(&self) -> bool {
        !self.queue.is_empty() || self.domains.has_events()
    }

    /// Forgets about the propagators (and their subscriptions) which have
    /// been posted after the restored state, and drops all pending work.
    /// When the restored state was not a fixpoint, every live propagator is
    /// scheduled for a complete filtering instead.
    fn drop_dead_propagators(&mut self, unsettled: bool) {
        let n = self.prop_size();
        self.propagators.truncate(n);
        self.subscriptions.truncate(self.domains.nb_vars());
        for subs in self.subscriptions.iter_mut() {
            subs.retain(|s| s.propagator.0 < n);
        }
        self.queue.clear();
        for data in self.propagators.iter_mut() {
            data.coarse = false;
            data.pending.clear();
        }
        if unsettled {
            for id in (0..n).map(PropagatorId) {
                if self.propagators[id.0].is_active(self.sm()) {
                    self.schedule_coarse(id);
                }
            }
        }
    }

    /// Schedules the complete filtering of a propagator. Its pending fine
    /// grained events are dropped since the complete filtering covers them.
    fn schedule_coarse(&mut self, propagator: PropagatorId) {
        let data = &mut self.propagators[propagator.0];
        data.coarse = true;
        data.pending.clear();
        self.queue.enqueue(propagator, data.priority);
    }

    /// Hands the pending events over to the subscribed propagators and
    /// schedules them. A propagator is never woken up by its own
    /// modifications, nor when it is passive.
    fn dispatch_events(&mut self) {
        let domains = &self.domains;
        let subscriptions = &self.subscriptions;
        let propagators = &mut self.propagators;
        let queue = &mut self.queue;

        domains.for_each_event(|event| {
            let subscribers = subscriptions.get(event.variable.0).into_iter().flatten();
            for sub in subscribers {
                if event.cause == Cause::Propagator(sub.propagator) {
                    continue;
                }
                let hits = event.mask & sub.mask;
                if hits.is_empty() {
                    continue;
                }
                let data = &mut propagators[sub.propagator.0];
                if !data.is_active(domains.state_manager()) {
                    continue;
                }
                if !data.coarse {
                    match data.pending.iter_mut().find(|(i, _)| *i == sub.local_index) {
                        Some((_, mask)) => *mask |= hits,
                        None => data.pending.push((sub.local_index, hits)),
                    }
                }
                queue.enqueue(sub.propagator, data.priority);
            }
        });
        self.domains.clear_events();
    }

    /// Runs the scheduled propagators until there is nothing left to do
    fn run_to_fixpoint(&mut self) -> CPResult<()> {
        loop {
            self.dispatch_events();
            match self.queue.pop() {
                None => return Ok(()),
                Some(propagator) => self.run(propagator)?,
            }
        }
    }

    /// Executes one propagator, and makes it passive when it is entailed
    fn run(&mut self, propagator: PropagatorId) -> CPResult<()> {
        let data = &mut self.propagators[propagator.0];
        if !data.is_active(self.domains.state_manager()) {
            data.coarse = false;
            data.pending.clear();
            return Ok(());
        }

        self.domains.set_running(Some(propagator));
        let result = if data.coarse {
            data.coarse = false;
            data.pending.clear();
            trace!("propagate {} ({:?})", data.propagator.name(), propagator);
            data.propagator.propagate(&mut self.domains)
        } else {
            let pending = std::mem::take(&mut data.pending);
            trace!(
                "propagate {} ({:?}) on {:?}",
                data.propagator.name(),
                propagator,
                pending
            );
            pending.into_iter().try_for_each(|(local_index, mask)| {
                data.propagator
                    .propagate_on(&mut self.domains, local_index, mask)
            })
        };
        self.domains.set_running(None);
        result?;

        if data.propagator.entailment(&self.domains) == Entailment::True {
            trace!("{} ({:?}) is entailed", data.propagator.name(), propagator);
            trailcp_assert_eq_simple!(0, data.pending.len());
            self.domains.state_manager_mut().set_bool(data.entailed, true);
        }
        Ok(())
    }
}

// #############################################################################
// ### UNIT TESTS ##############################################################
// #############################################################################
