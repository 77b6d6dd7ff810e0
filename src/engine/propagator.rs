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

//! This module provides the definition of the traits and structures related
//! to the propagators.

use crate::{CPResult, DeltaMonitor, DomainStore, Entailment, EventMask, PropagatorId, Variable};

/// The priority class of a propagator. The engine always runs the scheduled
/// propagators of the cheapest class first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropagatorPriority {
    Unary,
    Binary,
    Ternary,
    Linear,
    Quadratic,
    Cubic,
    VerySlow,
}
impl PropagatorPriority {
    /// The number of priority classes
    pub const COUNT: usize = 7;

    /// Returns the position of this class in the scheduling order
    pub fn index(self) -> usize {
        self as usize
    }
}

/// The propagator is the portion of the code where the magic actually happens.
/// A propagator is called by the engine during the fixpoint computation. It
/// enforces a certain level of consistency on the domain of the variables it
/// works on.
///
/// A propagator comes with two entry points: `propagate` performs a complete
/// (coarse grained) filtering, `propagate_on` reacts to the events that
/// occurred on one of the variables it registered to (fine grained).
pub trait Propagator {
    /// A short name, used in the logs and diagnostics
    fn name(&self) -> &'static str;
    /// The priority class of this propagator
    fn priority(&self) -> PropagatorPriority;
    /// Called once when the propagator is posted. This is where the
    /// propagator registers to the events it wants to react to and creates
    /// its delta monitors.
    fn initialise(&mut self, context: &mut PropagatorInitialisationContext);
    /// Runs the complete filtering algorithm. This is what gets called right
    /// after the propagator is posted or enabled again.
    fn propagate(&mut self, store: &mut dyn DomainStore) -> CPResult<()>;
    /// Reacts to the events in `mask` that occurred on the variable which was
    /// registered with the given `local_index`. By default, this simply runs
    /// the complete filtering algorithm.
    fn propagate_on(
        &mut self,
        store: &mut dyn DomainStore,
        local_index: usize,
        mask: EventMask,
    ) -> CPResult<()> {
        let _ = (local_index, mask);
        self.propagate(store)
    }
    /// Tells whether the constraint enforced by this propagator is
    /// satisfied, violated or undecided given the current domains
    fn entailment(&self, store: &dyn DomainStore) -> Entailment;
}

/// The context a propagator is given at initialisation time
pub struct PropagatorInitialisationContext<'a> {
    /// The identifier the propagator is being posted with
    id: PropagatorId,
    /// A read only view on the domains
    store: &'a dyn DomainStore,
    /// The variables the propagator registered to (the position in this
    /// vector is the local index)
    registrations: Vec<(Variable, EventMask)>,
}
impl<'a> PropagatorInitialisationContext<'a> {
    pub(crate) fn new(id: PropagatorId, store: &'a dyn DomainStore) -> Self {
        Self {
            id,
            store,
            registrations: vec![],
        }
    }
    /// Returns the identifier of the propagator being posted
    pub fn propagator_id(&self) -> PropagatorId {
        self.id
    }
    /// Returns a read only view on the domains
    pub fn store(&self) -> &dyn DomainStore {
        self.store
    }
    /// Subscribes the propagator to the events of `mask` occurring on `var`,
    /// and returns the local index with which these events will be notified
    pub fn register<V: Into<Variable>>(&mut self, var: V, mask: EventMask) -> usize {
        self.registrations.push((var.into(), mask));
        self.registrations.len() - 1
    }
    /// Creates a delta monitor of `var` owned by the propagator
    pub fn monitor<V: Into<Variable>>(&self, var: V) -> DeltaMonitor {
        DeltaMonitor::new(var.into(), self.id)
    }
    pub(crate) fn into_registrations(self) -> Vec<(Variable, EventMask)> {
        self.registrations
    }
}

#[cfg(test)]
mod test_initialisation_context {
    use crate::prelude::*;

    #[test]
    fn local_indices_follow_the_registration_order() {
        let mut cp = DefaultCpModel::default();
        let x = cp.new_int_var(0, 3);
        let s = cp.new_set_var(3);

        let mut ctx = PropagatorInitialisationContext::new(PropagatorId(7), &cp);
        assert_eq!(0, ctx.register(x, EventMask::only(DomainEvent::Instantiate)));
        assert_eq!(1, ctx.register(s, EventMask::only(DomainEvent::AddToKernel)));
        assert_eq!(PropagatorId(7), ctx.propagator_id());
        assert_eq!(2, ctx.store().nb_vars());

        let monitor = ctx.monitor(s);
        assert_eq!(Variable::from(s), monitor.variable());
        assert!(!monitor.is_frozen());

        let regs = ctx.into_registrations();
        assert_eq!(Variable::from(x), regs[0].0);
        assert_eq!(EventMask::only(DomainEvent::AddToKernel), regs[1].1);
    }

    #[test]
    fn priorities_are_ordered_cheapest_first() {
        assert!(PropagatorPriority::Unary < PropagatorPriority::Linear);
        assert_eq!(0, PropagatorPriority::Unary.index());
        assert_eq!(
            PropagatorPriority::COUNT - 1,
            PropagatorPriority::VerySlow.index()
        );
    }
}
