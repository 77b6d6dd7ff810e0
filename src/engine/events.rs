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

//! This module defines the events which can happen to the domain of a
//! variable, and the sink in which the domain store collects them until the
//! engine dispatches them to the subscribed propagators.

use std::fmt::Display;

use enumset::{EnumSet, EnumSetType};

use crate::{Cause, Variable};

/// An event that tells what happened to the domain of a variable
#[derive(Debug, EnumSetType, Hash)]
pub enum DomainEvent {
    /// The domain of an integer variable collapsed to a single value
    Instantiate,
    /// The lower bound of an integer variable increased
    LowerBound,
    /// The upper bound of an integer variable decreased
    UpperBound,
    /// Some value was removed from the domain of an integer variable
    Removal,
    /// A value entered the kernel of a set variable
    AddToKernel,
    /// A value left the envelope of a set variable
    RemoveFromEnvelope,
    /// A node entered the kernel of a graph variable
    EnforceNode,
    /// A node left the envelope of a graph variable
    RemoveNode,
    /// An arc entered the kernel of a graph variable
    EnforceArc,
    /// An arc left the envelope of a graph variable
    RemoveArc,
}

/// The set of events a propagator wants to be woken up on
pub type EventMask = EnumSet<DomainEvent>;

impl Display for DomainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainEvent::Instantiate => write!(f, "[Event:Instantiate]"),
            DomainEvent::LowerBound => write!(f, "[Event:LB]"),
            DomainEvent::UpperBound => write!(f, "[Event:UB]"),
            DomainEvent::Removal => write!(f, "[Event:Remove]"),
            DomainEvent::AddToKernel => write!(f, "[Event:AddToKernel]"),
            DomainEvent::RemoveFromEnvelope => write!(f, "[Event:RemoveFromEnvelope]"),
            DomainEvent::EnforceNode => write!(f, "[Event:EnforceNode]"),
            DomainEvent::RemoveNode => write!(f, "[Event:RemoveNode]"),
            DomainEvent::EnforceArc => write!(f, "[Event:EnforceArc]"),
            DomainEvent::RemoveArc => write!(f, "[Event:RemoveArc]"),
        }
    }
}

/// A batch of events that occurred on one variable because of one cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEvent {
    /// This is the variable impacted by a change in its domain
    pub variable: Variable,
    /// What happened to it
    pub mask: EventMask,
    /// Who did it
    pub cause: Cause,
}

/// The event sink collects the events in the order they occur. Consecutive
/// events on the same variable with the same cause are merged.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    events: Vec<PendingEvent>,
}
impl EventSink {
    /// Records that `event` occurred on `variable` because of `cause`
    pub fn push(&mut self, variable: Variable, event: DomainEvent, cause: Cause) {
        match self.events.last_mut() {
            Some(last) if last.variable == variable && last.cause == cause => {
                last.mask |= event;
            }
            _ => self.events.push(PendingEvent {
                variable,
                mask: EventMask::only(event),
                cause,
            }),
        }
    }
    /// Returns true iff no event is pending
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
    /// Goes over all the pending events, in the order they occurred
    pub fn iter(&self) -> impl Iterator<Item = &PendingEvent> + '_ {
        self.events.iter()
    }
    /// Forgets all pending events
    pub fn clear(&mut self) {
        self.events.clear()
    }
}

#[cfg(test)]
mod test_event_sink {
    use crate::{Cause, DomainEvent, EventMask, EventSink, PropagatorId, Variable};

    #[test]
    fn consecutive_events_with_the_same_origin_are_merged() {
        let mut sink = EventSink::default();
        sink.push(Variable(0), DomainEvent::Removal, Cause::Decision);
        sink.push(Variable(0), DomainEvent::LowerBound, Cause::Decision);

        let events = sink.iter().copied().collect::<Vec<_>>();
        assert_eq!(1, events.len());
        assert_eq!(
            DomainEvent::Removal | DomainEvent::LowerBound,
            events[0].mask
        );
    }

    #[test]
    fn events_with_another_origin_are_kept_apart() {
        let mut sink = EventSink::default();
        let p = Cause::Propagator(PropagatorId(0));
        sink.push(Variable(0), DomainEvent::AddToKernel, Cause::Decision);
        sink.push(Variable(0), DomainEvent::AddToKernel, p);
        sink.push(Variable(1), DomainEvent::AddToKernel, p);
        sink.push(Variable(0), DomainEvent::RemoveFromEnvelope, p);

        let events = sink.iter().copied().collect::<Vec<_>>();
        assert_eq!(4, events.len());
        assert_eq!(Cause::Decision, events[0].cause);
        assert_eq!(Variable(1), events[2].variable);
        assert_eq!(EventMask::only(DomainEvent::RemoveFromEnvelope), events[3].mask);

        sink.clear();
        assert!(sink.is_empty());
    }
}
