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

//! This module provides the definition of the solver's core abstractions
//! (variables, causes, contradictions, entailment)

use std::fmt::Display;

//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~ VARIABLES ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// The identity of a variable, whatever its kind. This is a stable index in
/// the domain store that created it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(pub(crate) usize);
impl Variable {
    /// Returns the index of this variable in its domain store
    pub fn id(self) -> usize {
        self.0
    }
}

/// An integer variable (its domain is a finite set of integers)
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntVar(pub(crate) Variable);

/// A set variable. Its domain is a (kernel, envelope) pair of subsets of the
/// ground set `0..n`
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SetVar(pub(crate) Variable);

/// A directed graph variable over the nodes `0..n`. Both its nodes and the
/// successors of each node are represented as (kernel, envelope) pairs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphVar(pub(crate) Variable);

impl From<IntVar> for Variable {
    fn from(x: IntVar) -> Self {
        x.0
    }
}
impl From<SetVar> for Variable {
    fn from(x: SetVar) -> Self {
        x.0
    }
}
impl From<GraphVar> for Variable {
    fn from(x: GraphVar) -> Self {
        x.0
    }
}

//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~ CAUSES ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// The identifier of a propagator that has been posted on a model
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropagatorId(pub(crate) usize);
impl PropagatorId {
    /// Returns the index of this propagator in its model
    pub fn id(self) -> usize {
        self.0
    }
}

/// Who is responsible for a domain modification. Every narrowing operation
/// takes a cause. It is used to avoid waking a propagator up because of its
/// own modifications and to tell where a contradiction comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cause {
    /// The modification was made by the search layer
    Decision,
    /// The modification was made by the given propagator
    Propagator(PropagatorId),
}
impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cause::Decision => write!(f, "decision"),
            Cause::Propagator(p) => write!(f, "propagator #{}", p.0),
        }
    }
}

//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~ CONTRADICTIONS ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
//~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// The element of a set or graph domain a narrowing bore on
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    /// A value of a set variable
    Value(usize),
    /// A node of a graph variable
    Node(usize),
    /// An arc `from -> to` of a graph variable
    Arc(usize, usize),
}
impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Value(v) => write!(f, "value {v}"),
            Element::Node(n) => write!(f, "node {n}"),
            Element::Arc(i, j) => write!(f, "arc {i}->{j}"),
        }
    }
}

/// Why a contradiction has been raised
#[derive(Debug, Copy, Clone, thiserror::Error, PartialEq, Eq, Hash)]
pub enum ContradictionReason {
    /// The domain of an integer variable became empty
    #[error("domain wipe out")]
    DomainWipeout,
    /// Attempted to make mandatory an element which is already forbidden
    #[error("cannot enforce {0}: it is not in the envelope")]
    EnforceForbidden(Element),
    /// Attempted to forbid an element which is already mandatory
    #[error("cannot remove {0}: it is in the kernel")]
    RemoveMandatory(Element),
    /// A propagator detected a failure on its own
    #[error("failure detected by {0}")]
    Propagator(&'static str),
}

/// This is the kind of error that gets raised whenever a narrowing operation
/// or a propagator fails. A contradiction is always fatal to the current
/// fixpoint computation. It is the search layer's job to backtrack.
#[derive(Debug, Copy, Clone, thiserror::Error, PartialEq, Eq, Hash)]
#[error("contradiction ({cause}): {reason}")]
pub struct Contradiction {
    /// The variable whose domain could not be narrowed (if any)
    pub variable: Option<Variable>,
    /// Who attempted the faulty narrowing
    pub cause: Cause,
    /// What went wrong
    pub reason: ContradictionReason,
}
impl Contradiction {
    /// Creates a contradiction bearing on the given variable
    pub fn new(variable: Variable, cause: Cause, reason: ContradictionReason) -> Self {
        Self {
            variable: Some(variable),
            cause,
            reason,
        }
    }
    /// Creates a contradiction which has been detected by a propagator
    /// without being tied to a single variable
    pub fn detected_by(id: PropagatorId, name: &'static str) -> Self {
        Self {
            variable: None,
            cause: Cause::Propagator(id),
            reason: ContradictionReason::Propagator(name),
        }
    }
}

/// The result of a propagation operation. (Note: all propagation operations
/// can fail, in which case they raise a Contradiction error)
pub type CPResult<T> = Result<T, Contradiction>;

/// Whether a constraint is provably satisfied, provably violated or still
/// undecided given the current domains
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Entailment {
    /// The constraint holds for every assignment compatible with the domains
    True,
    /// The constraint holds for no assignment compatible with the domains
    False,
    /// Can't tell yet
    Undefined,
}

#[cfg(test)]
mod test_contradiction {
    use crate::{Cause, Contradiction, ContradictionReason, Element, PropagatorId, Variable};

    #[test]
    fn the_message_tells_who_failed_and_why() {
        let c = Contradiction::new(
            Variable(3),
            Cause::Propagator(PropagatorId(1)),
            ContradictionReason::EnforceForbidden(Element::Arc(0, 2)),
        );
        assert_eq!(
            "contradiction (propagator #1): cannot enforce arc 0->2: it is not in the envelope",
            c.to_string()
        );
    }

    #[test]
    fn a_detected_contradiction_bears_on_no_variable() {
        let c = Contradiction::detected_by(PropagatorId(4), "Foo");
        assert_eq!(None, c.variable);
        assert_eq!(Cause::Propagator(PropagatorId(4)), c.cause);
        assert_eq!("contradiction (propagator #4): failure detected by Foo", c.to_string());
    }
}
