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

//! This module provides the implementation of the not equal constraint.

use crate::prelude::*;

/// This constraint enforce that a variable take a different value from another
/// x != y
#[derive(Debug, Clone, Copy)]
pub struct NotEqualVar {
    x: IntVar,
    y: IntVar,
    cause: Cause,
}
impl NotEqualVar {
    /// Creates a not equal propagator
    pub fn new(x: IntVar, y: IntVar) -> Self {
        Self {
            x,
            y,
            cause: Cause::Decision,
        }
    }
    /// Removes the value of `fixed` from the domain of `other` (if `fixed`
    /// is fixed)
    fn forbid(&self, store: &mut dyn DomainStore, fixed: IntVar, other: IntVar) -> CPResult<()> {
        match (store.is_fixed(fixed), store.min(fixed)) {
            (true, Some(v)) => store.remove(other, v, self.cause),
            _ => Ok(()),
        }
    }
}
impl Propagator for NotEqualVar {
    fn name(&self) -> &'static str {
        "NotEqualVar"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Binary
    }

    fn initialise(&mut self, context: &mut PropagatorInitialisationContext) {
        self.cause = Cause::Propagator(context.propagator_id());
        context.register(self.x, EventMask::only(DomainEvent::Instantiate));
        context.register(self.y, EventMask::only(DomainEvent::Instantiate));
    }

    fn propagate(&mut self, store: &mut dyn DomainStore) -> CPResult<()> {
        self.forbid(store, self.x, self.y)?;
        self.forbid(store, self.y, self.x)
    }

    fn propagate_on(
        &mut self,
        store: &mut dyn DomainStore,
        local_index: usize,
        _mask: EventMask,
    ) -> CPResult<()> {
        if local_index == 0 {
            self.forbid(store, self.x, self.y)
        } else {
            self.forbid(store, self.y, self.x)
        }
    }

    fn entailment(&self, store: &dyn DomainStore) -> Entailment {
        let overlap = match (store.min(self.x), store.max(self.x)) {
            (Some(lo), Some(hi)) => {
                (lo..=hi).any(|v| store.contains(self.x, v) && store.contains(self.y, v))
            }
            _ => false,
        };
        if !overlap {
            Entailment::True
        } else if store.is_fixed(self.x) && store.is_fixed(self.y) {
            Entailment::False
        } else {
            Entailment::Undefined
        }
    }
}

#[cfg(test)]
mod test_notequal_var {
    use crate::prelude::*;

    #[test]
    fn x_propagates_to_y() {
        let mut cp = DefaultCpModel::default();
        let x = cp.new_int_var(0, 10);
        let y = cp.new_int_var(0, 10);

        cp.post(Box::new(NotEqualVar::new(x, y)));
        assert!(cp.fixpoint().is_ok());
        assert_eq!(11, cp.size(x));
        assert_eq!(11, cp.size(y));

        assert!(cp.fix(x, 6, Cause::Decision).is_ok());
        assert!(cp.fixpoint().is_ok());
        assert!(!cp.contains(y, 6));
    }

    #[test]
    fn y_propagates_to_x() {
        let mut cp = DefaultCpModel::default();
        let x = cp.new_int_var(0, 10);
        let y = cp.new_int_var(0, 10);

        cp.post(Box::new(NotEqualVar::new(x, y)));
        assert!(cp.fixpoint().is_ok());

        assert!(cp.fix(y, 6, Cause::Decision).is_ok());
        assert!(cp.fixpoint().is_ok());
        assert!(!cp.contains(x, 6));
    }

    #[test]
    fn both_fixed_to_the_same_value_is_a_contradiction() {
        let mut cp = DefaultCpModel::default();
        let x = cp.new_int_var(3, 3);
        let y = cp.new_int_var(3, 3);

        let p = cp.post(Box::new(NotEqualVar::new(x, y)));
        assert_eq!(Entailment::False, cp.is_entailed(p));
        assert!(cp.fixpoint().is_err());
    }

    #[test]
    fn it_is_entailed_once_the_domains_are_disjoint() {
        let mut cp = DefaultCpModel::default();
        let x = cp.new_int_var(0, 4);
        let y = cp.new_int_var(0, 4);

        let p = cp.post(Box::new(NotEqualVar::new(x, y)));
        assert!(cp.fixpoint().is_ok());
        assert_eq!(Entailment::Undefined, cp.is_entailed(p));

        cp.fix(x, 2, Cause::Decision).unwrap();
        assert!(cp.fixpoint().is_ok());
        assert!(!cp.contains(y, 2));
        assert_eq!(Entailment::True, cp.is_entailed(p));
        // the engine has made it passive
        assert!(!cp.is_active(p));
    }

    #[test]
    fn holes_are_taken_into_account() {
        let mut cp = DefaultCpModel::default();
        let x = cp.new_int_var(0, 4);
        let y = cp.new_int_var(0, 4);
        for v in [0, 2, 4] {
            cp.remove(x, v, Cause::Decision).unwrap();
        }
        for v in [1, 3] {
            cp.remove(y, v, Cause::Decision).unwrap();
        }
        let p = cp.post(Box::new(NotEqualVar::new(x, y)));
        assert_eq!(Entailment::True, cp.is_entailed(p));
    }
}
