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

//! # trailcp
//!
//! The propagation and backtracking substrate of a constraint programming
//! solver. This crate provides:
//!
//! * a trail based reversible memory (`state` module) on top of which every
//!   piece of search sensitive state is built,
//! * integer, set and graph variables. Set and graph variables are
//!   represented by a kernel (mandatory elements) and an envelope (possible
//!   elements) which are narrowed monotonically,
//! * delta monitors that let a propagator replay only what changed on a
//!   variable since it last looked at it,
//! * an event driven propagation engine which runs the posted propagators to
//!   a fixpoint, cheapest propagators first.
//!
//! Search strategies are not part of this crate: a search layer drives the
//! engine through `checkpoint`, `rollback`, `post` and `fixpoint`, and
//! narrows the variables with `Cause::Decision`.
//!
//! ```
//! use trailcp::prelude::*;
//!
//! let mut cp = DefaultCpModel::default();
//! let graph = cp.new_graph_var(3);
//! let sets = (0..3).map(|_| cp.new_set_var(3)).collect::<Vec<_>>();
//! cp.post(Box::new(GraphChannel::new(graph, sets.clone())));
//! assert!(cp.fixpoint().is_ok());
//!
//! cp.enforce_arc(graph, 0, 1, Cause::Decision).unwrap();
//! assert!(cp.fixpoint().is_ok());
//! assert!(cp.kernel_contains(sets[0], 1));
//! ```

pub mod asserts;

mod constraints;
mod engine;
mod state;

pub use constraints::*;
pub use engine::*;
pub use state::*;

/// Everything you need to build a model and propagate it
pub mod prelude {
    pub use crate::constraints::*;
    pub use crate::engine::*;
    pub use crate::state::{Checkpoint, SaveAndRestore, StateManager, TrailedStateManager};
}

#[cfg(test)]
mod tests;
