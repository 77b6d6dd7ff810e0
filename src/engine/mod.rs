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

//! The engine module comprises the variables, their domain store, the delta
//! monitors, the propagator contract and the propagation engine itself.

mod core;
mod delta;
mod domain;
mod events;
mod model;
mod propagator;
mod queue;

pub use self::core::*;
pub use delta::*;
pub use domain::*;
pub use events::*;
pub use model::*;
pub use propagator::*;
pub use queue::*;
