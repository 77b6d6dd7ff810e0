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

//! Leveled internal consistency checks.
//!
//! Contract violations on the public api are always checked with plain
//! `assert!`. The macros below guard the checks of *internal* invariants
//! (kernel included in envelope, queue bookkeeping, ...) whose cost grows with
//! the level. Only the simple checks are active in a regular build, all of
//! them are active in tests or when the `debug-checks` feature is enabled.

#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const TRAILCP_ASSERT_LEVEL_DEFINITION: u8 = TRAILCP_ASSERT_SIMPLE;

#[cfg(any(test, feature = "debug-checks"))]
pub const TRAILCP_ASSERT_LEVEL_DEFINITION: u8 = TRAILCP_ASSERT_EXTREME;

pub const TRAILCP_ASSERT_SIMPLE: u8 = 1;
pub const TRAILCP_ASSERT_MODERATE: u8 = 2;
pub const TRAILCP_ASSERT_ADVANCED: u8 = 3;
pub const TRAILCP_ASSERT_EXTREME: u8 = 4;

#[macro_export]
#[doc(hidden)]
macro_rules! trailcp_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::TRAILCP_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRAILCP_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trailcp_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::TRAILCP_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRAILCP_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trailcp_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::TRAILCP_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRAILCP_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trailcp_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::asserts::TRAILCP_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRAILCP_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trailcp_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::asserts::TRAILCP_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRAILCP_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}
