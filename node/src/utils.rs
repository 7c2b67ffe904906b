// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) LUMEN NETWORK. All rights reserved.

/// Direction applied to an inexact division.
///
/// The choice is consensus-critical: conversions round up on the side the
/// taker pays and down on the side the taker receives, so rounding never
/// favors the taker over the maker.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Rounding {
    Down,
    Up,
}

/// Computes `a * b / c` through 128-bit intermediates.
///
/// Arguments must be non-negative and `c` strictly positive. Returns
/// `None` when the rounded result does not fit a signed 64-bit value.
pub fn big_divide(a: i64, b: i64, c: i64, rounding: Rounding) -> Option<i64> {
    debug_assert!(a >= 0 && b >= 0 && c > 0);

    let product = a as i128 * b as i128;
    let c = c as i128;

    let res = match rounding {
        Rounding::Down => product / c,
        Rounding::Up => (product + c - 1) / c,
    };

    i64::try_from(res).ok()
}
