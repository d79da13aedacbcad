/*
    STARMAP, relative motion propagation and single impulse targeting
    Copyright (C) 2024-onwards The STARMAP developers

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, DimName, OVector};
use std::fmt;

/// The Error Control trait manages how a propagator computes the error in the current step.
///
/// The error of each component is scaled by `abs_tol + rel_tol * max(|y_n|, |y_n+1|)` so that
/// components of very different magnitudes (radius of the orbit, relative position, STM) share
/// the same tolerances. A step is accepted when the returned value is at most one.
pub trait ErrorCtrl: Copy + Default + Send + Sync + fmt::Debug {
    /// Computes the scaled error of the step from the error estimate, the candidate state and the current state.
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
        abs_tol: f64,
        rel_tol: f64,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>;
}

/// Error of a single component scaled by its tolerance
#[inline]
fn scaled_error(err: f64, next: f64, prev: f64, abs_tol: f64, rel_tol: f64) -> f64 {
    err.abs() / (abs_tol + rel_tol * next.abs().max(prev.abs()))
}

/// Root mean square of the scaled errors, as in the Hairer and Wanner implementation of Dormand Prince.
///
/// This is the default error control.
#[derive(Clone, Copy, Debug, Default)]
pub struct RmsMixedError;

impl ErrorCtrl for RmsMixedError {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
        abs_tol: f64,
        rel_tol: f64,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        let sum_sq: f64 = error_est
            .iter()
            .zip(candidate.iter().zip(cur_state.iter()))
            .map(|(err, (next, prev))| scaled_error(*err, *next, *prev, abs_tol, rel_tol).powi(2))
            .sum();
        (sum_sq / (N::dim() as f64)).sqrt()
    }
}

/// Largest of the scaled errors, i.e. the infinity norm: more stringent than [`RmsMixedError`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestMixedError;

impl ErrorCtrl for LargestMixedError {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
        abs_tol: f64,
        rel_tol: f64,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        let mut max_err = 0.0;
        for (err, (next, prev)) in error_est
            .iter()
            .zip(candidate.iter().zip(cur_state.iter()))
        {
            let err = scaled_error(*err, *next, *prev, abs_tol, rel_tol);
            // NaN must win so that the caller sees it
            if err.is_nan() {
                return err;
            } else if err > max_err {
                max_err = err;
            }
        }
        max_err
    }
}
