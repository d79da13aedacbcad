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

use snafu::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Provides different methods for controlling the error computation of the integrator.
pub mod error_ctrl;
pub use self::error_ctrl::*;

// Re-Export
mod grid;
pub use grid::*;
mod instance;
pub use instance::*;
mod propagator;
pub use propagator::*;
mod rk_methods;
pub use rk_methods::*;
mod options;
pub use options::*;

use crate::{dynamics::DynamicsError, time::Duration, utils::StateError};

/// Stores the details of the previous integration step of a given propagator. Access as `my_prop.clone().latest_details()`.
#[derive(Copy, Clone, Debug)]
pub struct IntegrationDetails {
    /// step size used
    pub step: Duration,
    /// error in the previous integration step, scaled by the tolerances (accepted when at most one)
    pub error: f64,
    /// number of attempts needed by an adaptive step size to be within the tolerance
    pub attempts: u8,
}

impl fmt::Display for IntegrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IntegrationDetails {{step: {}, error: {:.3e}, attempts: {}}}",
            self.step, self.error, self.attempts
        )
    }
}

/// Shared flag to stop a propagation from another thread.
///
/// The flag is checked before advancing to the next output time, so the propagation stops with
/// all the samples reached until then.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("encountered a dynamics error {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display("could not rebuild the state after a step: {source}"))]
    StateRebuild { source: StateError },
    #[snafu(display("state became non finite at t = {time_s} s"))]
    NonFiniteState { time_s: f64 },
    #[snafu(display(
        "step size underflow at t = {time_s} s: error still {error:.3e} times the tolerance with the minimum step of {min_step}"
    ))]
    StepSizeUnderflow {
        time_s: f64,
        error: f64,
        min_step: Duration,
    },
    #[snafu(display(
        "step did not converge at t = {time_s} s: error still {error:.3e} times the tolerance after {attempts} attempts"
    ))]
    NonConvergence {
        time_s: f64,
        error: f64,
        attempts: u8,
    },
    #[snafu(display("exceeded {max_steps} steps at t = {time_s} s before reaching t = {stop_time_s} s"))]
    MaxStepsExceeded {
        time_s: f64,
        stop_time_s: f64,
        max_steps: usize,
    },
    #[snafu(display("propagation cancelled at t = {time_s} s"))]
    Cancelled { time_s: f64 },
    #[snafu(display("invalid time grid: {reason}"))]
    InvalidTimeGrid { reason: &'static str },
    #[snafu(display("invalid propagator options: {reason}"))]
    InvalidOptions { reason: &'static str },
}
