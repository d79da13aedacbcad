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

use super::error_ctrl::ErrorCtrl;
use super::{
    CancelToken, CancelledSnafu, DynamicsSnafu, IntegrationDetails, InvalidTimeGridSnafu,
    MaxStepsExceededSnafu, NonConvergenceSnafu, NonFiniteStateSnafu, PropagationError, Propagator,
    StateRebuildSnafu, StepSizeUnderflowSnafu, TimeGrid,
};
use crate::cosmic::State;
use crate::dynamics::Dynamics;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OVector};
use crate::md::trajectory::Traj;
use crate::time::{Duration, Unit};
use snafu::{ensure, ResultExt};
use std::f64;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Largest increase of the step size after an accepted step
const MAX_GROWTH: f64 = 5.0;
/// Largest decrease of the step size after a rejected step
const MIN_SHRINK: f64 = 0.2;
/// Safety factor of the step size controller
const SAFETY: f64 = 0.9;
/// Remaining durations below one nanosecond are considered reached
const TIME_EPSILON_S: f64 = 1e-9;

/// A propagator instance holds the state being propagated, the details of the previous step,
/// and the step size to use in the next step.
#[derive(Debug)]
pub struct PropInstance<'a, D: Dynamics, E: ErrorCtrl>
where
    DefaultAllocator: Allocator<<D::StateType as State>::Size>
        + Allocator<<D::StateType as State>::Size, <D::StateType as State>::Size>
        + Allocator<<D::StateType as State>::VecLength>,
{
    /// The state of this propagator instance
    pub state: D::StateType,
    /// The propagator setup (kind, stages, etc.)
    pub prop: &'a Propagator<D, E>,
    /// Stores the details of the previous integration step
    pub details: IntegrationDetails,
    pub(crate) step_size: Duration, // Stores the adapted step for the _next_ call
    pub(crate) cancel: Option<CancelToken>,
    // Allows us to do pre-allocation of the ki vectors
    pub(crate) k: Vec<OVector<f64, <D::StateType as State>::VecLength>>,
}

impl<'a, D: Dynamics, E: ErrorCtrl> PropInstance<'a, D, E>
where
    DefaultAllocator: Allocator<<D::StateType as State>::Size>
        + Allocator<<D::StateType as State>::Size, <D::StateType as State>::Size>
        + Allocator<<D::StateType as State>::VecLength>,
{
    /// Allows setting the step size of the propagator
    pub fn set_step(&mut self, step_size: Duration) {
        self.step_size = step_size;
    }

    /// Attaches a cancellation token, checked before each advance to the next stop time.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn check_cancelled(&self) -> Result<(), PropagationError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => CancelledSnafu {
                time_s: self.state.time_s(),
            }
            .fail(),
            _ => Ok(()),
        }
    }

    fn ensure_finite(&self) -> Result<(), PropagationError> {
        ensure!(
            self.state.time_s().is_finite() && self.state.to_vector().iter().all(|v| v.is_finite()),
            NonFiniteStateSnafu {
                time_s: self.state.time_s()
            }
        );
        Ok(())
    }

    /// This method propagates the provided Dynamics for the provided duration.
    pub fn for_duration(&mut self, duration: Duration) -> Result<D::StateType, PropagationError> {
        let stop_time_s = self.state.time_s() + duration.to_seconds();
        self.until_time_s(stop_time_s)
    }

    /// Propagates the provided Dynamics until the provided time in seconds, which is hit exactly. Returns the end state.
    pub fn until_time_s(&mut self, stop_time_s: f64) -> Result<D::StateType, PropagationError> {
        let duration_s = stop_time_s - self.state.time_s();
        ensure!(
            duration_s.is_finite() && duration_s >= 0.0,
            InvalidTimeGridSnafu {
                reason: "can only propagate forward in time"
            }
        );
        self.check_cancelled()?;
        self.ensure_finite()?;

        if duration_s == 0.0 {
            return Ok(self.state);
        }

        #[cfg(not(target_arch = "wasm32"))]
        let tick = Instant::now();
        let log_progress = duration_s >= 120.0;

        if log_progress {
            // Prevent the print spam for short intervals between output times
            info!(
                "Propagating for {} until t = {} s",
                duration_s * Unit::Second,
                stop_time_s
            );
        }

        let mut steps = 0;
        loop {
            let remaining_s = stop_time_s - self.state.time_s();
            if remaining_s <= TIME_EPSILON_S {
                // Snap onto the requested time
                self.state.set_time_s(stop_time_s);
                #[cfg(not(target_arch = "wasm32"))]
                {
                    if log_progress {
                        let tock: Duration = tick.elapsed().into();
                        info!("Done in {}", tock);
                    }
                }
                return Ok(self.state);
            }

            ensure!(
                steps < self.prop.opts.max_steps,
                MaxStepsExceededSnafu {
                    time_s: self.state.time_s(),
                    stop_time_s,
                    max_steps: self.prop.opts.max_steps
                }
            );

            let proposed_s = self.step_size.to_seconds();
            if proposed_s >= remaining_s {
                // Take one final step of at most the needed duration until the stop time
                let prev_step_size = self.step_size;
                let used_s = self.single_step_s(remaining_s)?;
                if used_s >= remaining_s {
                    // Restore the step size for subsequent calls
                    self.step_size = prev_step_size.max(self.step_size);
                    self.state.set_time_s(stop_time_s);
                }
            } else {
                self.single_step_s(proposed_s)?;
            }
            steps += 1;
        }
    }

    /// Propagates through each time of the grid, starting with an identity STM, and stores the state at
    /// each of those times.
    ///
    /// The initial state is the first sample. Failures during the propagation stop it: the trajectory
    /// then holds all the samples reached so far and the failure. Only a grid which does not start at the
    /// time of the initial state is an error.
    pub fn for_time_grid(
        &mut self,
        grid: &TimeGrid,
    ) -> Result<Traj<D::StateType>, PropagationError> {
        ensure!(
            grid.start_s() == self.state.time_s(),
            InvalidTimeGridSnafu {
                reason: "the grid must start at the time of the initial state"
            }
        );

        self.state.reset_stm();

        #[cfg(not(target_arch = "wasm32"))]
        let tick = Instant::now();
        let log_progress = grid.end_s() - grid.start_s() >= 120.0;
        if log_progress {
            info!("Propagating over {grid}");
        }

        let mut traj = Traj::with_capacity(grid.len());
        traj.states.push(self.state);

        if let Err(e) = self.ensure_finite() {
            warn!("{e}: propagation not started");
            traj.failure = Some(e);
            return Ok(traj);
        }

        for &time_s in grid.times_s().iter().skip(1) {
            match self.until_time_s(time_s) {
                Ok(state) => traj.states.push(state),
                Err(e) => {
                    warn!(
                        "propagation stopped after {} of {} samples: {e}",
                        traj.states.len(),
                        grid.len()
                    );
                    traj.failure = Some(e);
                    break;
                }
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            if log_progress {
                let tock: Duration = tick.elapsed().into();
                info!("Done in {}", tock);
            }
        }

        Ok(traj)
    }

    /// Take a single propagator step with the current step size
    pub fn single_step(&mut self) -> Result<(), PropagationError> {
        self.single_step_s(self.step_size.to_seconds()).map(|_| ())
    }

    /// Takes a single step attempting the provided step size, returns the step size actually used.
    fn single_step_s(&mut self, step_s: f64) -> Result<f64, PropagationError> {
        let (used_s, state_vec) = self.derive(step_s)?;
        self.state = self
            .state
            .set_with_delta_seconds(used_s, &state_vec)
            .context(StateRebuildSnafu)?;

        Ok(used_s)
    }

    /// This method integrates whichever function is provided as `d_xdt`. Everything passed to this function is in **seconds**.
    ///
    /// This function returns the step sized used (in seconds) and the new state as y_{n+1} = y_n + \frac{dy_n}{dt}.
    /// To get the integration details, check `self.latest_details`.
    fn derive(
        &mut self,
        proposed_step_s: f64,
    ) -> Result<(f64, OVector<f64, <D::StateType as State>::VecLength>), PropagationError> {
        let state_vec = &self.state.to_vector();
        let state_ctx = &self.state;
        let opts = &self.prop.opts;
        let min_step_s = opts.min_step.to_seconds();
        let max_step_s = opts.max_step.to_seconds();
        let order = f64::from(self.prop.order);
        // Reset the number of attempts used (we don't reset the error because it's set before it's read)
        self.details.attempts = 1;
        // Never above the max step, but may be below the min step to land on a stop time
        let mut step_size = proposed_step_s.min(max_step_s);
        loop {
            let ki = self
                .prop
                .dynamics
                .eom(0.0, state_vec, state_ctx)
                .context(DynamicsSnafu)?;
            self.k[0] = ki;
            let mut a_idx: usize = 0;
            for i in 0..(self.prop.stages - 1) {
                // Let's compute the c_i by summing the relevant items from the list of coefficients.
                // \sum_{j=1}^{i-1} a_ij  ∀ i ∈ [2, s]
                let mut ci: f64 = 0.0;
                // The wi stores the a_{s1} * k_1 + a_{s2} * k_2 + ... + a_{s, s-1} * k_{s-1} +
                let mut wi = OVector::<f64, <D::StateType as State>::VecLength>::from_element(0.0);
                for kj in &self.k[0..i + 1] {
                    let a_ij = self.prop.a_coeffs[a_idx];
                    ci += a_ij;
                    wi += a_ij * kj;
                    a_idx += 1;
                }

                let ki = self
                    .prop
                    .dynamics
                    .eom(ci * step_size, &(state_vec + step_size * wi), state_ctx)
                    .context(DynamicsSnafu)?;
                self.k[i + 1] = ki;
            }
            // Compute the next state and the error
            let mut next_state = state_vec.clone();
            // State error estimation from https://en.wikipedia.org/wiki/Runge%E2%80%93Kutta_methods#Adaptive_Runge%E2%80%93Kutta_methods
            let mut error_est =
                OVector::<f64, <D::StateType as State>::VecLength>::from_element(0.0);
            for (i, ki) in self.k.iter().enumerate() {
                let b_i = self.prop.b_coeffs[i];
                let b_i_star = self.prop.b_coeffs[i + self.prop.stages];
                error_est += step_size * (b_i - b_i_star) * ki;
                next_state += step_size * b_i * ki;
            }

            self.details.error =
                E::estimate(&error_est, &next_state, state_vec, opts.abs_tol, opts.rel_tol);

            // A non finite state will not become finite by reducing the step
            ensure!(
                self.details.error.is_finite() && next_state.iter().all(|v| v.is_finite()),
                NonFiniteStateSnafu {
                    time_s: self.state.time_s()
                }
            );

            if self.details.error <= 1.0 {
                self.details.step = step_size * Unit::Second;
                // Error is less than tolerance, let's attempt to increase the step for the next iteration.
                let factor = if self.details.error > 0.0 {
                    (SAFETY * self.details.error.powf(-1.0 / order)).min(MAX_GROWTH)
                } else {
                    MAX_GROWTH
                };
                let proposed_step = (step_size * factor.max(MIN_SHRINK)).min(max_step_s);
                // In all cases, let's update the step size to whatever was the adapted step size
                self.step_size = proposed_step * Unit::Second;
                return Ok((step_size, next_state));
            } else {
                // Error is too high: unless we are out of attempts or already at the smallest step,
                // let's adapt the step size.
                ensure!(
                    self.details.attempts < opts.attempts,
                    NonConvergenceSnafu {
                        time_s: self.state.time_s(),
                        error: self.details.error,
                        attempts: self.details.attempts
                    }
                );
                ensure!(
                    step_size > min_step_s,
                    StepSizeUnderflowSnafu {
                        time_s: self.state.time_s(),
                        error: self.details.error,
                        min_step: opts.min_step
                    }
                );
                self.details.attempts += 1;
                debug!(
                    "step of {step_size} s rejected at t = {} s (scaled error {:.3e})",
                    self.state.time_s(),
                    self.details.error
                );
                let factor =
                    (SAFETY * self.details.error.powf(-1.0 / (order - 1.0))).max(MIN_SHRINK);
                step_size = (step_size * factor).max(min_step_s);
                // Note that we don't set self.step_size, that will be updated right before we return
            }
        }
    }

    /// Copy the details of the latest integration step.
    pub fn latest_details(&self) -> IntegrationDetails {
        self.details
    }
}
