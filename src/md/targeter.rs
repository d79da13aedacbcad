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

use super::{
    propagate_with, NonFiniteSolutionSnafu, PropagationSnafu, RelativeTraj, SingularSensitivitySnafu,
    TargetingError,
};
use crate::cosmic::RelativeState;
use crate::dynamics::RelativeDynamics;
use crate::linalg::{Matrix3, Vector3};
use crate::propagators::{ErrorCtrl, Propagator, TimeGrid};
use snafu::{ensure, OptionExt, ResultExt};
use std::fmt;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Single impulse targeter.
///
/// The velocity correction at the start of the trajectory is found by solving
/// $$ \Phi_{rv} \delta v = r_{desired} - r_{achieved} $$
/// where $\Phi_{rv}$ is the sensitivity of the final position to the initial velocity, i.e. the upper right
/// 3x3 block of the final STM. The pseudo-velocities only differ from the velocity by terms in the position,
/// so a velocity correction is applied as is onto the pseudo-velocities.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Targeter {
    /// Smallest reciprocal condition number of $\Phi_{rv}$ for which a solution is sought
    pub rcond_tol: f64,
}

impl Default for Targeter {
    fn default() -> Self {
        Self { rcond_tol: 1e-12 }
    }
}

impl Targeter {
    pub fn new(rcond_tol: f64) -> Self {
        Self { rcond_tol }
    }

    /// Ratio of the smallest to the largest singular value of the matrix (zero if the matrix is null)
    pub fn rcond(matrix: &Matrix3<f64>) -> f64 {
        if !matrix.iter().all(|v| v.is_finite()) {
            return f64::NAN;
        }
        let sv = matrix.singular_values();
        let largest = sv.max();
        if largest > 0.0 {
            sv.min() / largest
        } else {
            0.0
        }
    }

    /// Solves for the velocity correction from the final state, whose STM must start at the correction time.
    pub fn solve_single_impulse(
        &self,
        final_state: &RelativeState,
        desired_position: &Vector3<f64>,
    ) -> Result<Vector3<f64>, TargetingError> {
        let phi_rv = final_state.phi_rv();
        let rcond = Self::rcond(&phi_rv);
        // Written so that a NaN fails
        ensure!(rcond > self.rcond_tol, SingularSensitivitySnafu { rcond });

        let miss = desired_position - final_state.position();
        debug!("Phi_rv = {phi_rv}");
        debug!("rcond = {rcond:.3e}\tmiss = {miss}");

        let delta_v = phi_rv
            .lu()
            .solve(&miss)
            .context(SingularSensitivitySnafu { rcond })?;

        ensure!(
            delta_v.iter().all(|v| v.is_finite()),
            NonFiniteSolutionSnafu
        );

        Ok(delta_v)
    }

    /// Solves for the velocity correction at the first sample of the trajectory which achieves the
    /// desired position at the last sample. The trajectory must be stable.
    pub fn try_achieve(
        &self,
        traj: &RelativeTraj,
        desired_position: &Vector3<f64>,
    ) -> Result<Vector3<f64>, TargetingError> {
        if let Some(failure) = &traj.failure {
            return Err(TargetingError::Unstable {
                reason: failure.to_string(),
            });
        }
        match traj.last() {
            Some(final_state) => self.solve_single_impulse(final_state, desired_position),
            None => Err(TargetingError::Unstable {
                reason: "no state was propagated".to_string(),
            }),
        }
    }

    /// Propagates the initial state through the grid and solves for the velocity correction which
    /// achieves the desired position at the end of the grid. The solver is called once, after the
    /// final time is reached.
    pub fn target<E: ErrorCtrl>(
        &self,
        prop: &Propagator<RelativeDynamics, E>,
        initial: RelativeState,
        grid: &TimeGrid,
        desired_position: Vector3<f64>,
    ) -> TargetingResult {
        #[cfg(not(target_arch = "wasm32"))]
        let tick = Instant::now();

        let traj = propagate_with(prop, initial, grid);
        let (delta_v, error) = match self.try_achieve(&traj, &desired_position) {
            Ok(delta_v) => {
                info!(
                    "Targeter -- |Δv| = {:.6} m/s to reach {desired_position} m at t = {} s",
                    delta_v.norm(),
                    grid.end_s()
                );
                (Some(delta_v), None)
            }
            Err(e) => {
                warn!("Targeter -- {e}");
                (None, Some(e))
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let tock: crate::time::Duration = tick.elapsed().into();
            debug!("Targeter -- done in {tock}");
        }

        TargetingResult {
            traj,
            desired_position,
            delta_v,
            error,
        }
    }

    /// Propagates the initial state with the velocity correction applied and returns that trajectory
    /// and the distance between the final and desired positions, in meters.
    pub fn apply<E: ErrorCtrl>(
        &self,
        prop: &Propagator<RelativeDynamics, E>,
        initial: RelativeState,
        grid: &TimeGrid,
        delta_v: &Vector3<f64>,
        desired_position: &Vector3<f64>,
    ) -> Result<(RelativeTraj, f64), TargetingError> {
        let mut corrected = initial.with_delta_v(delta_v);
        corrected.time_s = grid.start_s();
        let traj = prop
            .with(corrected)
            .for_time_grid(grid)
            .context(PropagationSnafu)?;

        if let Some(failure) = &traj.failure {
            return Err(TargetingError::Unstable {
                reason: failure.to_string(),
            });
        }

        match traj.final_position() {
            Some(position) => {
                let miss_m = (position - desired_position).norm();
                info!("Targeter -- corrected trajectory misses the target by {miss_m:.6} m");
                Ok((traj, miss_m))
            }
            None => Err(TargetingError::Unstable {
                reason: "no state was propagated".to_string(),
            }),
        }
    }
}

/// Outcome of a targeting: the trajectory without correction, and the velocity correction if one was found.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetingResult {
    pub traj: RelativeTraj,
    pub desired_position: Vector3<f64>,
    /// Velocity correction at the first time of the trajectory, in m/s
    pub delta_v: Option<Vector3<f64>>,
    /// Why no velocity correction was found
    pub error: Option<TargetingError>,
}

impl TargetingResult {
    /// Returns true if a velocity correction was found.
    pub fn success(&self) -> bool {
        self.delta_v.is_some()
    }

    /// Returns true if the propagation reached the target time.
    pub fn stable(&self) -> bool {
        self.traj.stable()
    }

    /// Position reached at the target time without correction
    pub fn achieved_position(&self) -> Option<Vector3<f64>> {
        self.traj.final_position()
    }

    /// Final position predicted by the STM with the correction applied
    pub fn linear_prediction(&self) -> Option<Vector3<f64>> {
        let final_state = self.traj.last()?;
        let delta_v = self.delta_v?;
        Some(final_state.position() + final_state.phi_rv() * delta_v)
    }
}

impl fmt::Display for TargetingResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.delta_v, &self.error) {
            (Some(dv), _) => write!(
                f,
                "Correction: [{:.6}, {:.6}, {:.6}] m/s\t|Δv| = {:.6} m/s",
                dv[0],
                dv[1],
                dv[2],
                dv.norm()
            ),
            (None, Some(e)) => write!(f, "Targeting failed: {e}"),
            (None, None) => write!(f, "Targeting failed"),
        }
    }
}
