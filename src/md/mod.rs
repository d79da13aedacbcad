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

use crate::cosmic::RelativeState;
use crate::dynamics::RelativeDynamics;
use crate::linalg::Vector3;
use crate::propagators::{ErrorCtrl, PropagationError, Propagator, TimeGrid};
use snafu::prelude::*;

pub mod trajectory;
pub use trajectory::Traj;

mod targeter;
pub use targeter::{Targeter, TargetingResult};

pub mod sweep;

/// Trajectory of a chaser relative to its reference orbit
pub type RelativeTraj = Traj<RelativeState>;

#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TargetingError {
    /// The position at the target time is insensitive to (at least) one direction of the initial velocity
    #[snafu(display(
        "no single impulse solution: position to velocity sensitivity is singular (reciprocal condition number {rcond:.3e})"
    ))]
    SingularSensitivity { rcond: f64 },
    #[snafu(display("no single impulse solution: the velocity correction is not finite"))]
    NonFiniteSolution,
    #[snafu(display("propagation did not reach the target time: {reason}"))]
    Unstable { reason: String },
    #[snafu(display("could not propagate the corrected state: {source}"))]
    Propagation { source: PropagationError },
}

/// Propagates the relative state through each time of the grid with the default propagator.
///
/// The initial state is moved to the start of the grid. The returned trajectory holds every sample
/// reached, and the failure if the propagation stopped early.
pub fn propagate(
    initial: RelativeState,
    grid: &TimeGrid,
    dynamics: RelativeDynamics,
) -> RelativeTraj {
    propagate_with(&Propagator::default(dynamics), initial, grid)
}

/// Same as [propagate] with the provided propagator.
pub fn propagate_with<E: ErrorCtrl>(
    prop: &Propagator<RelativeDynamics, E>,
    mut initial: RelativeState,
    grid: &TimeGrid,
) -> RelativeTraj {
    initial.time_s = grid.start_s();
    match prop.with(initial).for_time_grid(grid) {
        Ok(traj) => traj,
        // Only raised for a grid which does not start at the initial time, which cannot happen here
        Err(e) => Traj::from_failure(e),
    }
}

/// Propagates the relative state through the grid and solves for the velocity correction at the
/// start of the grid which brings the chaser to the desired relative position at the end of the grid.
pub fn target(
    initial: RelativeState,
    grid: &TimeGrid,
    desired_position: Vector3<f64>,
    dynamics: RelativeDynamics,
) -> TargetingResult {
    Targeter::default().target(
        &Propagator::default(dynamics),
        initial,
        grid,
        desired_position,
    )
}
