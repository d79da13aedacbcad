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

use crate::cosmic::{RelativeState, State};
use crate::dynamics::DynamicsError;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OMatrix, Vector3};
use crate::propagators::PropagationError;
use std::fmt;

/// Stores the states of a propagation at each of the requested output times.
///
/// The states are pushed in chronological order by the propagator. If the propagation failed, the
/// trajectory holds all of the states reached before the failure and the failure itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Traj<S: State>
where
    DefaultAllocator: Allocator<S::Size> + Allocator<S::Size, S::Size> + Allocator<S::VecLength>,
{
    /// Optionally name this trajectory
    pub name: Option<String>,
    pub states: Vec<S>,
    /// Set if the propagation stopped before the last output time
    pub failure: Option<PropagationError>,
}

impl<S: State> Traj<S>
where
    DefaultAllocator: Allocator<S::Size> + Allocator<S::Size, S::Size> + Allocator<S::VecLength>,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            name: None,
            states: Vec::with_capacity(capacity),
            failure: None,
        }
    }

    /// A trajectory of a propagation which could not start.
    pub fn from_failure(failure: PropagationError) -> Self {
        Self {
            name: None,
            states: Vec::new(),
            failure: Some(failure),
        }
    }

    /// Returns true if the propagation reached every requested output time.
    pub fn stable(&self) -> bool {
        self.failure.is_none()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&S> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&S> {
        self.states.last()
    }

    /// Time of each sample, in seconds
    pub fn times_s(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.time_s()).collect()
    }

    /// Returns the sample at exactly this time, if any.
    pub fn at_time_s(&self, time_s: f64) -> Option<&S> {
        self.states
            .binary_search_by(|s| s.time_s().total_cmp(&time_s))
            .ok()
            .map(|idx| &self.states[idx])
    }

    /// State transition matrix from the first to the last sample
    pub fn final_stm(&self) -> Option<Result<OMatrix<f64, S::Size, S::Size>, DynamicsError>> {
        self.last().map(|s| s.stm())
    }
}

impl<S: State> Default for Traj<S>
where
    DefaultAllocator: Allocator<S::Size> + Allocator<S::Size, S::Size> + Allocator<S::VecLength>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl Traj<RelativeState> {
    /// Range of each sample, in meters
    pub fn ranges_m(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.range_m()).collect()
    }

    /// Smallest range over the samples, in meters (NaN if there are none)
    pub fn min_range_m(&self) -> f64 {
        self.states
            .iter()
            .map(|s| s.range_m())
            .fold(f64::NAN, f64::min)
    }

    /// Largest range over the samples, in meters (NaN if there are none)
    pub fn max_range_m(&self) -> f64 {
        self.states
            .iter()
            .map(|s| s.range_m())
            .fold(f64::NAN, f64::max)
    }

    pub fn final_position(&self) -> Option<Vector3<f64>> {
        self.last().map(|s| s.position())
    }
}

impl<S: State> fmt::Display for Traj<S>
where
    DefaultAllocator: Allocator<S::Size> + Allocator<S::Size, S::Size> + Allocator<S::VecLength>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}: ")?;
        }
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "Trajectory of {} states from t = {} s to t = {} s",
                self.len(),
                first.time_s(),
                last.time_s()
            )?,
            _ => write!(f, "Empty trajectory")?,
        }
        if let Some(failure) = &self.failure {
            write!(f, " (failed: {failure})")?;
        }
        Ok(())
    }
}
