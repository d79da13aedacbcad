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

use crate::dynamics::DynamicsError;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, DimName, OMatrix, OVector};
use crate::utils::StateError;
use snafu::Snafu;
use std::fmt;

mod body;
pub use body::*;

mod orbit;
pub use orbit::*;

mod relative;
pub use relative::*;

/// A trait for a propagated state.
/// `Size` is the size of the state whose sensitivities the STM tracks, `VecLength` is the size of the
/// whole integration vector (physical state and STM).
pub trait State: Default + Copy + PartialEq + fmt::Display + fmt::LowerExp + Send + Sync
where
    Self: Sized,
    DefaultAllocator:
        Allocator<Self::Size> + Allocator<Self::Size, Self::Size> + Allocator<Self::VecLength>,
{
    /// Size of the state and its STM
    type Size: DimName;
    type VecLength: DimName;

    /// Return this state as a vector for the propagation
    fn to_vector(&self) -> OVector<f64, Self::VecLength>;

    /// Return the state transition matrix of this state
    fn stm(&self) -> Result<OMatrix<f64, Self::Size, Self::Size>, DynamicsError> {
        Err(DynamicsError::StateTransitionMatrixUnset)
    }

    /// Resets the STM to identity
    fn reset_stm(&mut self);

    /// Set this state from the integration vector
    fn set(&mut self, time_s: f64, vector: &OVector<f64, Self::VecLength>)
        -> Result<(), StateError>;

    /// Reconstruct a new State from the provided delta time in seconds compared to the current state
    /// and with the provided vector.
    fn set_with_delta_seconds(
        mut self,
        delta_t_s: f64,
        vector: &OVector<f64, Self::VecLength>,
    ) -> Result<Self, StateError>
    where
        DefaultAllocator: Allocator<Self::VecLength>,
    {
        self.set(self.time_s() + delta_t_s, vector)?;
        Ok(self)
    }

    /// Time of this state, in seconds past the start of the scenario
    fn time_s(&self) -> f64;

    /// Set the time, in seconds
    fn set_time_s(&mut self, time_s: f64);
}

#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AstroError {
    #[snafu(display(
        "invalid reference orbit (sma = {sma_m} m, ecc = {ecc}, mu = {mu_m3_s2} m^3/s^2): {reason}"
    ))]
    InvalidOrbit {
        sma_m: f64,
        ecc: f64,
        mu_m3_s2: f64,
        reason: &'static str,
    },
    #[snafu(display("invalid central body: {reason}"))]
    InvalidBody { reason: &'static str },
}
