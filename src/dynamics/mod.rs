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

use crate::cosmic::State;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OMatrix, OVector};
use crate::utils::StateError;
use snafu::Snafu;

/// Exponential atmosphere and drag parameters of both spacecraft.
pub mod drag;
pub use self::drag::*;

/// Partial derivatives of the relative equations of motion, computed with hyperdual numbers.
pub mod jacobian;
pub use self::jacobian::*;

/// J2 and drag perturbed relative motion about a reference orbit, with its STM.
pub mod relative;
pub use self::relative::*;

/// A trait for models with equations of motion that can be integrated.
#[allow(clippy::type_complexity)]
pub trait Dynamics: Clone + Sync + Send
where
    DefaultAllocator: Allocator<<Self::StateType as State>::Size>
        + Allocator<<Self::StateType as State>::VecLength>
        + Allocator<<Self::StateType as State>::Size, <Self::StateType as State>::Size>,
{
    type StateType: State;

    /// Defines the equations of motion.
    ///
    /// - `delta_t_s`: Time in seconds past the time of the context.
    /// - `state_vec`: The state vector, which changes at each integration step.
    /// - `state_ctx`: The state context, used to rebuild the state from the state vector.
    fn eom(
        &self,
        delta_t_s: f64,
        state_vec: &OVector<f64, <Self::StateType as State>::VecLength>,
        state_ctx: &Self::StateType,
    ) -> Result<OVector<f64, <Self::StateType as State>::VecLength>, DynamicsError>
    where
        DefaultAllocator: Allocator<<Self::StateType as State>::VecLength>;

    /// Returns the derivative of the part of the state tracked by the STM and its gradient.
    ///
    /// If differentiation is not supported, this function should prevent initialization with a context that has an STM defined.
    fn dual_eom(
        &self,
        _delta_t_s: f64,
        _osculating_state: &Self::StateType,
    ) -> Result<
        (
            OVector<f64, <Self::StateType as State>::Size>,
            OMatrix<f64, <Self::StateType as State>::Size, <Self::StateType as State>::Size>,
        ),
        DynamicsError,
    >
    where
        DefaultAllocator: Allocator<<Self::StateType as State>::Size>
            + Allocator<<Self::StateType as State>::Size, <Self::StateType as State>::Size>,
    {
        Err(DynamicsError::StateTransitionMatrixUnset)
    }
}

/// Dynamical model errors.
#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// State Transition Matrix (STM) was expected but not set.
    #[snafu(display("expected STM to be set"))]
    StateTransitionMatrixUnset,
    #[snafu(display("dynamical model could not rebuild the state: {source}"))]
    DynamicsState { source: StateError },
    #[snafu(display("invalid drag configuration: {reason}"))]
    InvalidDrag { reason: &'static str },
}
