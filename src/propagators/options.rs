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

use std::fmt;

use crate::time::{Duration, Unit};

use super::{ErrorCtrl, InvalidOptionsSnafu, PropagationError, RmsMixedError};
use snafu::ensure;
use typed_builder::TypedBuilder;

/// PropOpts stores the integrator options, including the minimum and maximum step sizes, and the
/// absolute and relative tolerances.
///
/// A step is accepted when the error estimate, scaled component-wise by `abs_tol + rel_tol * |y|`,
/// is at most one.
#[derive(Clone, Copy, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropOpts<E: ErrorCtrl> {
    #[builder(default_code = "10.0 * Unit::Second")]
    pub init_step: Duration,
    #[builder(default_code = "1.0 * Unit::Microsecond")]
    pub min_step: Duration,
    #[builder(default_code = "2700.0 * Unit::Second")]
    pub max_step: Duration,
    #[builder(default = 1e-10)]
    pub abs_tol: f64,
    #[builder(default = 1e-5)]
    pub rel_tol: f64,
    #[builder(default = 50)]
    pub attempts: u8,
    /// Maximum number of accepted steps between two consecutive output times
    #[builder(default = 500)]
    pub max_steps: usize,
    #[builder(default)]
    pub error_ctrl: E,
}

impl<E: ErrorCtrl> PropOpts<E> {
    /// `with_adaptive_step` initializes an `PropOpts` such that the integrator is used with an
    ///  adaptive step size. The number of attempts is currently fixed to 50 (as in GMAT).
    pub fn with_adaptive_step(
        min_step: Duration,
        max_step: Duration,
        abs_tol: f64,
        rel_tol: f64,
        error_ctrl: E,
    ) -> Self {
        PropOpts {
            init_step: max_step,
            min_step,
            max_step,
            abs_tol,
            rel_tol,
            attempts: 50,
            max_steps: 500,
            error_ctrl,
        }
    }

    pub fn with_adaptive_step_s(
        min_step: f64,
        max_step: f64,
        abs_tol: f64,
        rel_tol: f64,
        error_ctrl: E,
    ) -> Self {
        Self::with_adaptive_step(
            min_step * Unit::Second,
            max_step * Unit::Second,
            abs_tol,
            rel_tol,
            error_ctrl,
        )
    }

    /// Returns a string with the information about these options
    pub fn info(&self) -> String {
        format!("{self}")
    }

    /// Set the maximum step size and sets the initial step to that value if currently greater
    pub fn set_max_step(&mut self, max_step: Duration) {
        if self.init_step > max_step {
            self.init_step = max_step;
        }
        self.max_step = max_step;
    }

    /// Set the minimum step size and sets the initial step to that value if currently smaller
    pub fn set_min_step(&mut self, min_step: Duration) {
        if self.init_step < min_step {
            self.init_step = min_step;
        }
        self.min_step = min_step;
    }

    /// Checks that the step sizes and tolerances are usable.
    pub fn validate(&self) -> Result<(), PropagationError> {
        let zero = Duration::ZERO;
        ensure!(
            self.min_step > zero && self.min_step <= self.max_step,
            InvalidOptionsSnafu {
                reason: "minimum step must be positive and at most the maximum step"
            }
        );
        ensure!(
            self.init_step > zero,
            InvalidOptionsSnafu {
                reason: "initial step must be positive"
            }
        );
        ensure!(
            self.abs_tol.is_finite()
                && self.rel_tol.is_finite()
                && self.abs_tol >= 0.0
                && self.rel_tol >= 0.0
                && self.abs_tol + self.rel_tol > 0.0,
            InvalidOptionsSnafu {
                reason: "tolerances must be finite, non negative and not both zero"
            }
        );
        ensure!(
            self.attempts > 0 && self.max_steps > 0,
            InvalidOptionsSnafu {
                reason: "attempts and maximum number of steps must be positive"
            }
        );
        Ok(())
    }
}

impl<E: ErrorCtrl> fmt::Display for PropOpts<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min_step: {:e}, max_step: {:e}, abs tol: {:e}, rel tol: {:e}, attempts: {}, max steps: {}",
            self.min_step, self.max_step, self.abs_tol, self.rel_tol, self.attempts, self.max_steps
        )
    }
}

impl Default for PropOpts<RmsMixedError> {
    /// `default` returns the default options: absolute tolerance of 1e-10 and relative tolerance of 1e-5,
    /// with the RMS of the mixed errors.
    fn default() -> PropOpts<RmsMixedError> {
        Self::builder().build()
    }
}

#[cfg(test)]
mod ut_opts {
    use super::*;
    use crate::propagators::LargestMixedError;

    #[test]
    fn test_options() {
        let opts = PropOpts::<RmsMixedError>::default();
        assert_eq!(opts.abs_tol, 1e-10);
        assert_eq!(opts.rel_tol, 1e-5);
        assert_eq!(opts.init_step, 10.0 * Unit::Second);
        assert_eq!(opts.min_step, 1.0 * Unit::Microsecond);
        assert_eq!(opts.max_steps, 500);
        assert!(opts.validate().is_ok());
        println!("{}", opts.info());

        let mut opts =
            PropOpts::with_adaptive_step_s(1e-3, 60.0, 1e-12, 1e-9, LargestMixedError);
        assert_eq!(opts.init_step, 60.0 * Unit::Second);
        opts.set_max_step(30.0 * Unit::Second);
        assert_eq!(opts.init_step, 30.0 * Unit::Second);
        opts.set_min_step(45.0 * Unit::Second);
        assert_eq!(opts.init_step, 45.0 * Unit::Second);
        // Minimum step now larger than the maximum step
        assert!(opts.validate().is_err());

        let opts = PropOpts::<RmsMixedError>::builder().abs_tol(0.0).rel_tol(0.0).build();
        assert!(opts.validate().is_err());
    }
}
