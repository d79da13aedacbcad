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

use super::{InvalidTimeGridSnafu, PropagationError};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Strictly increasing output times, in seconds. The first time is the time of the initial state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct TimeGrid {
    times_s: Vec<f64>,
}

impl TimeGrid {
    pub fn new(times_s: Vec<f64>) -> Result<Self, PropagationError> {
        ensure!(
            !times_s.is_empty(),
            InvalidTimeGridSnafu {
                reason: "at least one output time is needed"
            }
        );
        ensure!(
            times_s.iter().all(|t| t.is_finite()),
            InvalidTimeGridSnafu {
                reason: "output times must be finite"
            }
        );
        ensure!(
            times_s.windows(2).all(|w| w[1] > w[0]),
            InvalidTimeGridSnafu {
                reason: "output times must be strictly increasing"
            }
        );
        Ok(Self { times_s })
    }

    /// `count` output times every `step_s` seconds from `start_s` (included).
    pub fn uniform(start_s: f64, step_s: f64, count: usize) -> Result<Self, PropagationError> {
        ensure!(
            step_s.is_finite() && step_s > 0.0,
            InvalidTimeGridSnafu {
                reason: "output step must be strictly positive"
            }
        );
        Self::new((0..count).map(|i| start_s + (i as f64) * step_s).collect())
    }

    /// Output times from `start_s` to `end_s` (both included), split in `intervals` equal intervals.
    pub fn spanning(start_s: f64, end_s: f64, intervals: usize) -> Result<Self, PropagationError> {
        ensure!(
            intervals > 0,
            InvalidTimeGridSnafu {
                reason: "at least one interval is needed"
            }
        );
        ensure!(
            end_s > start_s,
            InvalidTimeGridSnafu {
                reason: "end time must be after the start time"
            }
        );
        let step_s = (end_s - start_s) / (intervals as f64);
        let mut times_s: Vec<f64> = (0..intervals)
            .map(|i| start_s + (i as f64) * step_s)
            .collect();
        // The end time is set exactly
        times_s.push(end_s);
        Self::new(times_s)
    }

    pub fn start_s(&self) -> f64 {
        self.times_s[0]
    }

    pub fn end_s(&self) -> f64 {
        self.times_s[self.times_s.len() - 1]
    }

    pub fn times_s(&self) -> &[f64] {
        &self.times_s
    }

    pub fn len(&self) -> usize {
        self.times_s.len()
    }

    /// Always false: a grid has at least one time.
    pub fn is_empty(&self) -> bool {
        self.times_s.is_empty()
    }
}

impl TryFrom<Vec<f64>> for TimeGrid {
    type Error = PropagationError;

    fn try_from(times_s: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(times_s)
    }
}

impl From<TimeGrid> for Vec<f64> {
    fn from(grid: TimeGrid) -> Self {
        grid.times_s
    }
}

impl fmt::Display for TimeGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} output times from {} s to {} s",
            self.len(),
            self.start_s(),
            self.end_s()
        )
    }
}
