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

use super::{propagate_with, RelativeTraj};
use crate::cosmic::{ReferenceOrbit, RelativeState};
use crate::dynamics::RelativeDynamics;
use crate::linalg::Vector6;
use crate::propagators::{ErrorCtrl, PropagationError, Propagator, TimeGrid};
use crate::time::Unit;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64Mcg;
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SweepError {
    #[snafu(display("invalid sweep: {reason}"))]
    InvalidSweep { reason: &'static str },
}

/// Component of the initial relative Cartesian state `[x, y, z, vx, vy, vz]`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    X,
    Y,
    Z,
    Vx,
    Vy,
    Vz,
}

impl Component {
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::Vx => 3,
            Self::Vy => 4,
            Self::Vz => 5,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::X | Self::Y | Self::Z => "m",
            _ => "m/s",
        }
    }
}

/// Varies one component of the nominal state over `[nominal - span, nominal + span]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub component: Component,
    pub span: f64,
}

impl SweepAxis {
    pub fn new(component: Component, span: f64) -> Self {
        Self { component, span }
    }
}

/// Summary of the propagation of one initial state of a sweep
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint {
    pub index: usize,
    /// Initial relative Cartesian state
    pub initial: Vector6<f64>,
    pub stable: bool,
    pub min_range_m: f64,
    pub max_range_m: f64,
    /// True if the propagation is stable and the range stayed within the bounds of the sweep
    pub within_bounds: bool,
    pub failure: Option<PropagationError>,
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#{} {:?}: range in [{:.3}, {:.3}] m, stable: {}, within bounds: {}",
            self.index,
            self.initial.as_slice(),
            self.min_range_m,
            self.max_range_m,
            self.stable,
            self.within_bounds
        )
    }
}

/// Runs many independent relative propagations about the same reference orbit, in parallel.
///
/// Initial states are either a grid over two components of the nominal relative Cartesian state or
/// seeded Gaussian dispersions about it. Each run is summarized by its range bounds.
#[derive(Clone, Debug)]
pub struct Sweep {
    pub orbit: ReferenceOrbit,
    /// Nominal relative Cartesian state `[x, y, z, vx, vy, vz]`, in m and m/s
    pub nominal: Vector6<f64>,
    /// Smallest acceptable range, in meters
    pub min_range_m: f64,
    /// Largest acceptable range, in meters
    pub max_range_m: f64,
}

impl Sweep {
    pub fn new(
        orbit: ReferenceOrbit,
        nominal: Vector6<f64>,
        min_range_m: f64,
        max_range_m: f64,
    ) -> Result<Self, SweepError> {
        ensure!(
            min_range_m >= 0.0 && max_range_m > min_range_m,
            InvalidSweepSnafu {
                reason: "range bounds must satisfy 0 <= min < max"
            }
        );
        Ok(Self {
            orbit,
            nominal,
            min_range_m,
            max_range_m,
        })
    }

    /// Initial states on a `resolution` by `resolution` grid, the first axis varying slowest.
    pub fn grid_points(
        &self,
        first: SweepAxis,
        second: SweepAxis,
        resolution: usize,
    ) -> Result<Vec<Vector6<f64>>, SweepError> {
        ensure!(
            resolution >= 2,
            InvalidSweepSnafu {
                reason: "at least two points per axis are needed"
            }
        );
        ensure!(
            first.component != second.component,
            InvalidSweepSnafu {
                reason: "the two axes must vary different components"
            }
        );
        ensure!(
            first.span.is_finite() && second.span.is_finite() && first.span > 0.0 && second.span > 0.0,
            InvalidSweepSnafu {
                reason: "spans must be finite and strictly positive"
            }
        );

        let offset = |axis: &SweepAxis, i: usize| {
            -axis.span + 2.0 * axis.span * (i as f64) / ((resolution - 1) as f64)
        };

        let mut points = Vec::with_capacity(resolution * resolution);
        for i in 0..resolution {
            for j in 0..resolution {
                let mut point = self.nominal;
                point[first.component.index()] += offset(&first, i);
                point[second.component.index()] += offset(&second, j);
                points.push(point);
            }
        }
        Ok(points)
    }

    /// Initial states dispersed with independent normal distributions of the provided standard deviations.
    /// A zero standard deviation keeps the nominal value of that component. Without a seed, the generator
    /// is seeded from the system entropy.
    pub fn dispersed_points(
        &self,
        std_devs: &Vector6<f64>,
        count: usize,
        seed: Option<u128>,
    ) -> Result<Vec<Vector6<f64>>, SweepError> {
        ensure!(
            std_devs.iter().all(|s| s.is_finite() && *s >= 0.0),
            InvalidSweepSnafu {
                reason: "standard deviations must be finite and non negative"
            }
        );
        let mut distributions = Vec::with_capacity(6);
        for (mean, std_dev) in self.nominal.iter().zip(std_devs.iter()) {
            distributions.push(Normal::new(*mean, *std_dev).map_err(|_| {
                SweepError::InvalidSweep {
                    reason: "standard deviations must be finite and non negative",
                }
            })?);
        }

        // The generator is not shared across threads, so all states are drawn first
        let mut rng = match seed {
            Some(seed) => Pcg64Mcg::new(seed),
            None => Pcg64Mcg::from_entropy(),
        };
        Ok((0..count)
            .map(|_| Vector6::from_iterator(distributions.iter().map(|d| d.sample(&mut rng))))
            .collect())
    }

    /// Propagates each initial state through the grid and summarizes it, in the order of the points.
    #[must_use = "sweep results must be used"]
    pub fn run<E: ErrorCtrl>(
        &self,
        prop: &Propagator<RelativeDynamics, E>,
        grid: &TimeGrid,
        points: &[Vector6<f64>],
    ) -> Vec<SweepPoint> {
        let pb = progress_bar(points.len() as u64);
        pb.set_message(format!("{self}"));

        #[cfg(not(target_arch = "wasm32"))]
        let tick = Instant::now();

        let summaries: Vec<SweepPoint> = points
            .par_iter()
            .enumerate()
            .progress_with(pb)
            .map(|(index, initial)| {
                let state = RelativeState::from_cartesian(&self.orbit, initial);
                let traj = propagate_with(prop, state, grid);
                self.summarize(index, *initial, &traj)
            })
            .collect();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let clock_time = tick.elapsed().as_secs_f64() * Unit::Second;
            info!("Propagated {} states in {}", points.len(), clock_time);
        }

        let within = summaries.iter().filter(|p| p.within_bounds).count();
        info!(
            "{within} of {} runs stayed within [{}, {}] m",
            summaries.len(),
            self.min_range_m,
            self.max_range_m
        );

        summaries
    }

    fn summarize(&self, index: usize, initial: Vector6<f64>, traj: &RelativeTraj) -> SweepPoint {
        let min_range_m = traj.min_range_m();
        let max_range_m = traj.max_range_m();
        let stable = traj.stable();
        SweepPoint {
            index,
            initial,
            stable,
            min_range_m,
            max_range_m,
            within_bounds: stable && min_range_m >= self.min_range_m && max_range_m <= self.max_range_m,
            failure: traj.failure.clone(),
        }
    }
}

impl fmt::Display for Sweep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "sweep about {:?} with range bounds [{}, {}] m",
            self.nominal.as_slice(),
            self.min_range_m,
            self.max_range_m
        )
    }
}

// Just the template for the progress bar
fn progress_bar(num_runs: u64) -> ProgressBar {
    let pb = ProgressBar::new(num_runs);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:100.cyan/blue} {pos:>7}/{len:7} {msg}")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}
