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

use crate::cosmic::AstroError;
use crate::dynamics::DynamicsError;
use crate::io::{ConfigError, ExportError};
use crate::md::sweep::SweepError;
use crate::md::TargetingError;
use crate::propagators::PropagationError;
use crate::utils::StateError;
use snafu::prelude::*;

/// Umbrella error for callers which drive several layers at once, like `Scenario::run_file`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StarmapError {
    #[snafu(display("invalid reference orbit: {source}"))]
    Astro { source: AstroError },
    #[snafu(display("state packing failed: {source}"))]
    Packing { source: StateError },
    #[snafu(display("dynamics failed: {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display("propagation failed: {source}"))]
    Propagation { source: PropagationError },
    #[snafu(display("targeting failed: {source}"))]
    Targeting { source: TargetingError },
    #[snafu(display("sweep failed: {source}"))]
    Sweep { source: SweepError },
    #[snafu(display("configuration error: {source}"))]
    Config { source: ConfigError },
    #[snafu(display("export error: {source}"))]
    Export { source: ExportError },
}

impl From<AstroError> for StarmapError {
    fn from(source: AstroError) -> Self {
        Self::Astro { source }
    }
}

impl From<StateError> for StarmapError {
    fn from(source: StateError) -> Self {
        Self::Packing { source }
    }
}

impl From<DynamicsError> for StarmapError {
    fn from(source: DynamicsError) -> Self {
        Self::Dynamics { source }
    }
}

impl From<PropagationError> for StarmapError {
    fn from(source: PropagationError) -> Self {
        Self::Propagation { source }
    }
}

impl From<TargetingError> for StarmapError {
    fn from(source: TargetingError) -> Self {
        Self::Targeting { source }
    }
}

impl From<SweepError> for StarmapError {
    fn from(source: SweepError) -> Self {
        Self::Sweep { source }
    }
}

impl From<ConfigError> for StarmapError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<ExportError> for StarmapError {
    fn from(source: ExportError) -> Self {
        Self::Export { source }
    }
}
