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

/*! # starmap

Relative motion of a chaser spacecraft about a J2 and drag perturbed reference orbit, propagated
together with its state transition matrix, and single impulse targeting built on that matrix.

```ignore
use starmap::prelude::*;

let orbit = ReferenceOrbit::try_keplerian(6_678_136.6, 1e-4, 0.52, 0.0, 0.0, 0.0, EARTH_GM)?;
let init = RelativeState::from_cartesian(&orbit, &Vector6::new(0.1, 0.1, 0.01, -0.02, 0.0, 0.01));
let grid = TimeGrid::uniform(0.0, 10.0, 1000)?;
let dynamics = RelativeDynamics::around(&orbit, DragConfig::none());
let result = starmap::md::target(init, &grid, Vector3::new(10.0, 0.0, 0.0), dynamics);
```
*/

/// Provides the adaptive Runge Kutta propagators used to integrate the coupled state and STM.
pub mod propagators;

/// Provides the relative motion dynamics, its Jacobian and the atmospheric drag model.
pub mod dynamics;

/// Provides the central body, the reference orbit and the relative state.
pub mod cosmic;

/// Utility functions shared by different modules, including the state packing helpers.
pub mod utils;

mod errors;
/// Functions which may fail return one of the module errors, all of which convert into this one.
pub use self::errors::StarmapError;

/// Scenario configuration files and trajectory export.
pub mod io;

/// Mission design tools: trajectories, single impulse targeting and parameter sweeps.
pub mod md;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::{CentralBody, ReferenceOrbit, ReferenceState, RelativeState, State};

pub mod prelude {
    pub use crate::cosmic::{
        CentralBody, ReferenceOrbit, ReferenceState, RelativeState, State, EARTH_GM,
    };
    pub use crate::dynamics::{
        DragConfig, Dynamics, ExponentialAtmosphere, RelativeDynamics, RelativeJacobian,
    };
    pub use crate::io::{ConfigRepr, Configurable, ExportCfg, Scenario, ScenarioConfig};
    pub use crate::linalg::{Matrix3, Matrix6, Vector3, Vector6};
    pub use crate::md::{RelativeTraj, TargetingResult, Targeter, Traj};
    pub use crate::propagators::{
        CancelToken, CashKarp45, Dormand45, Fehlberg45, PropOpts, Propagator, TimeGrid,
    };
    pub use crate::time::{Duration, Unit};
}
