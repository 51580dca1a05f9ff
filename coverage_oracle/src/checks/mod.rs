//! Local, synchronous sub-checks of the verification pipeline.
//!
//! None of these perform I/O; each returns a [`CheckResult`](crate::types::CheckResult)
//! whose points follow the fixed weight table.

mod coordinates;
mod movement;
mod signal;

pub use coordinates::{CoordinateValidator, OceanBox, OCEAN_BOXES};
pub use movement::{haversine_km, LocationFix, MovementConsistencyAnalyzer, EARTH_RADIUS_KM};
pub use signal::{SignalPlausibilityChecker, MAX_SIGNAL_DBM, MIN_SIGNAL_DBM};
