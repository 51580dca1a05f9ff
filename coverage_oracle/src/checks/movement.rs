use tracing::debug;

use crate::config::MovementConfig;
use crate::types::{CheckName, CheckResult, PreviousLocation};

/// Mean Earth radius used by the Haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// A position at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_unix: i64,
}

impl From<&PreviousLocation> for LocationFix {
    fn from(previous: &PreviousLocation) -> Self {
        Self {
            latitude: previous.latitude,
            longitude: previous.longitude,
            timestamp_unix: previous.timestamp_unix,
        }
    }
}

/// Great-circle distance in kilometers between two points given in degrees
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Checks that the contributor could physically have traveled between two submissions
#[derive(Debug, Clone)]
pub struct MovementConsistencyAnalyzer {
    max_speed_kmh: f64,
}

impl MovementConsistencyAnalyzer {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            max_speed_kmh: config.max_speed_kmh,
        }
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed_kmh
    }

    /// Average speed needed to get from `previous` to `current`; infinite when no time elapsed
    pub fn required_speed_kmh(current: &LocationFix, previous: &LocationFix) -> (f64, f64, f64) {
        let distance_km = haversine_km(
            previous.latitude,
            previous.longitude,
            current.latitude,
            current.longitude,
        );
        let elapsed_hours =
            (current.timestamp_unix as f64 - previous.timestamp_unix as f64) / SECONDS_PER_HOUR;
        let speed_kmh = if elapsed_hours > 0.0 {
            distance_km / elapsed_hours
        } else {
            f64::INFINITY
        };

        (distance_km, elapsed_hours, speed_kmh)
    }

    pub fn analyze(&self, current: &LocationFix, previous: &LocationFix) -> CheckResult {
        if current
            .timestamp_unix
            .checked_sub(previous.timestamp_unix)
            .is_none()
        {
            return CheckResult::fail(
                CheckName::Movement,
                format!(
                    "Implausible timestamps: {} after previous submission at {}",
                    current.timestamp_unix, previous.timestamp_unix
                ),
            );
        }

        let (distance_km, elapsed_hours, speed_kmh) = Self::required_speed_kmh(current, previous);

        debug!(
            "Movement check: {:.1} km in {:.3} h, {:.1} km/h (limit {} km/h)",
            distance_km, elapsed_hours, speed_kmh, self.max_speed_kmh
        );

        if elapsed_hours <= 0.0 {
            return CheckResult::fail(
                CheckName::Movement,
                format!(
                    "Impossible movement: {:.1}km with no elapsed time since previous submission",
                    distance_km
                ),
            );
        }

        if speed_kmh > self.max_speed_kmh {
            return CheckResult::fail(
                CheckName::Movement,
                format!(
                    "Impossible movement: {:.1}km in {:.1}h requires {:.1}km/h (limit {:.0}km/h)",
                    distance_km, elapsed_hours, speed_kmh, self.max_speed_kmh
                ),
            );
        }

        CheckResult::pass(
            CheckName::Movement,
            format!(
                "Movement pattern valid: {:.1}km in {:.1}h at {:.1}km/h",
                distance_km, elapsed_hours, speed_kmh
            ),
        )
    }
}
