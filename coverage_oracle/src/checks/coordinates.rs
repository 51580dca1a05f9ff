use tracing::debug;

use crate::types::{CheckName, CheckResult};

/// Coordinates closer than this to (0, 0) on both axes are treated as a spoofed default
const NULL_ISLAND_EPSILON: f64 = 0.001;

/// Rough bounding box around the center of an ocean
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OceanBox {
    pub name: &'static str,
    pub latitude: (f64, f64),
    pub longitude: (f64, f64),
}

impl OceanBox {
    /// Inclusive containment test
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.latitude.0..=self.latitude.1).contains(&latitude)
            && (self.longitude.0..=self.longitude.1).contains(&longitude)
    }
}

/// Open-ocean areas where no WiFi coverage can be contributed
pub const OCEAN_BOXES: [OceanBox; 3] = [
    OceanBox {
        name: "Pacific",
        latitude: (-10.0, 10.0),
        longitude: (-170.0, -120.0),
    },
    OceanBox {
        name: "Atlantic",
        latitude: (-10.0, 10.0),
        longitude: (-40.0, -10.0),
    },
    OceanBox {
        name: "Indian",
        latitude: (-20.0, 0.0),
        longitude: (60.0, 100.0),
    },
];

/// Range and plausibility checks on reported coordinates
pub struct CoordinateValidator;

impl CoordinateValidator {
    /// Validate a latitude/longitude pair
    pub fn validate(latitude: f64, longitude: f64) -> CheckResult {
        let result = Self::evaluate(latitude, longitude);
        debug!(
            "GPS check for ({}, {}): passed={} reason={}",
            latitude, longitude, result.passed, result.reason
        );
        result
    }

    fn evaluate(latitude: f64, longitude: f64) -> CheckResult {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return CheckResult::fail(CheckName::Gps, "GPS coordinates out of valid range");
        }

        if latitude.abs() < NULL_ISLAND_EPSILON && longitude.abs() < NULL_ISLAND_EPSILON {
            return CheckResult::fail(CheckName::Gps, "Suspicious coordinates near null island");
        }

        if let Some(ocean) = OCEAN_BOXES.iter().find(|b| b.contains(latitude, longitude)) {
            return CheckResult::fail(
                CheckName::Gps,
                format!("Coordinates appear to be in middle of ocean ({})", ocean.name),
            );
        }

        CheckResult::pass(CheckName::Gps, "GPS coordinates valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_coordinates_pass() {
        for (lat, lng) in [
            (37.7749, -122.4194),
            (40.7128, -74.0060),
            (-33.8688, 151.2093),
            (51.5074, -0.1278),
            (90.0, 180.0),
            (-90.0, -180.0),
        ] {
            let result = CoordinateValidator::validate(lat, lng);
            assert!(result.passed, "({}, {}) should pass: {}", lat, lng, result.reason);
            assert_eq!(result.points_awarded, 30);
        }
    }

    #[test]
    fn test_latitude_out_of_range_fails_for_any_longitude() {
        for lng in [-180.0, -45.5, 0.0, 12.3, 180.0] {
            let result = CoordinateValidator::validate(91.0, lng);
            assert!(!result.passed);
            assert_eq!(result.points_awarded, 0);
            assert!(result.reason.contains("out of valid range"));
        }
    }

    #[test]
    fn test_longitude_out_of_range() {
        let result = CoordinateValidator::validate(10.0, -180.5);
        assert!(!result.passed);
        assert!(result.reason.contains("out of valid range"));
    }

    #[test]
    fn test_nan_is_out_of_range() {
        assert!(!CoordinateValidator::validate(f64::NAN, 10.0).passed);
    }

    #[test]
    fn test_null_island() {
        let result = CoordinateValidator::validate(0.0001, 0.0001);
        assert!(!result.passed);
        assert!(result.reason.contains("null island"));

        // outside the epsilon on one axis
        let result = CoordinateValidator::validate(0.0001, 0.002);
        assert!(result.passed);
    }

    #[test]
    fn test_ocean_boxes() {
        let pacific = CoordinateValidator::validate(0.0, -150.0);
        assert!(!pacific.passed);
        assert!(pacific.reason.contains("Pacific"));

        let atlantic = CoordinateValidator::validate(-5.0, -25.0);
        assert!(atlantic.reason.contains("Atlantic"));

        let indian = CoordinateValidator::validate(-10.0, 80.0);
        assert!(indian.reason.contains("Indian"));

        // box edges are inclusive
        assert!(!CoordinateValidator::validate(10.0, -120.0).passed);
        // just outside the Indian box
        assert!(CoordinateValidator::validate(0.5, 80.0).passed);
    }
}
