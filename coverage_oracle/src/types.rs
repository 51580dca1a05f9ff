use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OracleError, Result};

/// Points available when every check runs
pub const MAX_SCORE: u32 = 100;

/// Score a report must reach (out of [`MAX_SCORE`]) to be verified
pub const VERIFICATION_THRESHOLD: u32 = 70;

/// Identifies one of the four sub-checks of the verification pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckName {
    /// Coordinate range and plausibility
    Gps,
    /// VPN / proxy / datacenter origin of the submitting IP
    IpReputation,
    /// WiFi signal strength plausibility
    Signal,
    /// Travel speed against the previous submission
    Movement,
}

impl CheckName {
    /// Canonical output order of the checks
    pub const CANONICAL_ORDER: [CheckName; 4] = [
        CheckName::Gps,
        CheckName::IpReputation,
        CheckName::Signal,
        CheckName::Movement,
    ];

    /// Fixed number of points this check is worth
    pub const fn weight(self) -> u32 {
        match self {
            CheckName::Gps => 30,
            CheckName::IpReputation => 40,
            CheckName::Signal => 20,
            CheckName::Movement => 10,
        }
    }

    /// Short label used as the prefix of failure reasons
    pub const fn label(self) -> &'static str {
        match self {
            CheckName::Gps => "GPS",
            CheckName::IpReputation => "IP",
            CheckName::Signal => "Signal",
            CheckName::Movement => "Movement",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckName::Gps => "GPS",
            CheckName::IpReputation => "IP_REPUTATION",
            CheckName::Signal => "SIGNAL",
            CheckName::Movement => "MOVEMENT",
        };
        f.write_str(name)
    }
}

/// Where and when the contributor last submitted, supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviousLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_unix: i64,
}

/// A single proof-of-coverage submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    /// Latitude in degrees, expected in [-90, 90]
    pub latitude: f64,

    /// Longitude in degrees, expected in [-180, 180]
    pub longitude: f64,

    /// Reported WiFi signal strength in dBm
    pub signal_strength_dbm: i32,

    /// Address the submission came from; may be empty
    pub source_ip: String,

    /// Submission time, echoed into the verdict
    pub timestamp_unix: Option<i64>,

    /// Last accepted location of the same contributor, if the caller has one
    pub previous_location: Option<PreviousLocation>,
}

/// Outcome of one sub-check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: CheckName,
    pub passed: bool,
    /// Human-readable explanation, always populated
    pub reason: String,
    pub points_awarded: u32,
    pub max_points: u32,
}

impl CheckResult {
    /// A passing result worth the check's full weight
    pub fn pass(name: CheckName, reason: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            reason: reason.into(),
            points_awarded: name.weight(),
            max_points: name.weight(),
        }
    }

    /// A failing result worth zero points
    pub fn fail(name: CheckName, reason: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            reason: reason.into(),
            points_awarded: 0,
            max_points: name.weight(),
        }
    }
}

/// Scored pass/fail outcome of one verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub verified: bool,
    pub score: u32,
    pub max_score: u32,
    /// Threshold actually applied to `score`
    pub threshold: u32,
    /// Results in canonical order (GPS, IP_REPUTATION, SIGNAL, MOVEMENT)
    pub checks: Vec<CheckResult>,
    /// One entry per failed check, plus an overall line when not verified
    pub reasons: Vec<String>,
    pub timestamp_unix: Option<i64>,
}

impl VerificationVerdict {
    /// Look up the result of a single check
    pub fn check(&self, name: CheckName) -> Option<&CheckResult> {
        self.checks.iter().find(|check| check.name == name)
    }
}

/// Inbound request as produced by the submission harness
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationRequest {
    pub activity: ActivityPayload,
    #[serde(default)]
    pub user_ip: Option<String>,
    #[serde(default)]
    pub previous_location: Option<PreviousLocationPayload>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `activity` object of the inbound request
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityPayload {
    pub gps_lat: f64,
    pub gps_long: f64,
    pub signal_strength: f64,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// `previous_location` object of the inbound request
#[derive(Debug, Clone, Deserialize)]
pub struct PreviousLocationPayload {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: f64,
}

impl VerificationRequest {
    /// Parse a raw JSON payload
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| OracleError::InvalidInput(format!("malformed request: {}", e)))
    }

    /// Validate the numeric fields and build the typed report
    pub fn to_report(&self) -> Result<ActivityReport> {
        let activity = &self.activity;
        require_finite("activity.gps_lat", activity.gps_lat)?;
        require_finite("activity.gps_long", activity.gps_long)?;
        require_finite("activity.signal_strength", activity.signal_strength)?;
        if let Some(timestamp) = activity.timestamp {
            require_finite("activity.timestamp", timestamp)?;
        }

        let previous_location = match &self.previous_location {
            Some(previous) => {
                require_finite("previous_location.lat", previous.lat)?;
                require_finite("previous_location.lng", previous.lng)?;
                require_finite("previous_location.timestamp", previous.timestamp)?;
                Some(PreviousLocation {
                    latitude: previous.lat,
                    longitude: previous.lng,
                    timestamp_unix: whole_seconds(previous.timestamp),
                })
            }
            None => None,
        };

        Ok(ActivityReport {
            latitude: activity.gps_lat,
            longitude: activity.gps_long,
            // whole dBm, truncated toward zero; `as` saturates out-of-range values
            signal_strength_dbm: activity.signal_strength.trunc() as i32,
            source_ip: self.user_ip.clone().unwrap_or_default().trim().to_string(),
            timestamp_unix: activity.timestamp.map(whole_seconds),
            previous_location,
        })
    }
}

/// Unix seconds truncated toward zero; out-of-range values saturate
fn whole_seconds(timestamp: f64) -> i64 {
    timestamp.trunc() as i64
}

fn require_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OracleError::InvalidInput(format!("{} must be a finite number", field)))
    }
}

/// Scored result line written for the harness
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictOutput {
    pub verified: bool,
    pub score: u32,
    pub max_score: u32,
    pub threshold: u32,
    pub checks: Vec<CheckResult>,
    pub reasons: Vec<String>,
    pub timestamp: Option<i64>,
    pub user_id: Option<String>,
}

/// Error line written for the harness when the payload cannot be scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorOutput {
    pub verified: bool,
    pub error: String,
    pub timestamp: Option<i64>,
    pub user_id: Option<String>,
}

/// The single JSON line the harness reads from stdout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HarnessOutput {
    Verdict(VerdictOutput),
    Error(ErrorOutput),
}

impl HarnessOutput {
    pub fn from_verdict(verdict: VerificationVerdict, user_id: Option<String>) -> Self {
        HarnessOutput::Verdict(VerdictOutput {
            verified: verdict.verified,
            score: verdict.score,
            max_score: verdict.max_score,
            threshold: verdict.threshold,
            checks: verdict.checks,
            reasons: verdict.reasons,
            timestamp: verdict.timestamp_unix,
            user_id,
        })
    }

    pub fn from_error(error: impl fmt::Display, user_id: Option<String>) -> Self {
        HarnessOutput::Error(ErrorOutput {
            verified: false,
            error: error.to_string(),
            timestamp: None,
            user_id,
        })
    }

    pub fn verified(&self) -> bool {
        match self {
            HarnessOutput::Verdict(output) => output.verified,
            HarnessOutput::Error(_) => false,
        }
    }

    /// Process exit code: 0 when verified, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.verified() {
            0
        } else {
            1
        }
    }

    /// Serialize as one line of JSON
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_max_score() {
        let total: u32 = CheckName::CANONICAL_ORDER.iter().map(|name| name.weight()).sum();
        assert_eq!(total, MAX_SCORE);
    }

    #[test]
    fn test_check_result_points_follow_outcome() {
        let passed = CheckResult::pass(CheckName::IpReputation, "ok");
        assert_eq!(passed.points_awarded, 40);
        assert_eq!(passed.max_points, 40);

        let failed = CheckResult::fail(CheckName::IpReputation, "no");
        assert_eq!(failed.points_awarded, 0);
        assert_eq!(failed.max_points, 40);
    }

    #[test]
    fn test_check_name_wire_format() {
        let json = serde_json::to_string(&CheckName::IpReputation).unwrap();
        assert_eq!(json, "\"IP_REPUTATION\"");
        assert_eq!(CheckName::Gps.to_string(), "GPS");
    }

    #[test]
    fn test_request_parsing() {
        let payload = r#"{
            "activity": {"gps_lat": 37.7749, "gps_long": -122.4194, "signal_strength": -65, "timestamp": 1700000000},
            "user_ip": " 8.8.8.8 ",
            "previous_location": {"lat": 37.0, "lng": -122.0, "timestamp": 1699990000},
            "user_id": "contributor-1"
        }"#;

        let request = VerificationRequest::from_json(payload).unwrap();
        let report = request.to_report().unwrap();

        assert_eq!(report.signal_strength_dbm, -65);
        assert_eq!(report.source_ip, "8.8.8.8");
        assert_eq!(report.timestamp_unix, Some(1_700_000_000));
        assert_eq!(report.previous_location.unwrap().timestamp_unix, 1_699_990_000);
        assert_eq!(request.user_id.as_deref(), Some("contributor-1"));
    }

    #[test]
    fn test_fractional_signal_is_truncated() {
        let payload = r#"{"activity": {"gps_lat": 1.5, "gps_long": 2.5, "signal_strength": -65.9}}"#;
        let report = VerificationRequest::from_json(payload).unwrap().to_report().unwrap();

        assert_eq!(report.signal_strength_dbm, -65);
        assert_eq!(report.source_ip, "");
        assert!(report.previous_location.is_none());
    }

    #[test]
    fn test_fractional_timestamps_are_truncated() {
        let payload = r#"{
            "activity": {"gps_lat": 1.5, "gps_long": 2.5, "signal_strength": -65, "timestamp": 1700000000.5},
            "previous_location": {"lat": 1.0, "lng": 2.0, "timestamp": 1699990000.9}
        }"#;
        let report = VerificationRequest::from_json(payload).unwrap().to_report().unwrap();

        assert_eq!(report.timestamp_unix, Some(1_700_000_000));
        assert_eq!(report.previous_location.unwrap().timestamp_unix, 1_699_990_000);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let payload = r#"{
            "activity": {"gps_lat": 1.5, "gps_long": 2.5, "signal_strength": -65, "timestamp": 9223372036854775807},
            "previous_location": {"lat": 1.0, "lng": 2.0, "timestamp": -9223372036854775808}
        }"#;
        let report = VerificationRequest::from_json(payload).unwrap().to_report().unwrap();

        assert_eq!(report.timestamp_unix, Some(i64::MAX));
        assert_eq!(report.previous_location.unwrap().timestamp_unix, i64::MIN);
    }

    #[test]
    fn test_missing_required_field_is_input_error() {
        let payload = r#"{"activity": {"gps_lat": 1.5, "signal_strength": -65}, "user_ip": "1.1.1.1"}"#;
        let err = VerificationRequest::from_json(payload).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("gps_long"));
    }

    #[test]
    fn test_non_numeric_field_is_input_error() {
        let payload = r#"{"activity": {"gps_lat": "north", "gps_long": 2.0, "signal_strength": -65}}"#;
        assert!(VerificationRequest::from_json(payload).unwrap_err().is_input_error());
    }

    #[test]
    fn test_error_output_shape() {
        let output = HarnessOutput::from_error(&OracleError::InvalidInput("bad".to_string()), None);
        let value: serde_json::Value = serde_json::from_str(&output.to_json_line().unwrap()).unwrap();

        assert_eq!(value["verified"], false);
        assert_eq!(value["error"], "Invalid input: bad");
        assert!(value["timestamp"].is_null());
        assert!(value["user_id"].is_null());
        assert!(value.get("checks").is_none());
        assert_eq!(output.exit_code(), 1);
    }
}
