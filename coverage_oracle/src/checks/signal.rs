use tracing::debug;

use crate::types::{CheckName, CheckResult};

/// Weakest value of the accepted WiFi range in dBm
pub const MIN_SIGNAL_DBM: i32 = -100;

/// Strongest value of the accepted WiFi range in dBm
pub const MAX_SIGNAL_DBM: i32 = 0;

/// Below this a reading is too weak to be trusted
const WEAK_SIGNAL_DBM: i32 = -90;

/// Above this a reading is implausible for consumer WiFi
const STRONG_SIGNAL_DBM: i32 = -10;

/// Range and plausibility checks on reported WiFi signal strength
pub struct SignalPlausibilityChecker;

impl SignalPlausibilityChecker {
    pub fn validate(signal_dbm: i32) -> CheckResult {
        let result = Self::evaluate(signal_dbm);
        debug!(
            "Signal check for {} dBm: passed={} reason={}",
            signal_dbm, result.passed, result.reason
        );
        result
    }

    fn evaluate(signal_dbm: i32) -> CheckResult {
        if signal_dbm > MAX_SIGNAL_DBM {
            return CheckResult::fail(
                CheckName::Signal,
                format!("Signal strength {} dBm out of valid range, too strong", signal_dbm),
            );
        }

        if signal_dbm < MIN_SIGNAL_DBM {
            return CheckResult::fail(
                CheckName::Signal,
                format!("Signal strength {} dBm out of valid range, too weak", signal_dbm),
            );
        }

        if signal_dbm < WEAK_SIGNAL_DBM {
            return CheckResult::fail(
                CheckName::Signal,
                format!("Signal strength {} dBm too weak, possible spoofing", signal_dbm),
            );
        }

        if signal_dbm > STRONG_SIGNAL_DBM {
            return CheckResult::fail(
                CheckName::Signal,
                format!("Signal strength {} dBm suspiciously strong", signal_dbm),
            );
        }

        CheckResult::pass(CheckName::Signal, "Signal strength validation passed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typical_signal_passes() {
        let result = SignalPlausibilityChecker::validate(-65);
        assert!(result.passed);
        assert_eq!(result.points_awarded, 20);
    }

    #[test]
    fn test_positive_signal_is_too_strong() {
        let result = SignalPlausibilityChecker::validate(5);
        assert!(!result.passed);
        assert!(result.reason.contains("too strong"));
    }

    #[test]
    fn test_weak_signal_fails() {
        let result = SignalPlausibilityChecker::validate(-95);
        assert!(!result.passed);
        assert!(result.reason.contains("too weak"));
    }

    #[test]
    fn test_far_out_of_range() {
        let result = SignalPlausibilityChecker::validate(-150);
        assert!(!result.passed);
        assert!(result.reason.contains("out of valid range"));
    }

    #[test]
    fn test_boundaries() {
        assert!(SignalPlausibilityChecker::validate(-90).passed);
        assert!(SignalPlausibilityChecker::validate(-10).passed);
        assert!(!SignalPlausibilityChecker::validate(-91).passed);
        assert!(!SignalPlausibilityChecker::validate(-9).passed);

        let zero = SignalPlausibilityChecker::validate(0);
        assert!(zero.reason.contains("suspiciously strong"));
    }
}
