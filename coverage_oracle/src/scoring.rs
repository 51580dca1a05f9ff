use tracing::info;

use crate::config::{ScoringConfig, ThresholdMode};
use crate::types::{CheckResult, VerificationVerdict, MAX_SCORE, VERIFICATION_THRESHOLD};

/// Combines sub-check results into a scored verdict
#[derive(Debug, Clone)]
pub struct ScoringAggregator {
    threshold_mode: ThresholdMode,
}

impl ScoringAggregator {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            threshold_mode: config.threshold_mode,
        }
    }

    /// Threshold to apply when only `achievable` points were on offer
    pub fn threshold_for(&self, achievable: u32) -> u32 {
        match self.threshold_mode {
            ThresholdMode::Fixed => VERIFICATION_THRESHOLD,
            // ceil(70% of achievable)
            ThresholdMode::Renormalized => {
                (VERIFICATION_THRESHOLD * achievable + MAX_SCORE - 1) / MAX_SCORE
            }
        }
    }

    /// Sum the checks and decide; checks are reordered canonically
    pub fn aggregate(
        &self,
        mut checks: Vec<CheckResult>,
        timestamp_unix: Option<i64>,
    ) -> VerificationVerdict {
        checks.sort_by_key(|check| check.name);

        let score: u32 = checks.iter().map(|check| check.points_awarded).sum();
        let achievable: u32 = checks.iter().map(|check| check.max_points).sum();
        let threshold = self.threshold_for(achievable);
        let verified = score >= threshold;

        let mut reasons: Vec<String> = checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| format!("{}: {}", check.name.label(), check.reason))
            .collect();

        if !verified {
            reasons.push(format!(
                "Overall score {}/{} below threshold {}",
                score, MAX_SCORE, threshold
            ));
        }

        info!(
            "Verdict: verified={} score={}/{} threshold={} checks={}",
            verified,
            score,
            MAX_SCORE,
            threshold,
            checks.len()
        );

        VerificationVerdict {
            verified,
            score,
            max_score: MAX_SCORE,
            threshold,
            checks,
            reasons,
            timestamp_unix,
        }
    }
}

impl Default for ScoringAggregator {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}
