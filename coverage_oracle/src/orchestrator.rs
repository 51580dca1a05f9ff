use std::sync::Arc;
use tracing::{debug, warn};

use crate::checks::{
    CoordinateValidator, LocationFix, MovementConsistencyAnalyzer, SignalPlausibilityChecker,
};
use crate::config::OracleConfig;
use crate::error::Result;
use crate::reputation::{ReputationChecker, ReputationSource};
use crate::scoring::ScoringAggregator;
use crate::types::{
    ActivityReport, CheckName, CheckResult, HarnessOutput, VerificationRequest,
    VerificationVerdict,
};

/// Drives the four checks for one submission and assembles the verdict.
///
/// Holds only immutable configuration, so one instance can serve any number of
/// concurrent verifications.
pub struct Orchestrator {
    reputation: ReputationChecker,
    movement: MovementConsistencyAnalyzer,
    scoring: ScoringAggregator,
}

impl Orchestrator {
    /// Create an orchestrator querying the configured HTTP providers
    pub fn new(config: &OracleConfig) -> Result<Self> {
        Ok(Self {
            reputation: ReputationChecker::from_config(&config.reputation)?,
            movement: MovementConsistencyAnalyzer::new(&config.movement),
            scoring: ScoringAggregator::new(&config.scoring),
        })
    }

    /// Create an orchestrator with caller-supplied reputation sources
    pub fn with_sources(config: &OracleConfig, sources: Vec<Arc<dyn ReputationSource>>) -> Self {
        Self {
            reputation: ReputationChecker::with_sources(&config.reputation, sources),
            movement: MovementConsistencyAnalyzer::new(&config.movement),
            scoring: ScoringAggregator::new(&config.scoring),
        }
    }

    /// Score a well-formed report. Never fails: rule violations are recorded as failed checks.
    pub async fn verify(&self, report: &ActivityReport) -> VerificationVerdict {
        let gps = CoordinateValidator::validate(report.latitude, report.longitude);
        let signal = SignalPlausibilityChecker::validate(report.signal_strength_dbm);

        let movement = report
            .previous_location
            .as_ref()
            .map(|previous| match report.timestamp_unix {
                Some(timestamp_unix) => {
                    let current = LocationFix {
                        latitude: report.latitude,
                        longitude: report.longitude,
                        timestamp_unix,
                    };
                    self.movement.analyze(&current, &LocationFix::from(previous))
                }
                None => CheckResult::fail(
                    CheckName::Movement,
                    "Cannot verify movement: submission has no timestamp",
                ),
            });
        if movement.is_none() {
            debug!("No previous location supplied, skipping movement check");
        }

        let ip_reputation = self.reputation.check(&report.source_ip).await;

        let mut checks = vec![gps, ip_reputation, signal];
        checks.extend(movement);

        self.scoring.aggregate(checks, report.timestamp_unix)
    }

    /// Parse a raw harness payload, verify it and render the output line
    pub async fn verify_payload(&self, payload: &str) -> HarnessOutput {
        let request = match VerificationRequest::from_json(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejecting request: {}", e);
                return HarnessOutput::from_error(&e, recover_user_id(payload));
            }
        };

        let report = match request.to_report() {
            Ok(report) => report,
            Err(e) => {
                warn!("Rejecting request: {}", e);
                return HarnessOutput::from_error(&e, request.user_id);
            }
        };

        let verdict = self.verify(&report).await;
        HarnessOutput::from_verdict(verdict, request.user_id)
    }
}

/// Best-effort `user_id` from a payload that failed typed parsing
fn recover_user_id(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value.get("user_id")?.as_str().map(str::to_string)
}
