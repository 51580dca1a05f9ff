// Coverage Oracle
//
// Verification engine for DePIN Lite proof-of-coverage submissions. Contributors report a
// location and a WiFi signal reading; before the on-chain program pays out a reward, this
// oracle decides whether the report is trustworthy.
//
// # Pipeline
//
// * **GPS**: range, null-island and open-ocean checks (30 points)
// * **IP reputation**: VPN / proxy / datacenter detection via external providers (40 points)
// * **Signal**: WiFi signal strength plausibility (20 points)
// * **Movement**: travel speed since the previous submission, when one is supplied (10 points)
//
// A report is verified when its score reaches 70. Nothing is persisted between calls.
//
// # Usage
//
// ```rust,no_run
// use coverage_oracle::{config::OracleConfig, orchestrator::Orchestrator};
//
// async fn example(payload: &str) -> Result<bool, Box<dyn std::error::Error>> {
//     let config = OracleConfig::load(None)?;
//     let orchestrator = Orchestrator::new(&config)?;
//     let output = orchestrator.verify_payload(payload).await;
//     println!("{}", output.to_json_line()?);
//     Ok(output.verified())
// }
// ```

/// Local sub-checks: coordinates, signal strength and movement consistency.
pub mod checks;

/// Layered configuration (defaults, file, environment) and the policy switches.
pub mod config;

/// Error types for the oracle.
pub mod error;

/// Tracing subscriber setup.
pub mod logging;

/// Request parsing and the end-to-end verification flow.
pub mod orchestrator;

/// IP reputation providers, keyword policy and the multi-provider checker.
pub mod reputation;

/// Weighted score and pass/fail decision.
pub mod scoring;

/// Reports, check results, verdicts and the harness wire format.
pub mod types;


pub use config::OracleConfig;
pub use error::{OracleError, Result};
pub use orchestrator::Orchestrator;
pub use types::{ActivityReport, CheckName, CheckResult, HarnessOutput, VerificationVerdict};
