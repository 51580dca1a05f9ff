//! IP reputation checking against external IP-intelligence services.
//!
//! The checker walks an ordered list of [`ReputationSource`]s, one attempt each, and
//! stops at the first usable answer. Network failures and timeouts only skip a
//! provider; when nobody answers, the configured [`InconclusivePolicy`] decides.

mod policy;
mod provider;

pub use policy::{
    CompanyInfo, PrivacyInfo, ProviderOutcome, ProviderReport, ReputationMatch, ReputationPolicy,
};
pub use provider::{HttpReputationSource, ReputationSource};

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{InconclusivePolicy, ReputationConfig};
use crate::error::Result;
use crate::types::{CheckName, CheckResult};

/// Scores the submitting IP address
pub struct ReputationChecker {
    sources: Vec<Arc<dyn ReputationSource>>,
    policy: ReputationPolicy,
    provider_timeout: Duration,
    deadline: Duration,
    on_inconclusive: InconclusivePolicy,
    reject_non_public: bool,
}

impl ReputationChecker {
    /// Build HTTP sources for every configured provider
    pub fn from_config(config: &ReputationConfig) -> Result<Self> {
        let sources = config
            .providers
            .iter()
            .map(|provider| {
                HttpReputationSource::new(provider, config.provider_timeout())
                    .map(|source| Arc::new(source) as Arc<dyn ReputationSource>)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::with_sources(config, sources))
    }

    /// Use caller-supplied sources; the provider list in `config` is ignored
    pub fn with_sources(config: &ReputationConfig, sources: Vec<Arc<dyn ReputationSource>>) -> Self {
        Self {
            sources,
            policy: ReputationPolicy::from_config(config),
            provider_timeout: config.provider_timeout(),
            deadline: config.deadline(),
            on_inconclusive: config.on_inconclusive,
            reject_non_public: config.reject_non_public,
        }
    }

    /// Check an IP address string as received from the harness
    pub async fn check(&self, ip: &str) -> CheckResult {
        let ip = ip.trim();
        if ip.is_empty() {
            return CheckResult::fail(CheckName::IpReputation, "No IP address provided");
        }

        let addr: IpAddr = match ip.parse() {
            Ok(addr) => addr,
            Err(_) => {
                return CheckResult::fail(
                    CheckName::IpReputation,
                    format!("Invalid IP address: {}", ip),
                )
            }
        };

        if self.reject_non_public && !is_publicly_routable(&addr) {
            return CheckResult::fail(
                CheckName::IpReputation,
                format!("IP address {} is not publicly routable", addr),
            );
        }

        let outcome = self.assess(addr).await;
        let result = self.resolve(outcome);
        debug!(
            "IP reputation check for {}: passed={} reason={}",
            addr, result.passed, result.reason
        );
        result
    }

    /// Query providers in order under the overall deadline
    pub async fn assess(&self, ip: IpAddr) -> ProviderOutcome {
        match timeout(self.deadline, self.query_sources(ip)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Reputation lookup for {} exceeded deadline of {:?}",
                    ip, self.deadline
                );
                ProviderOutcome::Unreachable("reputation deadline exceeded".to_string())
            }
        }
    }

    async fn query_sources(&self, ip: IpAddr) -> ProviderOutcome {
        let mut last_failure = "no reputation providers configured".to_string();

        for source in &self.sources {
            match timeout(self.provider_timeout, source.lookup(ip)).await {
                Ok(Ok(report)) => match self.policy.classify(&report) {
                    ProviderOutcome::Unreachable(reason) => {
                        warn!("Skipping provider {}: {}", source.name(), reason);
                        last_failure = reason;
                    }
                    outcome => {
                        debug!("Provider {} answered for {}: {:?}", source.name(), ip, outcome);
                        return outcome;
                    }
                },
                Ok(Err(e)) => {
                    warn!("Skipping provider {}: {}", source.name(), e);
                    last_failure = e.to_string();
                }
                Err(_) => {
                    warn!(
                        "Skipping provider {}: no answer within {:?}",
                        source.name(),
                        self.provider_timeout
                    );
                    last_failure = format!("{} timed out", source.name());
                }
            }
        }

        ProviderOutcome::Unreachable(last_failure)
    }

    fn resolve(&self, outcome: ProviderOutcome) -> CheckResult {
        match outcome {
            ProviderOutcome::Matched(matched) => {
                CheckResult::fail(CheckName::IpReputation, matched.to_string())
            }
            ProviderOutcome::Clean => {
                CheckResult::pass(CheckName::IpReputation, "IP reputation check passed")
            }
            ProviderOutcome::Unreachable(_) => match self.on_inconclusive {
                InconclusivePolicy::FailOpen => CheckResult::pass(
                    CheckName::IpReputation,
                    "Unable to verify IP reputation, inconclusive result accepted",
                ),
                InconclusivePolicy::FailClosed => {
                    CheckResult::fail(CheckName::IpReputation, "Unable to verify IP reputation")
                }
            },
        }
    }
}

/// Rejects loopback, private, link-local and other special-purpose ranges
fn is_publicly_routable(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_multicast()
                || v4.is_documentation())
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_publicly_routable(&IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}
