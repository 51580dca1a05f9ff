use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use super::policy::ProviderReport;
use crate::config::ProviderConfig;
use crate::error::{OracleError, Result};

/// A service that can describe who operates an IP address
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Fetch the provider's description of `ip`
    async fn lookup(&self, ip: IpAddr) -> Result<ProviderReport>;
}

/// Implementation of ReputationSource over a JSON HTTP endpoint
pub struct HttpReputationSource {
    name: String,
    url_template: String,
    client: reqwest::Client,
}

impl HttpReputationSource {
    /// Create a source; `timeout` bounds each request end to end
    pub fn new(provider: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coverage-oracle/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            name: provider.name.clone(),
            url_template: provider.url_template.clone(),
            client,
        })
    }

    /// Expand the URL template for an address
    pub fn url_for(&self, ip: IpAddr) -> String {
        self.url_template.replace("{ip}", &ip.to_string())
    }
}

#[async_trait]
impl ReputationSource for HttpReputationSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, ip: IpAddr) -> Result<ProviderReport> {
        let url = self.url_for(ip);
        debug!("Querying reputation provider {} at {}", self.name, url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OracleError::Provider(format!(
                "{} returned HTTP {}",
                self.name,
                response.status()
            )));
        }

        let report = response.json::<ProviderReport>().await.map_err(|e| {
            OracleError::Provider(format!("{} returned an unreadable body: {}", self.name, e))
        })?;

        Ok(report)
    }
}
