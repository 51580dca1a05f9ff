use serde::Deserialize;
use std::fmt;

use crate::config::ReputationConfig;

/// `company` object returned by ipinfo-style providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// `privacy` object returned by ipinfo-style providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrivacyInfo {
    #[serde(default)]
    pub vpn: Option<bool>,
    #[serde(default)]
    pub proxy: Option<bool>,
    #[serde(default)]
    pub hosting: Option<bool>,
}

/// The parts of an IP-intelligence response the oracle looks at
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderReport {
    /// Organization / ASN owner name
    #[serde(default)]
    pub org: Option<String>,

    #[serde(default)]
    pub company: Option<CompanyInfo>,

    #[serde(default)]
    pub proxy: Option<bool>,

    #[serde(default)]
    pub vpn: Option<bool>,

    #[serde(default)]
    pub hosting: Option<bool>,

    #[serde(default)]
    pub privacy: Option<PrivacyInfo>,

    /// Set by ipapi.co on rate limiting and reserved addresses
    #[serde(default)]
    pub error: Option<bool>,

    #[serde(default)]
    pub reason: Option<String>,
}

impl ProviderReport {
    /// Whether the provider actually answered the question
    pub fn is_usable(&self) -> bool {
        !self.error.unwrap_or(false)
    }

    /// Organization and company names, lowercased
    pub fn organization_names(&self) -> Vec<String> {
        let company = self.company.as_ref().and_then(|c| c.name.as_deref());
        [self.org.as_deref(), company]
            .into_iter()
            .flatten()
            .map(|name| name.to_lowercase())
            .collect()
    }

    pub fn flagged_proxy(&self) -> bool {
        self.proxy.unwrap_or(false)
            || self.privacy.as_ref().and_then(|p| p.proxy).unwrap_or(false)
    }

    pub fn flagged_vpn(&self) -> bool {
        self.vpn.unwrap_or(false) || self.privacy.as_ref().and_then(|p| p.vpn).unwrap_or(false)
    }

    pub fn flagged_hosting(&self) -> bool {
        self.hosting.unwrap_or(false)
            || self.privacy.as_ref().and_then(|p| p.hosting).unwrap_or(false)
    }
}

/// Why an IP was judged untrustworthy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReputationMatch {
    /// Organization name contains a known VPN service name
    VpnProvider(String),
    /// Organization name contains a hosting / datacenter keyword
    Datacenter(String),
    ProxyFlag,
    VpnFlag,
    HostingFlag,
}

impl fmt::Display for ReputationMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReputationMatch::VpnProvider(term) => {
                write!(f, "IP associated with VPN provider: {}", term)
            }
            ReputationMatch::Datacenter(term) => {
                write!(f, "IP from datacenter/hosting provider: {}", term)
            }
            ReputationMatch::ProxyFlag => f.write_str("IP flagged as proxy"),
            ReputationMatch::VpnFlag => f.write_str("IP flagged as VPN"),
            ReputationMatch::HostingFlag => f.write_str("IP flagged as hosting network"),
        }
    }
}

/// Typed result of asking reputation providers about an IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Matched(ReputationMatch),
    Clean,
    /// No usable answer; carries the last failure for logging
    Unreachable(String),
}

/// Immutable keyword tables used to classify provider responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationPolicy {
    vpn_providers: Vec<String>,
    datacenter_keywords: Vec<String>,
}

impl ReputationPolicy {
    pub fn new<V, D>(vpn_providers: V, datacenter_keywords: D) -> Self
    where
        V: IntoIterator,
        V::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            vpn_providers: normalize(vpn_providers),
            datacenter_keywords: normalize(datacenter_keywords),
        }
    }

    pub fn from_config(config: &ReputationConfig) -> Self {
        Self::new(&config.vpn_providers, &config.datacenter_keywords)
    }

    /// Classify one provider response. VPN names win over datacenter keywords,
    /// keyword matches win over boolean flags.
    pub fn classify(&self, report: &ProviderReport) -> ProviderOutcome {
        if !report.is_usable() {
            return ProviderOutcome::Unreachable(format!(
                "provider reported an error: {}",
                report.reason.as_deref().unwrap_or("unspecified")
            ));
        }

        let names = report.organization_names();

        if let Some(term) = find_fragment(&self.vpn_providers, &names) {
            return ProviderOutcome::Matched(ReputationMatch::VpnProvider(term));
        }

        if let Some(term) = find_fragment(&self.datacenter_keywords, &names) {
            return ProviderOutcome::Matched(ReputationMatch::Datacenter(term));
        }

        if report.flagged_proxy() {
            return ProviderOutcome::Matched(ReputationMatch::ProxyFlag);
        }
        if report.flagged_vpn() {
            return ProviderOutcome::Matched(ReputationMatch::VpnFlag);
        }
        if report.flagged_hosting() {
            return ProviderOutcome::Matched(ReputationMatch::HostingFlag);
        }

        ProviderOutcome::Clean
    }
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self::from_config(&ReputationConfig::default())
    }
}

fn normalize<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    terms
        .into_iter()
        .map(|term| term.as_ref().trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

fn find_fragment(fragments: &[String], names: &[String]) -> Option<String> {
    fragments
        .iter()
        .find(|fragment| names.iter().any(|name| name.contains(fragment.as_str())))
        .cloned()
}
