//! GitHub connector configuration.

use std::time::Duration;

use ipallow_graphql::DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};

use crate::error::{AllowListError, AllowListResult};
use crate::owner::OwnerKind;

/// Configuration for the IP allow-list client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token sent as a bearer token.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Organization whose allow list is managed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Enterprise whose allow list is managed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<String>,

    /// GraphQL endpoint (default: https://api.github.com/graphql)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of concurrent requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Memoize owner listings
    #[serde(default = "default_cache_entries")]
    pub cache_entries: bool,

    /// Request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_ENDPOINT.into()
}

const fn default_concurrency() -> usize {
    1
}

const fn default_cache_entries() -> bool {
    true
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("ipallow/", env!("CARGO_PKG_VERSION"));

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            organization: None,
            enterprise: None,
            base_url: default_base_url(),
            concurrency: default_concurrency(),
            cache_entries: default_cache_entries(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl GithubConfig {
    /// Configuration for an organization.
    #[must_use]
    pub fn for_organization(organization: impl Into<String>) -> Self {
        Self {
            organization: Some(organization.into()),
            ..Self::default()
        }
    }

    /// Configuration for an enterprise.
    #[must_use]
    pub fn for_enterprise(enterprise: impl Into<String>) -> Self {
        Self {
            enterprise: Some(enterprise.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The managed owner; exactly one of organization and enterprise must be set.
    pub fn owner(&self) -> AllowListResult<(OwnerKind, &str)> {
        let organization = non_empty(self.organization.as_deref());
        let enterprise = non_empty(self.enterprise.as_deref());
        match (organization, enterprise) {
            (Some(name), None) => Ok((OwnerKind::Organization, name)),
            (None, Some(name)) => Ok((OwnerKind::Enterprise, name)),
            (Some(_), Some(_)) => Err(AllowListError::Config(
                "only one of organization and enterprise can be set".into(),
            )),
            (None, None) => Err(AllowListError::Config(
                "one of organization or enterprise must be set".into(),
            )),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let config: GithubConfig =
            serde_json::from_value(serde_json::json!({ "organization": "acme" })).expect("config");

        assert_eq!(config.base_url, "https://api.github.com/graphql");
        assert_eq!(config.concurrency, 1);
        assert!(config.cache_entries);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("ipallow/"));
    }

    #[test]
    fn token_is_never_serialized() {
        let config = GithubConfig::for_organization("acme").with_token("ghp_secret");
        let text = serde_json::to_string(&config).expect("serialize");
        assert!(!text.contains("ghp_secret"));
    }

    #[test]
    fn exactly_one_owner_is_required() {
        let (kind, name) = GithubConfig::for_enterprise("acme-corp")
            .owner()
            .map(|(kind, name)| (kind, name.to_string()))
            .expect("owner");
        assert_eq!(kind, OwnerKind::Enterprise);
        assert_eq!(name, "acme-corp");

        let mut both = GithubConfig::for_organization("acme");
        both.enterprise = Some("acme-corp".into());
        assert!(matches!(both.owner(), Err(AllowListError::Config(_))));

        let neither = GithubConfig {
            organization: Some(String::new()),
            ..GithubConfig::default()
        };
        assert!(matches!(neither.owner(), Err(AllowListError::Config(_))));
    }
}
