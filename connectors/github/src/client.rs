//! IP allow-list API client.

use std::sync::Arc;
use std::time::Duration;

use ipallow_graphql::{
    CancellationToken, DEFAULT_ENDPOINT, GraphqlClient, GraphqlClientBuilder, GraphqlOperation,
    OwnerCache, PaginationError, Transport,
};
use tracing::{debug, info, instrument};

use crate::config::{DEFAULT_USER_AGENT, GithubConfig};
use crate::error::{AllowListError, AllowListResult};
use crate::operations::{
    CreateIpAllowListEntry, DeleteIpAllowListEntry, GetEnterpriseId,
    GetEnterpriseIpAllowListEntries, GetOrganizationId, GetOrganizationIpAllowListEntries,
    UpdateIpAllowListEntry,
};
use crate::types::{Cidr, IpAllowListEntry, IpAllowListEntryParameters};

/// Builder for [`IpAllowListClient`].
#[derive(Debug, Clone)]
pub struct IpAllowListClientBuilder {
    graphql: GraphqlClientBuilder,
    cache_entries: bool,
}

impl Default for IpAllowListClientBuilder {
    fn default() -> Self {
        Self {
            graphql: GraphqlClientBuilder::new(DEFAULT_ENDPOINT)
                .with_user_agent(DEFAULT_USER_AGENT),
            cache_entries: true,
        }
    }
}

impl IpAllowListClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the GraphQL endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.graphql = self.graphql.with_endpoint(base_url);
        self
    }

    /// Authenticate with a personal access token.
    #[must_use]
    pub fn with_token(mut self, token: impl AsRef<str>) -> Self {
        self.graphql = self.graphql.with_bearer_token(token);
        self
    }

    /// Maximum number of concurrent requests; values below 1 are ignored.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.graphql = self.graphql.with_concurrency(concurrency);
        self
    }

    /// Extra headers sent with every request.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.graphql = self.graphql.with_headers(headers);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl AsRef<str>) -> Self {
        self.graphql = self.graphql.with_user_agent(user_agent);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.graphql = self.graphql.with_timeout(timeout);
        self
    }

    /// Send requests through a caller-provided transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.graphql = self.graphql.with_transport(transport);
        self
    }

    /// Enable or disable memoization of owner listings (enabled by default).
    #[must_use]
    pub const fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_entries = enabled;
        self
    }

    pub fn build(self) -> AllowListResult<IpAllowListClient> {
        let graphql = self
            .graphql
            .build()
            .map_err(|err| AllowListError::Config(err.to_string()))?;
        Ok(IpAllowListClient {
            graphql,
            organization_entries: Arc::new(OwnerCache::new(self.cache_entries)),
            enterprise_entries: Arc::new(OwnerCache::new(self.cache_entries)),
        })
    }
}

/// Client for IP allow-list entries of organizations and enterprises.
///
/// Clones share the throttle and the listing caches.
#[derive(Debug, Clone)]
pub struct IpAllowListClient {
    graphql: GraphqlClient,
    organization_entries: Arc<OwnerCache<IpAllowListEntry>>,
    enterprise_entries: Arc<OwnerCache<IpAllowListEntry>>,
}

impl IpAllowListClient {
    #[must_use]
    pub fn builder() -> IpAllowListClientBuilder {
        IpAllowListClientBuilder::new()
    }

    /// Build a client from configuration. The owner fields are not used here.
    pub fn from_config(config: &GithubConfig) -> AllowListResult<Self> {
        let mut builder = IpAllowListClientBuilder::new()
            .with_base_url(&config.base_url)
            .with_concurrency(config.concurrency)
            .with_timeout(config.timeout)
            .with_user_agent(&config.user_agent)
            .with_cache(config.cache_entries);
        if let Some(token) = config.token.as_deref().filter(|token| !token.is_empty()) {
            builder = builder.with_token(token);
        }
        let client = builder.build()?;
        info!(
            endpoint = client.graphql.endpoint(),
            concurrency = client.graphql.throttle().capacity(),
            cache = config.cache_entries,
            "IP allow-list client configured"
        );
        Ok(client)
    }

    /// Underlying GraphQL client.
    #[must_use]
    pub const fn graphql(&self) -> &GraphqlClient {
        &self.graphql
    }

    #[must_use]
    pub fn caching_enabled(&self) -> bool {
        self.organization_entries.is_enabled()
    }

    /// Node id of an organization.
    #[instrument(skip(self, cancel))]
    pub async fn organization_id(
        &self,
        organization: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<String> {
        let data = self
            .graphql
            .execute::<GetOrganizationId>(GetOrganizationId::variables(organization), cancel)
            .await
            .map_err(|err| AllowListError::request(GetOrganizationId::OPERATION_NAME, err))?;
        Ok(data.organization.id)
    }

    /// Node id of an enterprise.
    #[instrument(skip(self, cancel))]
    pub async fn enterprise_id(
        &self,
        enterprise: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<String> {
        let data = self
            .graphql
            .execute::<GetEnterpriseId>(GetEnterpriseId::variables(enterprise), cancel)
            .await
            .map_err(|err| AllowListError::request(GetEnterpriseId::OPERATION_NAME, err))?;
        Ok(data.enterprise.id)
    }

    /// Every entry of an organization, skipping entries managed by its
    /// enterprise. Memoized per organization when caching is enabled.
    #[instrument(skip(self, cancel))]
    pub async fn organization_entries(
        &self,
        organization: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<Vec<IpAllowListEntry>> {
        self.organization_entries
            .get_or_fetch(organization, cancel, || async move {
                let entries = self
                    .graphql
                    .paginate::<GetOrganizationIpAllowListEntries, _, _, _>(
                        GetOrganizationIpAllowListEntries::variables(organization),
                        GetOrganizationIpAllowListEntries::page_info,
                        GetOrganizationIpAllowListEntries::entries,
                        cancel,
                    )
                    .await?;
                debug!(organization, entries = entries.len(), "fetched organization entries");
                Ok::<_, PaginationError<IpAllowListEntry>>(entries)
            })
            .await
            .map_err(|err| {
                AllowListError::listing(GetOrganizationIpAllowListEntries::OPERATION_NAME, err)
            })
    }

    /// Every entry of an enterprise. Memoized per enterprise when caching is
    /// enabled.
    #[instrument(skip(self, cancel))]
    pub async fn enterprise_entries(
        &self,
        enterprise: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<Vec<IpAllowListEntry>> {
        self.enterprise_entries
            .get_or_fetch(enterprise, cancel, || async move {
                let entries = self
                    .graphql
                    .paginate::<GetEnterpriseIpAllowListEntries, _, _, _>(
                        GetEnterpriseIpAllowListEntries::variables(enterprise),
                        GetEnterpriseIpAllowListEntries::page_info,
                        GetEnterpriseIpAllowListEntries::entries,
                        cancel,
                    )
                    .await?;
                debug!(enterprise, entries = entries.len(), "fetched enterprise entries");
                Ok::<_, PaginationError<IpAllowListEntry>>(entries)
            })
            .await
            .map_err(|err| {
                AllowListError::listing(GetEnterpriseIpAllowListEntries::OPERATION_NAME, err)
            })
    }

    /// Create an entry for the owner with node id `owner_id`. An empty `name`
    /// is left to the API default.
    #[instrument(skip(self, cancel))]
    pub async fn create_entry(
        &self,
        owner_id: &str,
        name: &str,
        value: &Cidr,
        is_active: bool,
        cancel: &CancellationToken,
    ) -> AllowListResult<IpAllowListEntry> {
        let data = self
            .graphql
            .execute::<CreateIpAllowListEntry>(
                CreateIpAllowListEntry::variables(owner_id, name, value, is_active),
                cancel,
            )
            .await
            .map_err(|err| AllowListError::request(CreateIpAllowListEntry::OPERATION_NAME, err))?;
        let entry = data.create_ip_allow_list_entry.ip_allow_list_entry;
        info!(entry_id = %entry.id, value = %entry.allow_list_value, "created IP allow-list entry");
        Ok(entry)
    }

    /// Replace every attribute of an entry.
    #[instrument(skip(self, cancel))]
    pub async fn update_entry(
        &self,
        entry_id: &str,
        params: &IpAllowListEntryParameters,
        cancel: &CancellationToken,
    ) -> AllowListResult<IpAllowListEntry> {
        let data = self
            .graphql
            .execute::<UpdateIpAllowListEntry>(
                UpdateIpAllowListEntry::variables(entry_id, params),
                cancel,
            )
            .await
            .map_err(|err| AllowListError::request(UpdateIpAllowListEntry::OPERATION_NAME, err))?;
        info!(entry_id, "updated IP allow-list entry");
        Ok(data.update_ip_allow_list_entry.ip_allow_list_entry)
    }

    /// Delete an entry, returning the id of the deleted entry.
    #[instrument(skip(self, cancel))]
    pub async fn delete_entry(
        &self,
        entry_id: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<String> {
        let data = self
            .graphql
            .execute::<DeleteIpAllowListEntry>(DeleteIpAllowListEntry::variables(entry_id), cancel)
            .await
            .map_err(|err| AllowListError::request(DeleteIpAllowListEntry::OPERATION_NAME, err))?;
        info!(entry_id, "deleted IP allow-list entry");
        Ok(data.delete_ip_allow_list_entry.ip_allow_list_entry.id)
    }
}
