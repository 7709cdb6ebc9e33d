//! Allow-list owners.

use std::fmt;

use ipallow_graphql::CancellationToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::client::IpAllowListClient;
use crate::config::GithubConfig;
use crate::error::AllowListResult;
use crate::types::{IpAllowListEntry, IpAllowListEntryParameters};

/// Kind of account owning an allow list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Organization,
    Enterprise,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization => f.write_str("organization"),
            Self::Enterprise => f.write_str("enterprise"),
        }
    }
}

/// An owner whose node id has been resolved, bound to a client.
///
/// Listing and lookups go through the client's owner cache; mutations never
/// touch it.
#[derive(Debug, Clone)]
pub struct ManagedOwner {
    client: IpAllowListClient,
    kind: OwnerKind,
    name: String,
    id: String,
}

impl ManagedOwner {
    /// Resolve the node id of `name`.
    #[instrument(skip(client, cancel))]
    pub async fn resolve(
        client: IpAllowListClient,
        kind: OwnerKind,
        name: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<Self> {
        let id = match kind {
            OwnerKind::Organization => client.organization_id(name, cancel).await?,
            OwnerKind::Enterprise => client.enterprise_id(name, cancel).await?,
        };
        debug!(%kind, name, id = %id, "resolved owner");
        Ok(Self {
            client,
            kind,
            name: name.to_string(),
            id,
        })
    }

    /// Build a client from `config` and resolve its owner.
    pub async fn from_config(
        config: &GithubConfig,
        cancel: &CancellationToken,
    ) -> AllowListResult<Self> {
        let (kind, name) = config.owner()?;
        let client = IpAllowListClient::from_config(config)?;
        Self::resolve(client, kind, name, cancel).await
    }

    #[must_use]
    pub const fn kind(&self) -> OwnerKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node id of the owner.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn client(&self) -> &IpAllowListClient {
        &self.client
    }

    /// Every entry of the owner.
    pub async fn entries(&self, cancel: &CancellationToken) -> AllowListResult<Vec<IpAllowListEntry>> {
        match self.kind {
            OwnerKind::Organization => self.client.organization_entries(&self.name, cancel).await,
            OwnerKind::Enterprise => self.client.enterprise_entries(&self.name, cancel).await,
        }
    }

    /// The entry with node id `entry_id`, or `None` if the owner has none.
    pub async fn find_entry(
        &self,
        entry_id: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<Option<IpAllowListEntry>> {
        let entries = self.entries(cancel).await?;
        Ok(entries.into_iter().find(|entry| entry.id == entry_id))
    }

    pub async fn create_entry(
        &self,
        params: &IpAllowListEntryParameters,
        cancel: &CancellationToken,
    ) -> AllowListResult<IpAllowListEntry> {
        self.client
            .create_entry(&self.id, &params.name, &params.value, params.is_active, cancel)
            .await
    }

    pub async fn update_entry(
        &self,
        entry_id: &str,
        params: &IpAllowListEntryParameters,
        cancel: &CancellationToken,
    ) -> AllowListResult<IpAllowListEntry> {
        self.client.update_entry(entry_id, params, cancel).await
    }

    /// Delete an entry, returning the id of the deleted entry.
    pub async fn delete_entry(
        &self,
        entry_id: &str,
        cancel: &CancellationToken,
    ) -> AllowListResult<String> {
        self.client.delete_entry(entry_id, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_value(OwnerKind::Enterprise).expect("serialize"),
            "enterprise"
        );
        assert_eq!(OwnerKind::Organization.to_string(), "organization");
    }
}
