//! GraphQL queries and mutations for IP allow-list entries.

use ipallow_graphql::{GraphqlOperation, PageInfo, Variables};
use serde::Deserialize;
use serde_json::Value;

use crate::types::{Cidr, IpAllowListEntry, IpAllowListEntryParameters};

/// `{ id }` selection.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeId {
    pub id: String,
}

/// One page of an owner's entries.
///
/// Organization listings report `null` for entries managed by the enterprise.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryConnection {
    #[serde(default)]
    pub nodes: Vec<Option<IpAllowListEntry>>,
    pub page_info: PageInfo,
}

impl EntryConnection {
    /// Entries of this page with `null` nodes skipped.
    pub fn into_entries(self) -> Vec<IpAllowListEntry> {
        self.nodes.into_iter().flatten().collect()
    }
}

/// Organization node id by login.
pub struct GetOrganizationId;

#[derive(Debug, Deserialize)]
pub struct GetOrganizationIdData {
    pub organization: NodeId,
}

impl GraphqlOperation for GetOrganizationId {
    type ResponseData = GetOrganizationIdData;

    const QUERY: &'static str = r"
query GetOrganizationId($organizationName: String!) {
  organization(login: $organizationName) {
    id
  }
}";
    const OPERATION_NAME: &'static str = "GetOrganizationId";
}

impl GetOrganizationId {
    pub fn variables(organization: &str) -> Variables {
        vars([("organizationName", Value::from(organization))])
    }
}

/// Enterprise node id by slug.
pub struct GetEnterpriseId;

#[derive(Debug, Deserialize)]
pub struct GetEnterpriseIdData {
    pub enterprise: NodeId,
}

impl GraphqlOperation for GetEnterpriseId {
    type ResponseData = GetEnterpriseIdData;

    const QUERY: &'static str = r"
query GetEnterpriseId($enterpriseName: String!) {
  enterprise(slug: $enterpriseName) {
    id
  }
}";
    const OPERATION_NAME: &'static str = "GetEnterpriseId";
}

impl GetEnterpriseId {
    pub fn variables(enterprise: &str) -> Variables {
        vars([("enterpriseName", Value::from(enterprise))])
    }
}

/// One page of an organization's entries.
pub struct GetOrganizationIpAllowListEntries;

#[derive(Debug, Deserialize)]
pub struct GetOrganizationIpAllowListEntriesData {
    pub organization: OrganizationEntries,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationEntries {
    pub ip_allow_list_entries: EntryConnection,
}

impl GraphqlOperation for GetOrganizationIpAllowListEntries {
    type ResponseData = GetOrganizationIpAllowListEntriesData;

    const QUERY: &'static str = r"
query GetOrganizationIpAllowListEntries($org: String!, $after: String) {
  organization(login: $org) {
    ipAllowListEntries(first: 100, after: $after) {
      nodes {
        allowListValue
        isActive
        name
        id
        createdAt
        updatedAt
      }
      pageInfo {
        hasNextPage
        startCursor
        endCursor
      }
    }
  }
}";
    const OPERATION_NAME: &'static str = "GetOrganizationIpAllowListEntries";
}

impl GetOrganizationIpAllowListEntries {
    pub fn variables(organization: &str) -> Variables {
        vars([("org", Value::from(organization))])
    }

    pub fn page_info(data: &GetOrganizationIpAllowListEntriesData) -> PageInfo {
        data.organization.ip_allow_list_entries.page_info.clone()
    }

    pub fn entries(data: GetOrganizationIpAllowListEntriesData) -> Vec<IpAllowListEntry> {
        data.organization.ip_allow_list_entries.into_entries()
    }
}

/// One page of an enterprise's entries.
pub struct GetEnterpriseIpAllowListEntries;

#[derive(Debug, Deserialize)]
pub struct GetEnterpriseIpAllowListEntriesData {
    pub enterprise: EnterpriseEntries,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseEntries {
    pub owner_info: OrganizationEntries,
}

impl GraphqlOperation for GetEnterpriseIpAllowListEntries {
    type ResponseData = GetEnterpriseIpAllowListEntriesData;

    const QUERY: &'static str = r"
query GetEnterpriseIpAllowListEntries($enterpriseName: String!, $after: String) {
  enterprise(slug: $enterpriseName) {
    ownerInfo {
      ipAllowListEntries(first: 100, after: $after) {
        nodes {
          id
          allowListValue
          name
          isActive
          createdAt
          updatedAt
        }
        pageInfo {
          endCursor
          hasNextPage
          startCursor
        }
      }
    }
  }
}";
    const OPERATION_NAME: &'static str = "GetEnterpriseIpAllowListEntries";
}

impl GetEnterpriseIpAllowListEntries {
    pub fn variables(enterprise: &str) -> Variables {
        vars([("enterpriseName", Value::from(enterprise))])
    }

    pub fn page_info(data: &GetEnterpriseIpAllowListEntriesData) -> PageInfo {
        data.enterprise
            .owner_info
            .ip_allow_list_entries
            .page_info
            .clone()
    }

    pub fn entries(data: GetEnterpriseIpAllowListEntriesData) -> Vec<IpAllowListEntry> {
        data.enterprise.owner_info.ip_allow_list_entries.into_entries()
    }
}

/// `{ ipAllowListEntry { ... } }` mutation payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload<T> {
    pub ip_allow_list_entry: T,
}

/// Create an entry for an owner.
pub struct CreateIpAllowListEntry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIpAllowListEntryData {
    pub create_ip_allow_list_entry: EntryPayload<IpAllowListEntry>,
}

impl GraphqlOperation for CreateIpAllowListEntry {
    type ResponseData = CreateIpAllowListEntryData;

    const QUERY: &'static str = r#"
mutation CreateIpAllowListEntry($ownerId: ID!, $name: String = "", $value: String!, $isActive: Boolean!) {
  createIpAllowListEntry(
    input: {ownerId: $ownerId, allowListValue: $value, isActive: $isActive, name: $name}
  ) {
    ipAllowListEntry {
      id
      createdAt
      updatedAt
      allowListValue
      isActive
      name
    }
  }
}"#;
    const OPERATION_NAME: &'static str = "CreateIpAllowListEntry";
}

impl CreateIpAllowListEntry {
    /// `name` is only bound when non-empty so the query default applies.
    pub fn variables(owner_id: &str, name: &str, value: &Cidr, is_active: bool) -> Variables {
        let mut variables = vars([
            ("ownerId", Value::from(owner_id)),
            ("value", Value::from(value.as_str())),
            ("isActive", Value::from(is_active)),
        ]);
        if !name.is_empty() {
            variables.insert("name".to_string(), Value::from(name));
        }
        variables
    }
}

/// Replace every attribute of an entry.
pub struct UpdateIpAllowListEntry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIpAllowListEntryData {
    pub update_ip_allow_list_entry: EntryPayload<IpAllowListEntry>,
}

impl GraphqlOperation for UpdateIpAllowListEntry {
    type ResponseData = UpdateIpAllowListEntryData;

    const QUERY: &'static str = r"
mutation UpdateIpAllowListEntry($entryId: ID!, $name: String!, $value: String!, $isActive: Boolean!) {
  updateIpAllowListEntry(
    input: {ipAllowListEntryId: $entryId, allowListValue: $value, isActive: $isActive, name: $name}
  ) {
    ipAllowListEntry {
      allowListValue
      createdAt
      id
      isActive
      name
      updatedAt
    }
  }
}";
    const OPERATION_NAME: &'static str = "UpdateIpAllowListEntry";
}

impl UpdateIpAllowListEntry {
    pub fn variables(entry_id: &str, params: &IpAllowListEntryParameters) -> Variables {
        vars([
            ("entryId", Value::from(entry_id)),
            ("name", Value::from(params.name.as_str())),
            ("value", Value::from(params.value.as_str())),
            ("isActive", Value::from(params.is_active)),
        ])
    }
}

/// Delete an entry by id.
pub struct DeleteIpAllowListEntry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIpAllowListEntryData {
    pub delete_ip_allow_list_entry: EntryPayload<NodeId>,
}

impl GraphqlOperation for DeleteIpAllowListEntry {
    type ResponseData = DeleteIpAllowListEntryData;

    const QUERY: &'static str = r"
mutation DeleteIpAllowListEntry($entryId: ID!) {
  deleteIpAllowListEntry(input: {ipAllowListEntryId: $entryId}) {
    ipAllowListEntry {
      id
    }
  }
}";
    const OPERATION_NAME: &'static str = "DeleteIpAllowListEntry";
}

impl DeleteIpAllowListEntry {
    pub fn variables(entry_id: &str) -> Variables {
        vars([("entryId", Value::from(entry_id))])
    }
}

fn vars<const N: usize>(pairs: [(&str, Value); N]) -> Variables {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
