//! IP allow-list domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An allowed IP address or CIDR range, e.g. `192.0.2.1` or `10.0.0.0/8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cidr(String);

impl Cidr {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cidr {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Cidr {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An IP allow-list entry as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAllowListEntry {
    /// Node id of the entry.
    pub id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub allow_list_value: Cidr,
    pub is_active: bool,
    /// Entry description; the API reports `null` for unnamed entries.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

/// Desired attributes of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAllowListEntryParameters {
    pub name: String,
    pub value: Cidr,
    pub is_active: bool,
}

impl IpAllowListEntryParameters {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Cidr>, is_active: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_active,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whole-second UTC timestamps, e.g. `2024-03-01T12:00:00Z`.
mod timestamp {
    use chrono::{DateTime, DurationRound, TimeDelta, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let parsed = DateTime::parse_from_rfc3339(&raw).map_err(serde::de::Error::custom)?;
        parsed
            .with_timezone(&Utc)
            .duration_trunc(TimeDelta::seconds(1))
            .map_err(serde::de::Error::custom)
    }
}
