//! GitHub IP allow-list data access.
//!
//! Typed queries and mutations for IP allow-list entries owned by an
//! organization or an enterprise, executed through [`ipallow_graphql`].

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod client;
pub mod config;
pub mod error;
pub mod operations;
pub mod owner;
pub mod types;

pub use client::{IpAllowListClient, IpAllowListClientBuilder};
pub use config::GithubConfig;
pub use error::{AllowListError, AllowListResult};
pub use owner::{ManagedOwner, OwnerKind};
pub use types::{Cidr, IpAllowListEntry, IpAllowListEntryParameters};

pub use ipallow_graphql::CancellationToken;
