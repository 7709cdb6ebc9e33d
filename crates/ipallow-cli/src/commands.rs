//! Subcommand implementations.
//!
//! Every command resolves the configured owner first and prints its result
//! as JSON on stdout.

use anyhow::{Context, Result, bail};
use clap::Args;
use ipallow_github::{GithubConfig, IpAllowListEntryParameters, ManagedOwner};
use ipallow_graphql::CancellationToken;
use serde::Serialize;

/// Arguments for `ipallow get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Entry node id.
    pub id: String,
}

/// Arguments for `ipallow create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// IP address or CIDR range.
    pub value: String,

    /// Entry description; left to the API default when empty.
    #[arg(long, default_value = "")]
    pub name: String,

    /// Create the entry disabled.
    #[arg(long, default_value_t = false)]
    pub inactive: bool,
}

/// Arguments for `ipallow update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Entry node id.
    pub id: String,

    /// IP address or CIDR range.
    pub value: String,

    /// Entry description.
    #[arg(long, default_value = "")]
    pub name: String,

    /// Disable the entry.
    #[arg(long, default_value_t = false)]
    pub inactive: bool,
}

/// Arguments for `ipallow delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Entry node id.
    pub id: String,
}

#[derive(Serialize)]
struct OwnerReport<'a> {
    kind: String,
    name: &'a str,
    id: &'a str,
}

#[derive(Serialize)]
struct DeleteReport {
    deleted: String,
}

async fn resolve(config: &GithubConfig, cancel: &CancellationToken) -> Result<ManagedOwner> {
    ManagedOwner::from_config(config, cancel)
        .await
        .context("failed to resolve allow-list owner")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn owner(config: &GithubConfig, cancel: &CancellationToken) -> Result<()> {
    let owner = resolve(config, cancel).await?;
    print_json(&OwnerReport {
        kind: owner.kind().to_string(),
        name: owner.name(),
        id: owner.id(),
    })
}

pub async fn list(config: &GithubConfig, cancel: &CancellationToken) -> Result<()> {
    let owner = resolve(config, cancel).await?;
    let entries = owner
        .entries(cancel)
        .await
        .context("failed to list entries")?;
    print_json(&entries)
}

pub async fn get(config: &GithubConfig, args: &GetArgs, cancel: &CancellationToken) -> Result<()> {
    let owner = resolve(config, cancel).await?;
    let Some(entry) = owner
        .find_entry(&args.id, cancel)
        .await
        .context("failed to list entries")?
    else {
        bail!("entry {} not found for {} {}", args.id, owner.kind(), owner.name());
    };
    print_json(&entry)
}

pub async fn create(
    config: &GithubConfig,
    args: &CreateArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let owner = resolve(config, cancel).await?;
    let params = IpAllowListEntryParameters::new(args.name.as_str(), args.value.as_str(), !args.inactive);
    let entry = owner
        .create_entry(&params, cancel)
        .await
        .context("failed to create entry")?;
    print_json(&entry)
}

pub async fn update(
    config: &GithubConfig,
    args: &UpdateArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let owner = resolve(config, cancel).await?;
    let params = IpAllowListEntryParameters::new(args.name.as_str(), args.value.as_str(), !args.inactive);
    let entry = owner
        .update_entry(&args.id, &params, cancel)
        .await
        .with_context(|| format!("failed to update entry {}", args.id))?;
    print_json(&entry)
}

pub async fn delete(
    config: &GithubConfig,
    args: &DeleteArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let owner = resolve(config, cancel).await?;
    let deleted = owner
        .delete_entry(&args.id, cancel)
        .await
        .with_context(|| format!("failed to delete entry {}", args.id))?;
    print_json(&DeleteReport { deleted })
}
