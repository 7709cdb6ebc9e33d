//! ipallow CLI entrypoint.
//!
//! Manage the IP allow list of a GitHub organization or enterprise:
//! - `ipallow owner` - Resolve the managed owner
//! - `ipallow list` / `ipallow get` - Read entries
//! - `ipallow create` / `ipallow update` / `ipallow delete` - Change entries

#![forbid(unsafe_code)]

mod commands;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ipallow_github::GithubConfig;
use ipallow_graphql::{CancellationToken, DEFAULT_ENDPOINT};
use tracing::warn;

/// GitHub IP allow-list CLI.
#[derive(Parser)]
#[command(name = "ipallow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How to reach the API and which owner to manage.
#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Personal access token (classic).
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Organization whose allow list is managed.
    #[arg(long, env = "GITHUB_ORGANIZATION", global = true)]
    organization: Option<String>,

    /// Enterprise whose allow list is managed.
    #[arg(long, env = "GITHUB_ENTERPRISE", global = true)]
    enterprise: Option<String>,

    /// GraphQL API URL.
    #[arg(long, env = "GITHUB_BASE_URL", default_value = DEFAULT_ENDPOINT, global = true)]
    base_url: String,

    /// Maximum number of concurrent requests.
    #[arg(long, default_value_t = 1, global = true)]
    concurrency: usize,

    /// Fetch listings on every lookup instead of once per owner.
    #[arg(long, default_value_t = false, global = true)]
    no_cache: bool,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30, global = true)]
    timeout: u64,
}

impl ConnectionArgs {
    fn to_config(&self) -> GithubConfig {
        GithubConfig {
            token: self.token.clone(),
            organization: self.organization.clone(),
            enterprise: self.enterprise.clone(),
            base_url: self.base_url.clone(),
            concurrency: self.concurrency,
            cache_entries: !self.no_cache,
            timeout: Duration::from_secs(self.timeout),
            ..GithubConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the managed owner and print its node id.
    Owner,

    /// List every entry of the owner.
    List,

    /// Show one entry by id.
    Get(commands::GetArgs),

    /// Create an entry.
    Create(commands::CreateArgs),

    /// Replace every attribute of an entry.
    Update(commands::UpdateArgs),

    /// Delete an entry.
    Delete(commands::DeleteArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout is clean for JSON output.
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling pending requests");
                cancel.cancel();
            }
        });
    }

    let config = cli.connection.to_config();
    match cli.command {
        Commands::Owner => commands::owner(&config, &cancel).await,
        Commands::List => commands::list(&config, &cancel).await,
        Commands::Get(args) => commands::get(&config, &args, &cancel).await,
        Commands::Create(args) => commands::create(&config, &args, &cancel).await,
        Commands::Update(args) => commands::update(&config, &args, &cancel).await,
        Commands::Delete(args) => commands::delete(&config, &args, &cancel).await,
    }
}
