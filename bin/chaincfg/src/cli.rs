use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use tracing::level_filters::LevelFilter;

/// The network resolved when none is requested.
const DEFAULT_NETWORK: &str = "hardhat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    Table,
    Json,
    Toml,
}

#[derive(Parser)]
#[command(name = "chaincfg")]
#[command(
    author,
    version,
    about = "Resolve and validate deployment configuration for EVM networks"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "CHAINCFG_VERBOSITY", default_value_t = LevelFilter::INFO, global = true)]
    pub verbosity: LevelFilter,

    /// Path to a dotenv file to load before reading the environment.
    ///
    /// If not provided, a `.env` file in the current directory is loaded when present.
    #[arg(long, env = "CHAINCFG_ENV_FILE", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assemble the deployment context for the requested networks.
    Resolve(ResolveArgs),
    /// Show the named accounts of a network.
    Accounts(AccountsArgs),
    /// List the supported networks.
    Networks,
    /// Show the file watcher configuration.
    WatchConfig,
    /// Print a shell completion script.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct ResolveArgs {
    /// Networks to resolve. Can be repeated or comma separated.
    #[arg(short, long = "network", env = "CHAINCFG_NETWORKS", value_delimiter = ',', default_value = DEFAULT_NETWORK)]
    pub networks: Vec<String>,

    /// Output format.
    #[arg(short, long, env = "CHAINCFG_FORMAT", default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Also write the context as TOML to this path.
    #[arg(short, long, env = "CHAINCFG_OUT")]
    pub out: Option<PathBuf>,

    /// Print mnemonics, API keys and full endpoint URLs instead of redacting them.
    #[arg(long)]
    pub show_secrets: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct AccountsArgs {
    /// The network whose accounts are derived.
    #[arg(short, long, env = "CHAINCFG_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,
}

#[derive(Debug, Clone, Parser)]
pub struct CompletionsArgs {
    /// The shell to generate completions for.
    #[arg(ignore_case = true)]
    pub shell: Shell,
}
