//! chaincfg resolves the deployment configuration of an EVM contract project and
//! refuses to hand out a live-network profile when its secrets are missing.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use chaincfg_context::{
    AccountSource, DeploymentContext, EndpointSource, NamedAccounts, Network, NetworkProfile,
    Settings, WatcherConfig, roles,
};
use clap::{CommandFactory, Parser};
use comfy_table::{Table, presets::UTF8_FULL};
use strum::IntoEnumIterator;
use url::Url;

use cli::{AccountsArgs, Cli, Command, OutputFormat, ResolveArgs};

const REDACTED: &str = "<redacted>";
const REDACTED_PATH: &str = "/redacted";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger. Output goes to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "chaincfg", &mut std::io::stdout());
            Ok(())
        }
        Command::Networks => {
            println!("{}", networks_table());
            Ok(())
        }
        Command::WatchConfig => {
            let watcher = WatcherConfig::default();
            println!(
                "{}",
                toml::to_string_pretty(&watcher).context("Failed to serialize watcher config")?
            );
            Ok(())
        }
        Command::Resolve(args) => {
            let settings = load_settings(cli.env_file.as_deref())?;
            resolve(&settings, args)
        }
        Command::Accounts(args) => {
            let settings = load_settings(cli.env_file.as_deref())?;
            accounts(&settings, args)
        }
    }
}

/// Load the optional dotenv file, then resolve the process environment.
fn load_settings(env_file: Option<&Path>) -> Result<Settings> {
    match env_file {
        Some(path) => {
            dotenv::from_path(path)
                .context(format!("Failed to load env file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded env file");
        }
        None => {
            if let Ok(path) = dotenv::dotenv() {
                tracing::debug!(path = %path.display(), "Loaded env file");
            }
        }
    }

    Ok(Settings::from_process_env())
}

fn resolve(settings: &Settings, args: ResolveArgs) -> Result<()> {
    let context = DeploymentContext::assemble(settings, &roles(), &args.networks)
        .context("Failed to assemble deployment context")?;

    let fingerprint = context.fingerprint()?;
    tracing::info!(
        fingerprint = %fingerprint,
        networks = context.networks.len(),
        "Deployment context ready"
    );

    if let Some(ref out) = args.out {
        context.save_to_file(out)?;
    }

    let shown = if args.show_secrets {
        context
    } else {
        redact(context)
    };

    match args.format {
        OutputFormat::Table => println!("{}", profiles_table(&shown)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&shown).context("Failed to serialize context to JSON")?
        ),
        OutputFormat::Toml => println!("{}", shown.to_toml_string()?),
    }

    Ok(())
}

fn accounts(settings: &Settings, args: AccountsArgs) -> Result<()> {
    let roles = roles();
    let profile = NetworkProfile::build(settings, &roles, &args.network)
        .context("Failed to build network profile")?;
    let named = NamedAccounts::derive(&profile.accounts, &roles)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Role", "Index", "Path", "Address"]);
    for signer in named.iter() {
        table.add_row(vec![
            signer.role.to_string(),
            signer.derivation_index.to_string(),
            format!("{}/{}", profile.accounts.path, signer.derivation_index),
            signer.address.to_string(),
        ]);
    }

    tracing::info!(
        network = %profile.name,
        development_mnemonic = profile.accounts.source.is_fallback(),
        "Named accounts derived"
    );
    println!("{table}");

    Ok(())
}

/// Replace mnemonics, API keys and endpoint credentials before printing.
fn redact(mut context: DeploymentContext) -> DeploymentContext {
    for profile in context.networks.values_mut() {
        if let AccountSource::Mnemonic(ref mut phrase) = profile.accounts.source {
            *phrase = REDACTED.to_string();
        }
        if let Some(ref mut url) = profile.url {
            redact_url(url);
        }
        if let Some(ref mut forking) = profile.forking {
            forking.url = match Url::parse(&forking.url) {
                Ok(mut url) => {
                    redact_url(&mut url);
                    url.to_string()
                }
                Err(_) if forking.url.is_empty() => String::new(),
                Err(_) => REDACTED.to_string(),
            };
        }
    }
    if !context.gas_reporter.coinmarketcap.is_empty() {
        context.gas_reporter.coinmarketcap = REDACTED.to_string();
    }
    if !context.verification.etherscan_api_key.is_empty() {
        context.verification.etherscan_api_key = REDACTED.to_string();
    }
    context
}

/// Keep only the scheme, host and port of an endpoint.
///
/// Providers put the API key in the path (`/v3/<key>`), the query or the user info.
fn redact_url(url: &mut Url) {
    if url.path() != "/" && !url.path().is_empty() {
        url.set_path(REDACTED_PATH);
    }
    url.set_query(None);
    url.set_fragment(None);
    // Both fail only for URLs that cannot carry credentials.
    let _ = url.set_username("");
    let _ = url.set_password(None);
}

fn profiles_table(context: &DeploymentContext) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Network", "Chain ID", "Live", "Endpoint", "Accounts", "Tags", "Gas x", "Strip logs",
    ]);

    for (name, profile) in &context.networks {
        let accounts = match profile.accounts.source {
            AccountSource::Fallback => "development".to_string(),
            AccountSource::Mnemonic(_) => "mnemonic".to_string(),
        };
        let endpoint = match (&profile.url, &profile.forking) {
            (_, Some(forking)) if forking.enabled => format!("fork of {}", forking.url),
            (Some(url), _) => url.to_string(),
            (None, _) => "in-process".to_string(),
        };

        table.add_row(vec![
            name.clone(),
            profile
                .chain_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            profile.live.to_string(),
            endpoint,
            accounts,
            profile.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            profile.gas_multiplier.to_string(),
            context.strips_logs(name).to_string(),
        ]);
    }

    table
}

fn networks_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Network", "Chain ID", "Live", "Endpoint", "Tags", "Gas x"]);

    for network in Network::iter() {
        let template = network.template();
        let endpoint = match template.endpoint {
            EndpointSource::InProcess => "in-process".to_string(),
            EndpointSource::Fixed(url) => url.to_string(),
            EndpointSource::Env(key) => format!("${key}"),
        };

        table.add_row(vec![
            network.to_string(),
            template
                .chain_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            template.live.to_string(),
            endpoint,
            template.tags.join(", "),
            template.gas_multiplier.to_string(),
        ]);
    }

    table
}
