//! chaincfg-context - Deployment configuration for an EVM contract toolchain.
//!
//! This crate resolves environment settings into per-network profiles, binds the
//! named account roles to derivation indices, and assembles everything into one
//! immutable [`DeploymentContext`] consumed by the compiler, deployment,
//! verification and gas-reporting tools.
//!
//! ```
//! use chaincfg_context::{DeploymentContext, Settings, roles};
//!
//! let settings = Settings::resolve([("REPORT_GAS", "false")]);
//! let context = DeploymentContext::assemble(&settings, &roles(), ["hardhat"])?;
//!
//! assert!(context.gas_reporter.enabled);
//! # Ok::<(), chaincfg_context::ConfigError>(())
//! ```

mod builder;
pub use builder::DeploymentContextBuilder;

mod context;
pub use context::{CONTEXT_FILENAME, DeploymentContext, check_unique_chain_ids};

mod env;
pub use env::{EnvKey, Settings};

mod error;
pub use error::ConfigError;

mod network;
pub use network::{
    AccountSource, AccountsConfig, DEFAULT_DERIVATION_PATH, EndpointSource, FALLBACK_MNEMONIC,
    ForkingConfig, LOCALHOST_RPC_URL, Network, NetworkProfile, NetworkTemplate,
};

mod roles;
pub use roles::{AccountRole, RoleTable, roles};

mod signers;
pub use signers::{NamedAccounts, NamedSigner};

pub mod toolchain;
pub use toolchain::{
    CompilerConfig, CompilerSettings, CompilerVersion, GasReporterConfig, LogStripPolicy,
    OptimizerSettings, TypechainConfig, VerificationConfig, VersionPragma, WatcherConfig,
};
