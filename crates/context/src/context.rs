//! Deployment context assembly.
//!
//! The [`DeploymentContext`] is the single value handed to the toolchain: one
//! validated profile per requested network plus the compiler, gas reporter,
//! verification and preprocessing settings. It is built in one pass from the
//! resolved settings and either returned whole or not at all.
//!
//! The context can be saved to and loaded from a TOML file, and is identified by
//! a fingerprint of its serialized form.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    CompilerConfig, ConfigError, GasReporterConfig, LogStripPolicy, Network, NetworkProfile,
    RoleTable, Settings, TypechainConfig, VerificationConfig,
};

/// The default name of an exported context file.
pub const CONTEXT_FILENAME: &str = "deployment-context.toml";

/// The fully assembled deployment configuration.
///
/// Assembled once from the resolved settings, the role table and the requested
/// networks, and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentContext {
    /// Network used when the caller does not select one.
    pub default_network: Network,
    /// Profiles of the requested networks, keyed by network name.
    pub networks: BTreeMap<String, NetworkProfile>,
    /// Named account roles, in derivation order.
    pub named_accounts: RoleTable,
    pub solidity: CompilerConfig,
    pub gas_reporter: GasReporterConfig,
    pub verification: VerificationConfig,
    pub log_stripping: LogStripPolicy,
    pub typechain: TypechainConfig,
}

impl DeploymentContext {
    /// Assemble the context for the networks called `names`.
    ///
    /// Fails on the first network that does not build; no partial context is
    /// ever returned.
    pub fn assemble<I, S>(settings: &Settings, roles: &RoleTable, names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let networks = names
            .into_iter()
            .map(|name| Network::parse_name(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Self::assemble_networks(settings, roles, &networks)
    }

    /// Assemble the context for `networks`.
    pub fn assemble_networks(
        settings: &Settings,
        roles: &RoleTable,
        networks: &[Network],
    ) -> Result<Self, ConfigError> {
        let mut profiles = BTreeMap::new();

        for &network in networks {
            if profiles.contains_key(network.name()) {
                continue;
            }

            let profile = NetworkProfile::for_network(settings, roles, network)?;
            profiles.insert(network.name().to_string(), profile);
        }

        check_unique_chain_ids(&profiles)?;

        let context = Self {
            default_network: Network::Hardhat,
            networks: profiles,
            named_accounts: roles.clone(),
            solidity: CompilerConfig::default(),
            gas_reporter: GasReporterConfig::from_settings(settings),
            verification: VerificationConfig::from_settings(settings),
            log_stripping: LogStripPolicy::default(),
            typechain: TypechainConfig::default(),
        };

        tracing::info!(
            networks = ?context.networks.keys().collect::<Vec<_>>(),
            gas_report = context.gas_reporter.enabled,
            "Deployment context assembled"
        );

        Ok(context)
    }

    /// The profile of `network`, if it was requested.
    pub fn profile(&self, network: Network) -> Option<&NetworkProfile> {
        self.networks.get(network.name())
    }

    /// Whether log statements are stripped when compiling for `network`.
    pub fn strips_logs(&self, network: &str) -> bool {
        self.log_stripping.strips_logs(network)
    }

    /// A SHA-256 fingerprint of the context.
    ///
    /// Equal contexts always have equal fingerprints.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_string(self).context("Failed to serialize deployment context")?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());

        Ok(hex::encode(hasher.finalize()))
    }

    /// Render the context as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize deployment context to TOML")
    }

    /// Save the context to a TOML file for the toolchain collaborators.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)
            .context(format!("Failed to write deployment context to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Deployment context saved");
        Ok(())
    }

    /// Load a context previously written by [`DeploymentContext::save_to_file`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Deployment context file not found: {}", path.display());
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read deployment context from {}", path.display()))?;
        let context: Self =
            toml::from_str(&content).context("Failed to parse deployment context as TOML")?;
        check_unique_chain_ids(&context.networks)
            .context(format!("Invalid deployment context in {}", path.display()))?;

        Ok(context)
    }
}

/// Fail if two profiles share a chain ID.
///
/// Profiles without a chain ID are never in conflict.
pub fn check_unique_chain_ids(profiles: &BTreeMap<String, NetworkProfile>) -> Result<(), ConfigError> {
    let mut chain_ids: HashMap<u64, Network> = HashMap::new();

    for profile in profiles.values() {
        let Some(chain_id) = profile.chain_id else {
            continue;
        };
        if let Some(&first) = chain_ids.get(&chain_id) {
            return Err(ConfigError::DuplicateChainId {
                chain_id,
                first,
                second: profile.name,
            });
        }
        chain_ids.insert(chain_id, profile.name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountSource, roles};
    use tempdir::TempDir;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn full_settings() -> Settings {
        Settings::resolve([
            ("MNEMONIC", PHRASE),
            ("GOERLI_RPC_URL", "https://goerli.example.org"),
            ("POLYGON_RPC_URL", "https://polygon.example.org"),
            ("ETHERSCAN_API_KEY", "etherscan-key"),
        ])
    }

    #[test]
    fn test_assemble_local_networks_without_inputs() {
        let context =
            DeploymentContext::assemble(&Settings::default(), &roles(), ["hardhat", "localhost"])
                .expect("local networks need no input");

        assert_eq!(context.networks.len(), 2);
        assert_eq!(context.default_network, Network::Hardhat);
        assert_eq!(
            context.profile(Network::Hardhat).map(|p| &p.accounts.source),
            Some(&AccountSource::Fallback)
        );
        assert!(!context.gas_reporter.enabled);
    }

    #[test]
    fn test_unknown_network_returns_nothing() {
        let result = DeploymentContext::assemble(&full_settings(), &roles(), ["goerli", "mars"]);
        assert_eq!(
            result,
            Err(ConfigError::UnknownNetwork {
                name: "mars".to_string()
            })
        );
    }

    #[test]
    fn test_first_failure_short_circuits() {
        let result =
            DeploymentContext::assemble(&full_settings(), &roles(), ["goerli", "kovan", "ropsten"]);
        assert_eq!(
            result,
            Err(ConfigError::MissingEndpoint {
                network: Network::Kovan,
                key: crate::EnvKey::KovanRpcUrl
            })
        );
    }

    #[test]
    fn test_unrequested_networks_are_not_validated() {
        // Mainnet has no endpoint, but it is never requested.
        let context = DeploymentContext::assemble(&full_settings(), &roles(), ["goerli", "polygon"])
            .expect("only requested networks are checked");
        assert!(context.profile(Network::EthMainnet).is_none());
        assert_eq!(context.verification.etherscan_api_key, "etherscan-key");
    }

    #[test]
    fn test_duplicate_requests_are_collapsed() {
        let context =
            DeploymentContext::assemble(&Settings::default(), &roles(), ["hardhat", "hardhat"])
                .unwrap();
        assert_eq!(context.networks.len(), 1);
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let settings = full_settings();
        let first = DeploymentContext::assemble(&settings, &roles(), ["hardhat", "goerli"]).unwrap();
        let second = DeploymentContext::assemble(&settings, &roles(), ["goerli", "hardhat"]).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
        assert_eq!(first.fingerprint().unwrap().len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_inputs() {
        let first = DeploymentContext::assemble(&full_settings(), &roles(), ["goerli"]).unwrap();
        let second = DeploymentContext::assemble(&full_settings(), &roles(), ["polygon"]).unwrap();
        assert_ne!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    }

    #[test]
    fn test_gas_report_follows_inverted_flag() {
        let settings = Settings::resolve([("REPORT_GAS", "false")]);
        let context = DeploymentContext::assemble(&settings, &roles(), ["hardhat"]).unwrap();
        assert!(context.gas_reporter.enabled);

        let settings = Settings::resolve([("REPORT_GAS", "true")]);
        let context = DeploymentContext::assemble(&settings, &roles(), ["hardhat"]).unwrap();
        assert!(!context.gas_reporter.enabled);
    }

    #[test]
    fn test_log_stripping() {
        let context = DeploymentContext::assemble(&full_settings(), &roles(), ["goerli"]).unwrap();
        assert!(context.strips_logs("goerli"));
        assert!(!context.strips_logs("hardhat"));
        assert!(!context.strips_logs("localhost"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new("chaincfg-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONTEXT_FILENAME);

        let context =
            DeploymentContext::assemble(&full_settings(), &roles(), ["hardhat", "localhost", "goerli"])
                .unwrap();
        context.save_to_file(&path).expect("Failed to save context");

        let loaded = DeploymentContext::load_from_file(&path).expect("Failed to load context");
        assert_eq!(context, loaded);
    }

    fn profiles(entries: &[(Network, Option<u64>)]) -> BTreeMap<String, NetworkProfile> {
        entries
            .iter()
            .map(|&(network, chain_id)| {
                let mut profile =
                    NetworkProfile::for_network(&full_settings(), &roles(), network).unwrap();
                profile.chain_id = chain_id;
                (network.name().to_string(), profile)
            })
            .collect()
    }

    #[test]
    fn test_shared_chain_id_is_rejected() {
        let shared = profiles(&[(Network::Goerli, Some(5)), (Network::Polygon, Some(5))]);
        let err = check_unique_chain_ids(&shared).unwrap_err();

        assert_eq!(
            err,
            ConfigError::DuplicateChainId {
                chain_id: 5,
                first: Network::Goerli,
                second: Network::Polygon,
            }
        );
        assert_eq!(err.network(), Some(Network::Polygon));
        assert_eq!(err.to_string(), "Networks `goerli` and `polygon` share chain ID 5");
    }

    #[test]
    fn test_missing_chain_ids_never_conflict() {
        let distinct = profiles(&[
            (Network::Hardhat, Some(31337)),
            (Network::Localhost, None),
            (Network::Goerli, None),
            (Network::Polygon, Some(137)),
        ]);
        assert_eq!(check_unique_chain_ids(&distinct), Ok(()));
    }

    #[test]
    fn test_load_rejects_shared_chain_id() {
        let temp_dir = TempDir::new("chaincfg-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONTEXT_FILENAME);

        let mut context =
            DeploymentContext::assemble(&full_settings(), &roles(), ["goerli", "polygon"]).unwrap();
        if let Some(polygon) = context.networks.get_mut("polygon") {
            polygon.chain_id = Some(5);
        }
        context.save_to_file(&path).unwrap();

        let err = DeploymentContext::load_from_file(&path).unwrap_err();
        assert!(
            err.chain()
                .any(|cause| cause.to_string().contains("share chain ID 5")),
            "{err:#}"
        );
    }

    #[test]
    fn test_load_rejects_reordered_roles() {
        let temp_dir = TempDir::new("chaincfg-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONTEXT_FILENAME);

        let context = DeploymentContext::assemble(&full_settings(), &roles(), ["hardhat"]).unwrap();
        let mut value: toml::Value = toml::from_str(&context.to_toml_string().unwrap()).unwrap();
        if let Some(table) = value.as_table_mut() {
            table.insert(
                "named_accounts".to_string(),
                toml::Value::Array(vec!["admin".into(), "deployer".into()]),
            );
        }
        std::fs::write(&path, toml::to_string(&value).unwrap()).unwrap();

        let err = DeploymentContext::load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("not a prefix"), "{err:#}");
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new("chaincfg-test").expect("Failed to create temp dir");
        let result = DeploymentContext::load_from_file(&temp_dir.path().join("missing.toml"));
        assert!(result.is_err());
    }
}
