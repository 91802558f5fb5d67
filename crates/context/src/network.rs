//! Network profiles.
//!
//! Every supported network has a static [`NetworkTemplate`]. Building a
//! [`NetworkProfile`] combines that template with the resolved [`Settings`] and
//! the [`RoleTable`], and runs the validation gates a live network has to pass:
//!
//! 1. a live network must not use the well-known development mnemonic,
//! 2. forking on the in-process network needs a fork source,
//! 3. a live network needs an RPC endpoint.
//!
//! Checks only run for the networks that are actually requested, so a missing
//! endpoint for an unused network never blocks startup.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ConfigError, EnvKey, RoleTable, Settings};

/// The well-known development mnemonic.
///
/// Every account derived from it is public knowledge, so it is only ever used on
/// networks that are not live.
pub const FALLBACK_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// BIP-44 path prefix the role accounts are derived under.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0";

/// Default endpoint of a node running on the local machine.
pub const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";

/// Supported networks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Network {
    /// In-process simulation network.
    Hardhat,
    /// A node running on the local machine.
    Localhost,
    Rinkeby,
    Ropsten,
    Goerli,
    Kovan,
    Polygon,
    EthMainnet,
}

/// Where a network's RPC endpoint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    /// The network runs inside the toolchain process and has no endpoint.
    InProcess,
    /// A fixed URL.
    Fixed(&'static str),
    /// Read from an environment key.
    Env(EnvKey),
}

/// The static description of a network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkTemplate {
    pub endpoint: EndpointSource,
    pub chain_id: Option<u64>,
    pub live: bool,
    pub save_deployments: bool,
    pub tags: &'static [&'static str],
    pub gas_multiplier: f64,
    pub gas_price: Option<u64>,
    pub initial_base_fee_per_gas: Option<u64>,
    /// Whether the network can fork a remote chain.
    pub forkable: bool,
}

impl NetworkTemplate {
    /// Template of a remote network reached through the endpoint stored in `key`.
    const fn remote(key: EnvKey, chain_id: u64) -> Self {
        Self {
            endpoint: EndpointSource::Env(key),
            chain_id: Some(chain_id),
            live: true,
            save_deployments: true,
            tags: &[],
            gas_multiplier: 1.0,
            gas_price: None,
            initial_base_fee_per_gas: None,
            forkable: false,
        }
    }

    const fn tags(mut self, tags: &'static [&'static str]) -> Self {
        self.tags = tags;
        self
    }

    const fn gas_multiplier(mut self, gas_multiplier: f64) -> Self {
        self.gas_multiplier = gas_multiplier;
        self
    }
}

impl Network {
    /// The static template of this network.
    pub const fn template(&self) -> NetworkTemplate {
        match self {
            Self::Hardhat => NetworkTemplate {
                endpoint: EndpointSource::InProcess,
                chain_id: Some(31337),
                live: false,
                save_deployments: true,
                tags: &["test", "local"],
                gas_multiplier: 1.0,
                gas_price: Some(0),
                initial_base_fee_per_gas: Some(0),
                forkable: true,
            },
            Self::Localhost => NetworkTemplate {
                endpoint: EndpointSource::Fixed(LOCALHOST_RPC_URL),
                chain_id: None,
                live: false,
                save_deployments: true,
                tags: &["local"],
                gas_multiplier: 1.0,
                gas_price: None,
                initial_base_fee_per_gas: None,
                forkable: false,
            },
            Self::Rinkeby => NetworkTemplate::remote(EnvKey::RinkebyRpcUrl, 4),
            Self::Ropsten => NetworkTemplate::remote(EnvKey::RopstenRpcUrl, 3)
                .tags(&["staging"])
                .gas_multiplier(15.0),
            Self::Goerli => NetworkTemplate::remote(EnvKey::GoerliRpcUrl, 5)
                .tags(&["staging"])
                .gas_multiplier(15.0),
            Self::Kovan => NetworkTemplate::remote(EnvKey::KovanRpcUrl, 42)
                .tags(&["staging"])
                .gas_multiplier(10.0),
            Self::Polygon => NetworkTemplate::remote(EnvKey::PolygonRpcUrl, 137).gas_multiplier(2.0),
            Self::EthMainnet => {
                NetworkTemplate::remote(EnvKey::MainnetRpcUrl, 1).tags(&["production"])
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Whether this is the in-process simulation network or a local node.
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Hardhat | Self::Localhost)
    }

    /// Parse a user-supplied network name.
    pub fn parse_name(name: &str) -> Result<Self, ConfigError> {
        name.parse().map_err(|_| ConfigError::UnknownNetwork {
            name: name.to_string(),
        })
    }
}

/// Where the named accounts of a network are derived from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "phrase", rename_all = "lowercase")]
pub enum AccountSource {
    /// The well-known [`FALLBACK_MNEMONIC`].
    Fallback,
    /// A mnemonic supplied through [`EnvKey::Mnemonic`].
    Mnemonic(String),
}

impl AccountSource {
    /// Pick the account source for the resolved settings.
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.mnemonic() {
            "" => Self::Fallback,
            phrase => Self::Mnemonic(phrase.to_string()),
        }
    }

    /// The mnemonic phrase accounts are derived from.
    pub fn phrase(&self) -> &str {
        match self {
            Self::Fallback => FALLBACK_MNEMONIC,
            Self::Mnemonic(phrase) => phrase,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

// Keep supplied phrases out of logs.
impl fmt::Debug for AccountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => f.write_str("Fallback"),
            Self::Mnemonic(_) => f.write_str("Mnemonic(<redacted>)"),
        }
    }
}

/// Account configuration of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsConfig {
    pub source: AccountSource,
    /// Derivation path prefix, the account index is appended to it.
    pub path: String,
    /// Number of accounts to derive.
    pub count: u32,
}

/// Fork configuration of the in-process network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkingConfig {
    pub enabled: bool,
    pub url: String,
}

/// The resolved configuration of one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub name: Network,
    /// RPC endpoint. `None` for the in-process network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub accounts: AccountsConfig,
    pub live: bool,
    pub save_deployments: bool,
    pub tags: BTreeSet<String>,
    pub gas_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_base_fee_per_gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forking: Option<ForkingConfig>,
}

impl NetworkProfile {
    /// Build the profile of the network called `name`.
    pub fn build(settings: &Settings, roles: &RoleTable, name: &str) -> Result<Self, ConfigError> {
        Self::for_network(settings, roles, Network::parse_name(name)?)
    }

    /// Build the profile of `network`.
    pub fn for_network(
        settings: &Settings,
        roles: &RoleTable,
        network: Network,
    ) -> Result<Self, ConfigError> {
        let template = network.template();

        let source = AccountSource::from_settings(settings);
        if source.is_fallback() {
            if template.live {
                return Err(ConfigError::InsecureAccountsOnLiveNetwork {
                    network,
                    key: EnvKey::Mnemonic,
                });
            }
            tracing::debug!(network = %network, "Using the development mnemonic");
        }

        let forking = if template.forkable {
            Some(resolve_forking(settings, network)?)
        } else {
            None
        };

        let url = resolve_endpoint(settings, network, &template)?;

        let profile = Self {
            name: network,
            url,
            chain_id: template.chain_id,
            accounts: AccountsConfig {
                source,
                path: DEFAULT_DERIVATION_PATH.to_string(),
                count: roles.required_accounts(),
            },
            live: template.live,
            save_deployments: template.save_deployments,
            tags: template.tags.iter().map(|tag| tag.to_string()).collect(),
            gas_multiplier: template.gas_multiplier,
            gas_price: template.gas_price,
            initial_base_fee_per_gas: template.initial_base_fee_per_gas,
            forking,
        };

        tracing::debug!(
            network = %network,
            chain_id = ?profile.chain_id,
            live = profile.live,
            url = ?profile.url.as_ref().map(Url::as_str),
            "Network profile resolved"
        );

        Ok(profile)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

fn resolve_forking(settings: &Settings, network: Network) -> Result<ForkingConfig, ConfigError> {
    let enabled = settings.forking_flag() == "true";
    let url = settings.mainnet_rpc_url();

    if enabled && url.is_empty() {
        return Err(ConfigError::MissingForkEndpoint {
            network,
            key: EnvKey::MainnetRpcUrl,
        });
    }

    Ok(ForkingConfig {
        enabled,
        url: url.to_string(),
    })
}

fn resolve_endpoint(
    settings: &Settings,
    network: Network,
    template: &NetworkTemplate,
) -> Result<Option<Url>, ConfigError> {
    let value = match template.endpoint {
        EndpointSource::InProcess => return Ok(None),
        EndpointSource::Fixed(url) => url,
        EndpointSource::Env(key) => {
            let value = settings.get(key);
            if value.is_empty() {
                if template.live {
                    return Err(ConfigError::MissingEndpoint { network, key });
                }
                return Ok(None);
            }
            value
        }
    };

    Url::parse(value)
        .map(Some)
        .map_err(|source| ConfigError::InvalidEndpoint {
            network,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::roles;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        Settings::resolve(pairs.iter().copied())
    }

    fn live_networks() -> impl Iterator<Item = Network> {
        Network::iter().filter(|network| network.template().live)
    }

    #[test]
    fn test_hardhat_without_mnemonic_uses_fallback() {
        let profile = NetworkProfile::build(&settings(&[]), &roles(), "hardhat")
            .expect("hardhat should build without any input");

        assert_eq!(profile.accounts.source, AccountSource::Fallback);
        assert_eq!(profile.accounts.source.phrase(), FALLBACK_MNEMONIC);
        assert_eq!(profile.accounts.count, 8);
        assert_eq!(profile.chain_id, Some(31337));
        assert!(!profile.live);
        assert!(profile.url.is_none());
        assert_eq!(profile.gas_price, Some(0));
        assert_eq!(profile.initial_base_fee_per_gas, Some(0));
        assert!(profile.has_tag("test") && profile.has_tag("local"));
    }

    #[test]
    fn test_localhost_uses_fixed_endpoint() {
        let profile = NetworkProfile::build(&settings(&[]), &roles(), "localhost").unwrap();

        assert_eq!(profile.url.as_ref().map(Url::as_str), Some("http://127.0.0.1:8545/"));
        assert_eq!(profile.chain_id, None);
        assert!(profile.forking.is_none());
        assert!(!profile.live);
    }

    #[test]
    fn test_live_networks_reject_fallback_mnemonic() {
        for network in live_networks() {
            let key = match network.template().endpoint {
                EndpointSource::Env(key) => key,
                other => panic!("Live network {network} has endpoint {other:?}"),
            };
            // Even with an endpoint, the account gate fires.
            let settings = settings(&[(key.as_str(), "https://rpc.example.org")]);

            let err = NetworkProfile::for_network(&settings, &roles(), network).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InsecureAccountsOnLiveNetwork {
                    network,
                    key: EnvKey::Mnemonic
                }
            );
        }
    }

    #[test]
    fn test_live_networks_require_endpoint() {
        for network in live_networks() {
            let err = NetworkProfile::for_network(&settings(&[("MNEMONIC", PHRASE)]), &roles(), network)
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::MissingEndpoint { network: n, .. } if n == network),
                "Unexpected error for {network}: {err}"
            );
        }
    }

    #[test]
    fn test_goerli_profile() {
        let settings = settings(&[
            ("MNEMONIC", PHRASE),
            ("GOERLI_RPC_URL", "https://goerli.example.org/v3/key"),
        ]);
        let profile = NetworkProfile::build(&settings, &roles(), "goerli").unwrap();

        assert_eq!(profile.chain_id, Some(5));
        assert!(profile.live);
        assert!(profile.save_deployments);
        assert_eq!(profile.gas_multiplier, 15.0);
        assert!(profile.has_tag("staging"));
        assert_eq!(profile.accounts.source, AccountSource::Mnemonic(PHRASE.to_string()));
        assert_eq!(
            profile.url.map(String::from).as_deref(),
            Some("https://goerli.example.org/v3/key")
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let settings = settings(&[("MNEMONIC", PHRASE), ("KOVAN_RPC_URL", "kovan node")]);
        let err = NetworkProfile::build(&settings, &roles(), "kovan").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { network: Network::Kovan, .. }));
    }

    #[test]
    fn test_unknown_network() {
        let err = NetworkProfile::build(&settings(&[]), &roles(), "sepolia").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownNetwork {
                name: "sepolia".to_string()
            }
        );
        // Names are case sensitive.
        assert!(NetworkProfile::build(&settings(&[]), &roles(), "EthMainnet").is_err());
    }

    #[test]
    fn test_forking_flag_is_exactly_true() {
        let url = "https://mainnet.example.org";
        for (flag, expected) in [("true", true), ("TRUE", false), ("1", false), ("", false)] {
            let settings = settings(&[("FORKING", flag), ("MAINNET_RPC_URL", url)]);
            let profile = NetworkProfile::build(&settings, &roles(), "hardhat").unwrap();
            let forking = profile.forking.expect("hardhat always carries a fork config");
            assert_eq!(forking.enabled, expected, "FORKING={flag:?}");
            assert_eq!(forking.url, url);
        }
    }

    #[test]
    fn test_forking_without_endpoint() {
        let err = NetworkProfile::build(&settings(&[("FORKING", "true")]), &roles(), "hardhat")
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingForkEndpoint {
                network: Network::Hardhat,
                key: EnvKey::MainnetRpcUrl
            }
        );
    }

    #[test]
    fn test_disabled_forking_tolerates_missing_endpoint() {
        let profile = NetworkProfile::build(&settings(&[]), &roles(), "hardhat").unwrap();
        assert_eq!(
            profile.forking,
            Some(ForkingConfig {
                enabled: false,
                url: String::new()
            })
        );
    }

    #[test]
    fn test_template_invariants() {
        for network in Network::iter() {
            let template = network.template();
            assert!(template.gas_multiplier >= 1.0, "{network} gas multiplier below 1");
            if template.live {
                assert!(template.save_deployments, "{network} is live but does not save deployments");
                assert!(!network.is_local(), "{network} is live and local");
            }
            assert_eq!(template.forkable, network == Network::Hardhat);
        }
    }

    #[test]
    fn test_template_chain_ids_are_unique() {
        let ids: Vec<u64> = Network::iter()
            .filter_map(|network| network.template().chain_id)
            .collect();
        let unique: BTreeSet<u64> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn test_network_names() {
        assert_eq!(Network::EthMainnet.name(), "ethMainnet");
        assert_eq!(Network::Hardhat.to_string(), "hardhat");
        assert_eq!(Network::parse_name("polygon"), Ok(Network::Polygon));
    }

    #[test]
    fn test_supplied_mnemonic_is_redacted_in_debug() {
        let source = AccountSource::Mnemonic(PHRASE.to_string());
        assert!(!format!("{source:?}").contains("abandon"));
    }
}
