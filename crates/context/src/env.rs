//! Environment resolution.
//!
//! Turns a raw key/value mapping (usually the process environment) into a typed
//! [`Settings`] bag. Nothing is validated here: a missing value simply resolves to
//! its default, and the [`crate::NetworkProfile`] builder decides later whether the
//! network being built actually needs it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Recognized environment keys.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvKey {
    /// Seed phrase used to derive the named accounts.
    Mnemonic,
    /// Enables the mainnet fork on the in-process network when set to `"true"`.
    Forking,
    /// Block-explorer API key, passed through to contract verification.
    EtherscanApiKey,
    /// Gas-pricing API key, passed through to the gas reporter.
    CoinmarketcapApiKey,
    /// Gas reporting toggle.
    ReportGas,
    MainnetRpcUrl,
    RopstenRpcUrl,
    RinkebyRpcUrl,
    GoerliRpcUrl,
    KovanRpcUrl,
    PolygonRpcUrl,
}

impl EnvKey {
    /// The value used when the key is absent or empty.
    ///
    /// Every key currently defaults to the empty string. The insecure fallback
    /// phrase is deliberately not a default of [`EnvKey::Mnemonic`]: it is picked
    /// by the profile builder, which knows whether the network is live.
    pub const fn default_value(&self) -> &'static str {
        match self {
            Self::Mnemonic
            | Self::Forking
            | Self::EtherscanApiKey
            | Self::CoinmarketcapApiKey
            | Self::ReportGas
            | Self::MainnetRpcUrl
            | Self::RopstenRpcUrl
            | Self::RinkebyRpcUrl
            | Self::GoerliRpcUrl
            | Self::KovanRpcUrl
            | Self::PolygonRpcUrl => "",
        }
    }

    /// Whether the value is a secret that must not be printed.
    pub const fn is_secret(&self) -> bool {
        matches!(
            self,
            Self::Mnemonic | Self::EtherscanApiKey | Self::CoinmarketcapApiKey
        )
    }

    /// The environment variable name, e.g. `MAINNET_RPC_URL`.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Resolved settings, one string per [`EnvKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    values: HashMap<EnvKey, String>,
}

impl Settings {
    /// Resolve settings from a raw key/value mapping.
    ///
    /// Absent or empty values are replaced by [`EnvKey::default_value`].
    /// Unrecognized keys are ignored. This never fails.
    pub fn resolve<I, K, V>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values: HashMap<EnvKey, String> = EnvKey::iter()
            .map(|key| (key, key.default_value().to_string()))
            .collect();

        for (key, value) in raw {
            let Ok(key) = key.as_ref().parse::<EnvKey>() else {
                continue;
            };
            let value = value.into();
            if !value.is_empty() {
                values.insert(key, value);
            }
        }

        tracing::debug!(
            provided = values
                .iter()
                .filter(|(key, value)| value.as_str() != key.default_value())
                .count(),
            "Resolved environment settings"
        );

        Self { values }
    }

    /// Resolve settings from the current process environment.
    pub fn from_process_env() -> Self {
        Self::resolve(std::env::vars())
    }

    /// The resolved value of `key` (possibly empty).
    pub fn get(&self, key: EnvKey) -> &str {
        self.values
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_value())
    }

    /// Whether `key` resolved to a non-empty value.
    pub fn is_set(&self, key: EnvKey) -> bool {
        !self.get(key).is_empty()
    }

    pub fn mnemonic(&self) -> &str {
        self.get(EnvKey::Mnemonic)
    }

    pub fn forking_flag(&self) -> &str {
        self.get(EnvKey::Forking)
    }

    pub fn etherscan_api_key(&self) -> &str {
        self.get(EnvKey::EtherscanApiKey)
    }

    pub fn coinmarketcap_api_key(&self) -> &str {
        self.get(EnvKey::CoinmarketcapApiKey)
    }

    pub fn report_gas_flag(&self) -> &str {
        self.get(EnvKey::ReportGas)
    }

    pub fn mainnet_rpc_url(&self) -> &str {
        self.get(EnvKey::MainnetRpcUrl)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(std::iter::empty::<(&str, &str)>())
    }
}
