//! Configuration errors.

use derive_more::{Display, Error};

use crate::{EnvKey, Network};

/// A terminal configuration error.
///
/// Every variant names the network being built and, where relevant, the
/// environment key that has to be fixed.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ConfigError {
    /// The requested network has no template.
    #[display("Unknown network `{name}`")]
    UnknownNetwork { name: String },

    /// A live network was requested but its endpoint is not set.
    #[display("Network `{network}` requires an RPC endpoint: set {key}")]
    MissingEndpoint { network: Network, key: EnvKey },

    /// The endpoint of a live network is not a valid URL.
    #[display("Network `{network}` has an invalid RPC endpoint `{value}`: {source}")]
    InvalidEndpoint {
        network: Network,
        value: String,
        source: url::ParseError,
    },

    /// Forking is enabled but the fork source endpoint is not set.
    #[display("Network `{network}` has forking enabled but {key} is not set")]
    MissingForkEndpoint { network: Network, key: EnvKey },

    /// A live network would have used the well-known development mnemonic.
    #[display(
        "Refusing to use the well-known development mnemonic on live network `{network}`: set {key}"
    )]
    InsecureAccountsOnLiveNetwork { network: Network, key: EnvKey },

    /// A role table reorders, repeats or skips roles.
    #[display("Role table [{roles}] is not a prefix of the standard role order")]
    InvalidRoleTable { roles: String },

    /// Two requested networks share a chain ID.
    #[display("Networks `{first}` and `{second}` share chain ID {chain_id}")]
    DuplicateChainId {
        chain_id: u64,
        first: Network,
        second: Network,
    },
}

impl ConfigError {
    /// The network the error is about, if it was recognized.
    pub fn network(&self) -> Option<Network> {
        match self {
            Self::UnknownNetwork { .. } | Self::InvalidRoleTable { .. } => None,
            Self::MissingEndpoint { network, .. }
            | Self::InvalidEndpoint { network, .. }
            | Self::MissingForkEndpoint { network, .. }
            | Self::InsecureAccountsOnLiveNetwork { network, .. }
            | Self::DuplicateChainId {
                second: network, ..
            } => Some(*network),
        }
    }
}
