//! Builder module for creating a [`DeploymentContext`].
//!
//! [`DeploymentContextBuilder`] collects the requested networks and optional
//! overrides, then hands everything to [`DeploymentContext::assemble`].

use crate::{ConfigError, DeploymentContext, Network, RoleTable, Settings};

/// Builder for a [`DeploymentContext`].
///
/// # Example
///
/// ```
/// use chaincfg_context::{DeploymentContextBuilder, Network, Settings};
///
/// let settings = Settings::resolve([("FORKING", "")]);
/// let context = DeploymentContextBuilder::new(settings)
///     .network(Network::Hardhat)
///     .network_name("localhost")
///     .build()?;
///
/// assert_eq!(context.networks.len(), 2);
/// # Ok::<(), chaincfg_context::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DeploymentContextBuilder {
    /// Resolved environment settings (required).
    settings: Settings,
    /// Role table, defaults to the standard table.
    roles: RoleTable,
    /// Requested network names, in request order.
    networks: Vec<String>,
}

impl DeploymentContextBuilder {
    /// Create a new [`DeploymentContextBuilder`] from resolved settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            roles: RoleTable::standard(),
            networks: Vec::new(),
        }
    }

    /// Request a network.
    pub fn network(mut self, network: Network) -> Self {
        self.networks.push(network.name().to_string());
        self
    }

    /// Request a network by name. Unknown names fail at [`Self::build`].
    pub fn network_name(mut self, name: impl Into<String>) -> Self {
        self.networks.push(name.into());
        self
    }

    /// Request several networks by name.
    pub fn network_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.networks.extend(names.into_iter().map(Into::into));
        self
    }

    /// Override the role table.
    pub fn roles(mut self, roles: RoleTable) -> Self {
        self.roles = roles;
        self
    }

    /// Build the [`DeploymentContext`].
    ///
    /// Without any requested network, only the default network is built.
    pub fn build(self) -> Result<DeploymentContext, ConfigError> {
        if self.networks.is_empty() {
            return DeploymentContext::assemble_networks(
                &self.settings,
                &self.roles,
                &[Network::Hardhat],
            );
        }

        DeploymentContext::assemble(&self.settings, &self.roles, &self.networks)
    }
}
