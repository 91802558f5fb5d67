//! Signer derivation for the named account roles.

use alloy_core::primitives::Address;
use alloy_signer_local::{MnemonicBuilder, coins_bip39::English};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{AccountRole, AccountsConfig, RoleTable};

/// A signer bound to a named role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedSigner {
    pub role: AccountRole,
    pub derivation_index: u32,
    pub address: Address,
}

/// Signers of every role in the table, in role-table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAccounts {
    signers: Vec<NamedSigner>,
}

impl NamedAccounts {
    /// Derive one signer per role from `accounts`.
    ///
    /// The signer of a role is derived at `{accounts.path}/{derivation_index}`, so
    /// a role keeps its address across networks sharing the same mnemonic.
    pub fn derive(accounts: &AccountsConfig, roles: &RoleTable) -> Result<Self> {
        let signers = roles
            .iter()
            .map(|role| {
                let derivation_index = role.derivation_index();
                let path = format!("{}/{}", accounts.path, derivation_index);

                let signer = MnemonicBuilder::<English>::default()
                    .phrase(accounts.source.phrase())
                    .derivation_path(&path)
                    .with_context(|| format!("Invalid derivation path {path}"))?
                    .build()
                    .with_context(|| format!("Failed to derive the {role} account"))?;

                Ok(NamedSigner {
                    role: *role,
                    derivation_index,
                    address: signer.address(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(count = signers.len(), "Derived named accounts");

        Ok(Self { signers })
    }

    /// The signer bound to `role`, if the table contains it.
    pub fn get(&self, role: AccountRole) -> Option<&NamedSigner> {
        self.signers.iter().find(|signer| signer.role == role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedSigner> {
        self.signers.iter()
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}
