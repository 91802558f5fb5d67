//! Named account roles.
//!
//! Each role is bound to a fixed derivation index. The order of [`AccountRole`]
//! variants is the order signers are derived in, so new roles must be appended at
//! the end: inserting or reordering would silently hand an existing role a
//! different signer.

use derive_more::Deref;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::ConfigError;

/// A logical signer identity bound to a derivation index.
///
/// - Index 0: deployer
/// - Index 1: admin
/// - Index 2: dev
/// - Index 3: owner
/// - Index 4: wallet
/// - Index 5: beneficiary1
/// - Index 6: beneficiary2
/// - Index 7: user
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
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Deployer,
    Admin,
    Dev,
    Owner,
    Wallet,
    Beneficiary1,
    Beneficiary2,
    User,
}

impl AccountRole {
    /// The derivation index bound to this role.
    pub const fn derivation_index(&self) -> u32 {
        match self {
            Self::Deployer => 0,
            Self::Admin => 1,
            Self::Dev => 2,
            Self::Owner => 3,
            Self::Wallet => 4,
            Self::Beneficiary1 => 5,
            Self::Beneficiary2 => 6,
            Self::User => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Look up the role bound to `index`.
    pub fn from_derivation_index(index: u32) -> Option<Self> {
        Self::iter().find(|role| role.derivation_index() == index)
    }
}

/// The ordered, immutable table of account roles.
///
/// Only the standard table or a prefix of it can be built, so every role keeps
/// its derivation index wherever a table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Deref)]
#[serde(try_from = "Vec<AccountRole>", into = "Vec<AccountRole>")]
pub struct RoleTable(Vec<AccountRole>);

impl RoleTable {
    /// The standard role table, in derivation order.
    pub fn standard() -> Self {
        Self(AccountRole::iter().collect())
    }

    /// Number of accounts a signer source must provide to cover every role.
    pub fn required_accounts(&self) -> u32 {
        self.0
            .iter()
            .map(|role| role.derivation_index() + 1)
            .max()
            .unwrap_or(0)
    }
}

impl TryFrom<Vec<AccountRole>> for RoleTable {
    type Error = ConfigError;

    fn try_from(roles: Vec<AccountRole>) -> Result<Self, Self::Error> {
        let is_prefix = roles.len() <= AccountRole::iter().count()
            && roles.iter().copied().eq(AccountRole::iter().take(roles.len()));
        if !is_prefix {
            return Err(ConfigError::InvalidRoleTable {
                roles: roles.iter().map(AccountRole::name).collect::<Vec<_>>().join(", "),
            });
        }
        Ok(Self(roles))
    }
}

impl From<RoleTable> for Vec<AccountRole> {
    fn from(table: RoleTable) -> Self {
        table.0
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// The fixed role table.
pub fn roles() -> RoleTable {
    RoleTable::standard()
}
