//! Configuration handed to the toolchain collaborators: the Solidity compilers,
//! the gas reporter, the block-explorer verifier, the source preprocessor, the
//! type generator and the file watcher.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Network, Settings};

/// Default optimizer runs.
pub const DEFAULT_OPTIMIZER_RUNS: u32 = 200;

/// Currency the gas reporter prices in.
pub const GAS_REPORT_CURRENCY: &str = "USD";

/// Operators a pragma comparator may start with, longest first.
const OPERATORS: [&str; 7] = [">=", "<=", "^", "~", ">", "<", "="];

/// A `major.minor.patch` compiler version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompilerVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl CompilerVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for CompilerVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let partial: PartialVersion = s.parse()?;
        match (partial.minor, partial.patch) {
            (Some(minor), Some(patch)) => Ok(Self::new(partial.major, minor, patch)),
            _ => anyhow::bail!("Compiler version `{s}` must be `major.minor.patch`"),
        }
    }
}

impl Serialize for CompilerVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompilerVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A version as written in a pragma: `0.7.3`, `0.7`, `0` or `0.7.x`.
///
/// Missing or wildcard components cover every value of that component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PartialVersion {
    major: u64,
    minor: Option<u64>,
    patch: Option<u64>,
}

impl PartialVersion {
    /// The lowest version covered.
    fn floor(&self) -> CompilerVersion {
        CompilerVersion::new(self.major, self.minor.unwrap_or(0), self.patch.unwrap_or(0))
    }

    /// The first version above the ones covered, `None` when there is none.
    fn ceiling(&self) -> Option<CompilerVersion> {
        match (self.minor, self.patch) {
            (None, _) => bump_major(self.major),
            (Some(minor), None) => bump_minor(self.major, minor),
            (Some(minor), Some(patch)) => bump_patch(self.major, minor, patch),
        }
    }

    /// The first version no longer caret-compatible: the leftmost non-zero
    /// component may not change.
    fn caret_ceiling(&self) -> Option<CompilerVersion> {
        match (self.major, self.minor, self.patch) {
            (0, Some(0), Some(patch)) => bump_patch(0, 0, patch),
            (0, Some(minor), _) => bump_minor(0, minor),
            (major, _, _) => bump_major(major),
        }
    }

    /// The first version no longer tilde-compatible: only the patch may change.
    fn tilde_ceiling(&self) -> Option<CompilerVersion> {
        match self.minor {
            Some(minor) => bump_minor(self.major, minor),
            None => bump_major(self.major),
        }
    }
}

// Bumps carry into the next component on overflow. Only a bump past the
// largest major has no result.
fn bump_major(major: u64) -> Option<CompilerVersion> {
    major
        .checked_add(1)
        .map(|major| CompilerVersion::new(major, 0, 0))
}

fn bump_minor(major: u64, minor: u64) -> Option<CompilerVersion> {
    match minor.checked_add(1) {
        Some(minor) => Some(CompilerVersion::new(major, minor, 0)),
        None => bump_major(major),
    }
}

fn bump_patch(major: u64, minor: u64, patch: u64) -> Option<CompilerVersion> {
    match patch.checked_add(1) {
        Some(patch) => Some(CompilerVersion::new(major, minor, patch)),
        None => bump_minor(major, minor),
    }
}

impl FromStr for PartialVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let component = |name: &str, part: Option<&str>| -> anyhow::Result<Option<u64>> {
            match part {
                None | Some("x" | "X" | "*") => Ok(None),
                Some(part) => part
                    .parse()
                    .map(Some)
                    .map_err(|_| anyhow::anyhow!("Invalid {name} in version `{s}`")),
            }
        };

        let mut parts = s.trim().split('.');
        let major = component("major", parts.next())?
            .ok_or_else(|| anyhow::anyhow!("Invalid major in version `{s}`"))?;
        let minor = component("minor", parts.next())?;
        let patch = component("patch", parts.next())?;
        if parts.next().is_some() {
            anyhow::bail!("Too many components in version `{s}`");
        }
        if minor.is_none() && patch.is_some() {
            anyhow::bail!("Patch without minor in version `{s}`");
        }

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

/// A single comparator of a version pragma, e.g. `>=0.6.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Comparator {
    op: Ordering,
    or_equal: bool,
    version: CompilerVersion,
}

impl Comparator {
    fn matches(&self, version: &CompilerVersion) -> bool {
        let ord = version.cmp(&self.version);
        ord == self.op || (self.or_equal && ord == Ordering::Equal)
    }

    fn at_least(version: CompilerVersion) -> Self {
        Self {
            op: Ordering::Greater,
            or_equal: true,
            version,
        }
    }

    fn below(version: CompilerVersion) -> Self {
        Self {
            op: Ordering::Less,
            or_equal: false,
            version,
        }
    }

    /// Matches no version at all.
    fn nothing() -> Self {
        Self::below(CompilerVersion::new(0, 0, 0))
    }

    /// Parse one comparator into the lower and upper bounds it stands for.
    ///
    /// An upper bound past the largest version is dropped.
    fn parse(token: &str) -> anyhow::Result<Vec<Self>> {
        if matches!(token, "*" | "x" | "X") {
            return Ok(Vec::new());
        }

        let (op, rest) = OPERATORS
            .iter()
            .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
            .unwrap_or(("=", token));
        let version: PartialVersion = rest.parse()?;
        let floor = Self::at_least(version.floor());

        let (lower, upper) = match op {
            "^" => (Some(floor), version.caret_ceiling().map(Self::below)),
            "~" => (Some(floor), version.tilde_ceiling().map(Self::below)),
            ">=" => (Some(floor), None),
            ">" => (
                Some(version.ceiling().map_or_else(Self::nothing, Self::at_least)),
                None,
            ),
            "<" => (None, Some(Self::below(version.floor()))),
            "<=" => (None, version.ceiling().map(Self::below)),
            _ => (Some(floor), version.ceiling().map(Self::below)),
        };
        Ok(lower.into_iter().chain(upper).collect())
    }
}

/// Split a range into comparator tokens, joining an operator written apart from
/// its version (`>= 0.6.0`).
fn comparator_tokens(range: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut pending: Option<&str> = None;

    for word in range.split_whitespace() {
        match pending.take() {
            Some(op) => tokens.push(format!("{op}{word}")),
            None if OPERATORS.contains(&word) => pending = Some(word),
            None => tokens.push(word.to_string()),
        }
    }
    if let Some(op) = pending {
        anyhow::bail!("Operator `{op}` is not followed by a version in `{range}`");
    }

    Ok(tokens)
}

/// A Solidity version pragma such as `^0.7.0` or `>=0.6.0 <0.8.0`.
///
/// The leading `pragma solidity` and trailing `;` of a source line are accepted.
/// Alternatives separated by `||` match if any of them does. Versions may be
/// partial (`^0.7`, `>= 0.6`), in which case the missing components are free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPragma {
    alternatives: Vec<Vec<Comparator>>,
}

impl VersionPragma {
    pub fn matches(&self, version: &CompilerVersion) -> bool {
        self.alternatives
            .iter()
            .any(|set| set.iter().all(|comparator| comparator.matches(version)))
    }
}

impl FromStr for VersionPragma {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim().trim_end_matches(';');
        let body = body
            .strip_prefix("pragma")
            .map(|rest| rest.trim_start().trim_start_matches("solidity"))
            .unwrap_or(body);

        let alternatives = body
            .split("||")
            .map(|alternative| {
                let tokens = comparator_tokens(alternative)?;
                if tokens.is_empty() {
                    anyhow::bail!("Empty version pragma `{s}`");
                }
                let mut comparators = Vec::new();
                for token in &tokens {
                    comparators.extend(Comparator::parse(token)?);
                }
                Ok(comparators)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self { alternatives })
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub enabled: bool,
    pub runs: u32,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            runs: DEFAULT_OPTIMIZER_RUNS,
        }
    }
}

/// One entry of the compiler list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
    pub version: CompilerVersion,
    pub optimizer: OptimizerSettings,
}

impl CompilerSettings {
    pub const fn new(version: CompilerVersion) -> Self {
        Self {
            version,
            optimizer: OptimizerSettings {
                enabled: true,
                runs: DEFAULT_OPTIMIZER_RUNS,
            },
        }
    }
}

/// Ordered list of compilers. Order is significant: see [`CompilerConfig::select`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub compilers: Vec<CompilerSettings>,
}

impl CompilerConfig {
    /// The first compiler whose version satisfies `pragma`.
    pub fn select(&self, pragma: &VersionPragma) -> Option<&CompilerSettings> {
        self.compilers
            .iter()
            .find(|compiler| pragma.matches(&compiler.version))
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            compilers: vec![
                CompilerSettings::new(CompilerVersion::new(0, 6, 12)),
                CompilerSettings::new(CompilerVersion::new(0, 7, 3)),
            ],
        }
    }
}

/// Gas reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasReporterConfig {
    pub enabled: bool,
    pub coinmarketcap: String,
    pub currency: String,
}

impl GasReporterConfig {
    /// Reporting is enabled when `REPORT_GAS` is exactly `"false"`.
    ///
    /// This inverted comparison is how existing projects behave and is kept as is.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.report_gas_flag() == "false",
            coinmarketcap: settings.coinmarketcap_api_key().to_string(),
            currency: GAS_REPORT_CURRENCY.to_string(),
        }
    }
}

/// Block-explorer verification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub etherscan_api_key: String,
}

impl VerificationConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            etherscan_api_key: settings.etherscan_api_key().to_string(),
        }
    }
}

/// Decides on which networks `console.log` statements are stripped from sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStripPolicy {
    /// Networks that keep their log statements.
    pub keep_on: BTreeSet<String>,
}

impl LogStripPolicy {
    /// Whether log statements are stripped when compiling for `network`.
    pub fn strips_logs(&self, network: &str) -> bool {
        !self.keep_on.contains(network)
    }
}

impl Default for LogStripPolicy {
    fn default() -> Self {
        Self {
            keep_on: [Network::Hardhat, Network::Localhost]
                .iter()
                .map(|network| network.name().to_string())
                .collect(),
        }
    }
}

/// Type binding generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypechainConfig {
    pub out_dir: String,
    pub target: String,
}

impl Default for TypechainConfig {
    fn default() -> Self {
        Self {
            out_dir: "typechain".to_string(),
            target: "ethers-v5".to_string(),
        }
    }
}

/// Watch configuration: recompile when a contract changes.
///
/// Static and independent of the network, so it lives outside the validated context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub tasks: Vec<String>,
    pub files: Vec<String>,
    pub verbose: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            tasks: vec!["compile".to_string()],
            files: vec!["./contracts".to_string()],
            verbose: true,
        }
    }
}
