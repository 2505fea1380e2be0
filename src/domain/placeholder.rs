//! Placeholder requests understood by the resolution cache.
//!
//! Identifiers are parsed once at the boundary into [`Placeholder`]. The
//! canonical textual form is `<kind>` or `<kind>::<group>`: everything after
//! the first `::` is taken verbatim as the group name, so group names may
//! contain underscores or words like `formatted`.
//!
//! The older underscore form (`totalmoney_vip_formatted`, `groupsize_vip`,
//! ...) is still accepted. In that form the exact identifiers
//! `totalmoney_formatted` and `totalmoney_commas` always refer to the
//! subject's own group.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Which group a placeholder refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The primary group of the subject the placeholder is rendered for.
    OwnGroup,
    /// An explicitly named group.
    Group(String),
}

/// A parsed placeholder request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Number of members in the group.
    MemberCount(Target),
    /// Summed balance, raw decimal.
    TotalBalance(Target),
    /// Summed balance, magnitude-abbreviated (`1.5K`).
    TotalBalanceFormatted(Target),
    /// Summed balance, comma-grouped (`1,500`).
    TotalBalanceCommas(Target),
    /// The subject's primary group name.
    PrimaryGroup,
}

/// Errors returned when an identifier is not a known placeholder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderParseError {
    #[error("unknown placeholder '{0}'")]
    Unknown(String),

    #[error("placeholder '{0}' names an empty group")]
    EmptyGroup(String),

    #[error("placeholder '{0}' does not take a group")]
    UnexpectedGroup(String),
}

impl Placeholder {
    /// The group target, if this kind aggregates over a group.
    #[must_use]
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::MemberCount(t)
            | Self::TotalBalance(t)
            | Self::TotalBalanceFormatted(t)
            | Self::TotalBalanceCommas(t) => Some(t),
            Self::PrimaryGroup => None,
        }
    }

    /// Canonical kind name, without group.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MemberCount(_) => "memberCount",
            Self::TotalBalance(_) => "totalBalance",
            Self::TotalBalanceFormatted(_) => "totalBalance_formatted",
            Self::TotalBalanceCommas(_) => "totalBalance_commas",
            Self::PrimaryGroup => "primaryGroup",
        }
    }

    fn with_target(kind: &str, target: Target) -> Option<Self> {
        match kind {
            "memberCount" => Some(Self::MemberCount(target)),
            "totalBalance" => Some(Self::TotalBalance(target)),
            "totalBalance_formatted" => Some(Self::TotalBalanceFormatted(target)),
            "totalBalance_commas" => Some(Self::TotalBalanceCommas(target)),
            _ => None,
        }
    }

    fn parse_legacy(s: &str) -> Option<Self> {
        let own = Target::OwnGroup;
        match s {
            "groupsize" => return Some(Self::MemberCount(own)),
            "totalmoney" => return Some(Self::TotalBalance(own)),
            "totalmoney_formatted" => return Some(Self::TotalBalanceFormatted(own)),
            "totalmoney_commas" => return Some(Self::TotalBalanceCommas(own)),
            "playergroup" => return Some(Self::PrimaryGroup),
            _ => {}
        }

        let named = |group: &str| (!group.is_empty()).then(|| Target::Group(group.to_string()));

        if let Some(group) = s.strip_prefix("groupsize_") {
            return named(group).map(Self::MemberCount);
        }

        let rest = s.strip_prefix("totalmoney_")?;
        if let Some(group) = rest.strip_suffix("_formatted") {
            named(group).map(Self::TotalBalanceFormatted)
        } else if let Some(group) = rest.strip_suffix("_commas") {
            named(group).map(Self::TotalBalanceCommas)
        } else {
            named(rest).map(Self::TotalBalance)
        }
    }
}

impl FromStr for Placeholder {
    type Err = PlaceholderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((kind, group)) = s.split_once("::") {
            if kind == "primaryGroup" {
                return Err(PlaceholderParseError::UnexpectedGroup(s.to_string()));
            }
            if group.is_empty() {
                return Err(PlaceholderParseError::EmptyGroup(s.to_string()));
            }
            return Self::with_target(kind, Target::Group(group.to_string()))
                .ok_or_else(|| PlaceholderParseError::Unknown(s.to_string()));
        }

        if s == "primaryGroup" {
            return Ok(Self::PrimaryGroup);
        }

        Self::with_target(s, Target::OwnGroup)
            .or_else(|| Self::parse_legacy(s))
            .ok_or_else(|| PlaceholderParseError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(Target::Group(group)) => write!(f, "{}::{}", self.kind(), group),
            _ => f.write_str(self.kind()),
        }
    }
}
