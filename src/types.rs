//! Type-safe lifecycle and attribute types shared by the reconcilers.
//!
//! States, statuses and policy effects are proper enums rather than strings,
//! so an unknown value is rejected when arguments or config files are read.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString};

/// Target lifecycle for aliases, buckets and policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

impl State {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

/// Target lifecycle for users.
///
/// `Enabled` and `Disabled` imply `Present` and additionally pin the account
/// status. `Present` leaves the status alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserState {
    #[default]
    Present,
    Absent,
    Enabled,
    Disabled,
}

impl UserState {
    /// Whether the user must exist after reconciliation
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// The account status this state requires, if it pins one
    pub fn target_status(&self) -> Option<UserStatus> {
        match self {
            Self::Enabled => Some(UserStatus::Enabled),
            Self::Disabled => Some(UserStatus::Disabled),
            Self::Present | Self::Absent => None,
        }
    }
}

/// Account status as reported by `mc admin user info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Enabled,
    Disabled,
}

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Effect {
    #[serde(alias = "allow")]
    Allow,
    #[serde(alias = "deny")]
    Deny,
}

/// A credential that must never show up in logs or reports.
///
/// `Debug` and `Display` print a fixed mask; the value is only reachable via
/// [`Secret::expose`].
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub const MASK: &'static str = "********";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", Self::MASK)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MASK)
    }
}
