//! Desired state, one validated struct per resource kind.
//!
//! Construction is the only place inputs are checked: a value of any of these
//! types is already known to satisfy its required/mutually exclusive field
//! rules, so reconcilers never re-validate. Config files deserialize through
//! the same constructors via `#[serde(try_from)]`.

use crate::error::{ReconcileError, Result};
use crate::policy::{Statement, build_document};
use crate::types::{Secret, State, UserState};
use serde::Deserialize;
use serde_json::Value;

fn require_name(kind: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ReconcileError::config(format!("{kind} {field} must not be empty")))
    } else {
        Ok(())
    }
}

fn missing_for_present(missing: &[&str]) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReconcileError::config(format!(
            "state is present but all of the following are missing: {}",
            missing.join(", ")
        )))
    }
}

// ============================================================================
// Alias
// ============================================================================

/// Connection details an alias points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub url: String,
    pub access_key: String,
    pub secret_key: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawAlias")]
pub struct DesiredAlias {
    pub name: String,
    /// Set exactly when `state` is present.
    pub target: Option<AliasTarget>,
    pub state: State,
}

#[derive(Deserialize)]
struct RawAlias {
    name: String,
    url: Option<String>,
    access_key: Option<String>,
    secret_key: Option<Secret>,
    #[serde(default)]
    state: State,
}

impl TryFrom<RawAlias> for DesiredAlias {
    type Error = ReconcileError;

    fn try_from(raw: RawAlias) -> Result<Self> {
        DesiredAlias::new(raw.name, raw.url, raw.access_key, raw.secret_key, raw.state)
    }
}

impl DesiredAlias {
    /// `present` requires url and both keys; `absent` only the name.
    pub fn new(
        name: impl Into<String>,
        url: Option<String>,
        access_key: Option<String>,
        secret_key: Option<Secret>,
        state: State,
    ) -> Result<Self> {
        let name = name.into();
        require_name("alias", "name", &name)?;

        let target = match state {
            State::Absent => None,
            State::Present => {
                let missing: Vec<&str> = [
                    ("url", url.is_none()),
                    ("access_key", access_key.is_none()),
                    ("secret_key", secret_key.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, absent)| absent.then_some(field))
                .collect();
                missing_for_present(&missing)?;

                url.zip(access_key)
                    .zip(secret_key)
                    .map(|((url, access_key), secret_key)| AliasTarget {
                        url,
                        access_key,
                        secret_key,
                    })
            }
        };

        Ok(Self {
            name,
            target,
            state,
        })
    }

    pub fn present(
        name: impl Into<String>,
        url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<Secret>,
    ) -> Self {
        Self {
            name: name.into(),
            target: Some(AliasTarget {
                url: url.into(),
                access_key: access_key.into(),
                secret_key: secret_key.into(),
            }),
            state: State::Present,
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            state: State::Absent,
        }
    }
}

// ============================================================================
// Bucket
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBucket")]
pub struct DesiredBucket {
    pub name: String,
    pub state: State,
}

#[derive(Deserialize)]
struct RawBucket {
    name: String,
    #[serde(default)]
    state: State,
}

impl TryFrom<RawBucket> for DesiredBucket {
    type Error = ReconcileError;

    fn try_from(raw: RawBucket) -> Result<Self> {
        DesiredBucket::new(raw.name, raw.state)
    }
}

impl DesiredBucket {
    pub fn new(name: impl Into<String>, state: State) -> Result<Self> {
        let name = name.into();
        require_name("bucket", "name", &name)?;
        Ok(Self { name, state })
    }
}

// ============================================================================
// Policy
// ============================================================================

/// The two mutually exclusive ways of describing policy content.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyContent {
    /// A complete JSON policy document.
    Document(Value),
    /// Statements to be expanded into a document.
    Statements(Vec<Statement>),
}

impl PolicyContent {
    /// Parse a raw JSON document. Invalid JSON is a configuration error.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map(Self::Document)
            .map_err(|e| ReconcileError::config(format!("policy data is not valid JSON: {e}")))
    }

    /// Parse a JSON list of statements. Malformed statements are a
    /// configuration error.
    pub fn statements_from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map(Self::Statements)
            .map_err(|e| ReconcileError::config(format!("invalid policy statements: {e}")))
    }

    /// The JSON document this content describes.
    pub fn to_document(&self) -> Value {
        match self {
            Self::Document(doc) => doc.clone(),
            Self::Statements(statements) => build_document(statements),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPolicy")]
pub struct DesiredPolicy {
    pub name: String,
    /// Target document. Set exactly when `state` is present.
    pub document: Option<Value>,
    pub state: State,
}

#[derive(Deserialize)]
struct RawPolicy {
    name: String,
    /// Either a JSON object or a string holding JSON.
    data: Option<Value>,
    statements: Option<Vec<Statement>>,
    #[serde(default)]
    state: State,
}

impl TryFrom<RawPolicy> for DesiredPolicy {
    type Error = ReconcileError;

    fn try_from(raw: RawPolicy) -> Result<Self> {
        let data = match raw.data {
            Some(Value::String(text)) => Some(PolicyContent::from_json(&text)?),
            Some(Value::Null) | None => None,
            Some(doc) => Some(PolicyContent::Document(doc)),
        };
        let statements = raw.statements.map(PolicyContent::Statements);
        DesiredPolicy::new(raw.name, data, statements, raw.state)
    }
}

impl DesiredPolicy {
    /// `data` and `statements` are mutually exclusive; `present` requires one
    /// of them.
    pub fn new(
        name: impl Into<String>,
        data: Option<PolicyContent>,
        statements: Option<PolicyContent>,
        state: State,
    ) -> Result<Self> {
        let name = name.into();
        require_name("policy", "name", &name)?;

        let content = match (data, statements) {
            (Some(_), Some(_)) => {
                return Err(ReconcileError::config(
                    "parameters are mutually exclusive: data, statements",
                ));
            }
            (Some(content), None) | (None, Some(content)) => Some(content),
            (None, None) => None,
        };

        let document = match state {
            State::Absent => None,
            State::Present => {
                if content.is_none() {
                    missing_for_present(&["data or statements"])?;
                }
                content.as_ref().map(PolicyContent::to_document)
            }
        };

        Ok(Self {
            name,
            document,
            state,
        })
    }

    pub fn present(name: impl Into<String>, content: PolicyContent) -> Self {
        Self {
            name: name.into(),
            document: Some(content.to_document()),
            state: State::Present,
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            document: None,
            state: State::Absent,
        }
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawUser")]
pub struct DesiredUser {
    pub access_key: String,
    /// Required unless `state` is absent.
    pub secret_key: Option<Secret>,
    /// Policy to attach; `None` means no policy should be attached.
    pub policy: Option<String>,
    /// Re-issue the secret even when the user already exists.
    pub force: bool,
    pub state: UserState,
}

#[derive(Deserialize)]
struct RawUser {
    access_key: String,
    secret_key: Option<Secret>,
    policy: Option<String>,
    #[serde(default)]
    force: bool,
    #[serde(default)]
    state: UserState,
}

impl TryFrom<RawUser> for DesiredUser {
    type Error = ReconcileError;

    fn try_from(raw: RawUser) -> Result<Self> {
        DesiredUser::new(raw.access_key, raw.secret_key, raw.policy, raw.force, raw.state)
    }
}

impl DesiredUser {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: Option<Secret>,
        policy: Option<String>,
        force: bool,
        state: UserState,
    ) -> Result<Self> {
        let access_key = access_key.into();
        require_name("user", "access_key", &access_key)?;

        if state.is_present() && secret_key.is_none() {
            return Err(ReconcileError::config(format!(
                "state is {state} but all of the following are missing: secret_key"
            )));
        }

        Ok(Self {
            access_key,
            secret_key,
            policy: policy.filter(|p| !p.is_empty()),
            force,
            state,
        })
    }
}
