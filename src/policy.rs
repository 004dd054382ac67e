//! Policy documents: synthesis from statements, canonical comparison and
//! staging on disk for `mc admin policy create`.

use crate::error::Result;
use crate::types::Effect;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Policy language version stamped on synthesized documents.
pub const POLICY_VERSION: &str = "2012-10-17";

/// One statement of a synthesized policy.
///
/// `action` and `resource` accept a single string or a list; each entry
/// becomes its own element of the generated array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Statement {
    pub effect: Effect,
    #[serde(alias = "actions", deserialize_with = "one_or_many")]
    pub action: Vec<String>,
    #[serde(alias = "resources", deserialize_with = "one_or_many")]
    pub resource: Vec<String>,
}

impl Statement {
    pub fn new<A, R>(effect: Effect, action: A, resource: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect,
            action: action.into_iter().map(Into::into).collect(),
            resource: resource.into_iter().map(Into::into).collect(),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "Effect": self.effect.to_string(),
            "Action": self.action,
            "Resource": self.resource,
        })
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Build `{"Version": "2012-10-17", "Statement": [...]}` from statements.
pub fn build_document(statements: &[Statement]) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": statements.iter().map(Statement::to_json).collect::<Vec<_>>(),
    })
}

/// Serialize `document` compactly with object keys sorted at every depth.
///
/// serde_json's map is a `BTreeMap` unless `preserve_order` is enabled, so
/// plain serialization is already canonical. Two documents are considered
/// equal exactly when their canonical forms are equal, however they were
/// written.
pub fn canonicalize(document: &Value) -> String {
    document.to_string()
}

/// Whether two documents are equivalent under [`canonicalize`].
pub fn documents_match(current: &Value, desired: &Value) -> bool {
    canonicalize(current) == canonicalize(desired)
}

/// A policy document written to a private temporary directory.
///
/// `mc` only accepts policies from a file. The directory and file are removed
/// when this value is dropped, including on error paths.
pub struct StagedPolicy {
    _dir: TempDir,
    path: PathBuf,
}

impl StagedPolicy {
    pub fn write(document: &Value) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("minio-policy").tempdir()?;
        let path = dir.path().join("policy.json");
        fs::write(&path, serde_json::to_string_pretty(document)?)?;
        debug!("staged policy document at {}", path.display());
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
