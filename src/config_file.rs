//! Batch configuration files for `apply` and `validate`.
//!
//! A config file lists the server connection once and any number of
//! resources, which are reconciled in file order:
//!
//! ```json
//! {
//!   "auth": { "url": "http://localhost:9000", "access_key": "minioadmin", "secret_key": "minioadmin" },
//!   "resources": [
//!     { "kind": "policy", "name": "readonly", "statements": [
//!         { "effect": "Allow", "action": ["s3:GetObject"], "resource": ["arn:aws:s3:::data/*"] } ] },
//!     { "kind": "user", "access_key": "app", "secret_key": "app-secret", "policy": "readonly" },
//!     { "kind": "bucket", "name": "data" }
//!   ]
//! }
//! ```
//!
//! Every resource goes through the same validated constructors as the
//! per-kind subcommands, so a file that loads is free of configuration
//! errors.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::client::Connection;
use crate::desired::{DesiredAlias, DesiredBucket, DesiredPolicy, DesiredUser};

/// One resource entry, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resource {
    Alias(DesiredAlias),
    Bucket(DesiredBucket),
    Policy(DesiredPolicy),
    User(DesiredUser),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Alias(_) => "alias",
            Self::Bucket(_) => "bucket",
            Self::Policy(_) => "policy",
            Self::User(_) => "user",
        }
    }

    /// The identifying key: name, or access key for users.
    pub fn name(&self) -> &str {
        match self {
            Self::Alias(a) => &a.name,
            Self::Bucket(b) => &b.name,
            Self::Policy(p) => &p.name,
            Self::User(u) => &u.access_key,
        }
    }

    /// Whether reconciling this resource needs a server connection.
    pub fn needs_server(&self) -> bool {
        !matches!(self, Self::Alias(_))
    }
}

/// A batch of resources plus the connection used to manage them
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub auth: Option<Connection>,
    pub resources: Vec<Resource>,
}

impl BatchConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse configuration JSON")
    }

    /// Cross-resource checks that a single entry cannot express
    pub fn validate(&self) -> Result<()> {
        if self.resources.iter().any(Resource::needs_server) {
            let auth = self
                .auth
                .as_ref()
                .context("auth is required when buckets, policies or users are listed")?;
            auth.mc_host().context("Invalid auth section")?;
        }

        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert((resource.kind(), resource.name())) {
                anyhow::bail!(
                    "{} '{}' is listed more than once",
                    resource.kind(),
                    resource.name()
                );
            }
        }

        Ok(())
    }
}
