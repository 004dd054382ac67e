use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::client::Connection;
use crate::desired::{DesiredAlias, DesiredBucket, DesiredPolicy, DesiredUser, PolicyContent};
use crate::error::{ReconcileError, Result};
use crate::types::{Secret, State, UserState};

/// minio-reconcile - Declarative management of MinIO resources through `mc`
#[derive(Parser)]
#[command(name = "minio-reconcile")]
#[command(about = "Converge MinIO aliases, buckets, policies and users to a desired state")]
#[command(version)]
pub struct Cli {
    /// Check mode: report whether anything would change without changing it.
    ///
    /// Listing calls still run so the prediction reflects the live server.
    /// Mutating calls (create, remove, attach, enable...) are skipped.
    #[arg(long, global = true)]
    pub check: bool,

    /// Path to the `mc` binary (defaults to the one on PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub mc_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage a local `mc` alias
    Alias(AliasArgs),
    /// Manage a bucket
    Bucket(BucketArgs),
    /// Manage a canned policy
    Policy(PolicyArgs),
    /// Manage a user, its policy and its status
    User(UserArgs),
    /// Reconcile every resource listed in a configuration file
    Apply {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file without contacting the server
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

/// Server connection used by bucket, policy and user commands
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Server URL (e.g., http://localhost:9000)
    #[arg(long)]
    pub url: Option<String>,
    /// Access key of the administrative account
    #[arg(long)]
    pub auth_access_key: Option<String>,
    /// Secret key of the administrative account
    #[arg(long)]
    pub auth_secret_key: Option<String>,
}

impl AuthArgs {
    /// `None` when no auth flag was given; a partial set is an error.
    pub fn connection(&self) -> Result<Option<Connection>> {
        match (&self.url, &self.auth_access_key, &self.auth_secret_key) {
            (None, None, None) => Ok(None),
            (Some(url), Some(access_key), Some(secret_key)) => Ok(Some(Connection::new(
                url.as_str(),
                access_key.as_str(),
                secret_key.as_str(),
            ))),
            _ => Err(ReconcileError::config(
                "parameters are required together: url, auth_access_key, auth_secret_key",
            )),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AliasArgs {
    /// Alias name
    #[arg(short, long)]
    pub name: String,
    /// Server URL the alias points at
    #[arg(long)]
    pub url: Option<String>,
    /// Access key stored in the alias
    #[arg(long)]
    pub access_key: Option<String>,
    /// Secret key stored in the alias
    #[arg(long)]
    pub secret_key: Option<String>,
    #[arg(long, value_enum, default_value_t = State::Present)]
    pub state: State,
}

impl AliasArgs {
    pub fn desired(&self) -> Result<DesiredAlias> {
        DesiredAlias::new(
            self.name.as_str(),
            self.url.clone(),
            self.access_key.clone(),
            self.secret_key.clone().map(Secret::from),
            self.state,
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct BucketArgs {
    /// Bucket name
    #[arg(short, long)]
    pub name: String,
    #[arg(long, value_enum, default_value_t = State::Present)]
    pub state: State,
    #[command(flatten)]
    pub auth: AuthArgs,
}

impl BucketArgs {
    pub fn desired(&self) -> Result<DesiredBucket> {
        DesiredBucket::new(self.name.as_str(), self.state)
    }
}

#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Policy name
    #[arg(short, long)]
    pub name: String,
    /// Complete policy document as JSON
    #[arg(long)]
    pub data: Option<String>,
    /// JSON list of statements: [{"effect", "action", "resource"}, ...]
    #[arg(long)]
    pub statements: Option<String>,
    #[arg(long, value_enum, default_value_t = State::Present)]
    pub state: State,
    #[command(flatten)]
    pub auth: AuthArgs,
}

impl PolicyArgs {
    pub fn desired(&self) -> Result<DesiredPolicy> {
        if self.data.is_some() && self.statements.is_some() {
            return Err(ReconcileError::config(
                "parameters are mutually exclusive: data, statements",
            ));
        }
        let data = self
            .data
            .as_deref()
            .map(PolicyContent::from_json)
            .transpose()?;
        let statements = self
            .statements
            .as_deref()
            .map(PolicyContent::statements_from_json)
            .transpose()?;
        DesiredPolicy::new(self.name.as_str(), data, statements, self.state)
    }
}

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    /// Access key (user name)
    #[arg(long)]
    pub access_key: String,
    /// Secret key; required unless --state absent
    #[arg(long)]
    pub secret_key: Option<String>,
    /// Policy to attach; omit to detach any attached policy
    #[arg(long)]
    pub policy: Option<String>,
    /// Re-issue the secret key even if the user exists
    #[arg(long)]
    pub force: bool,
    #[arg(long, value_enum, default_value_t = UserState::Present)]
    pub state: UserState,
    #[command(flatten)]
    pub auth: AuthArgs,
}

impl UserArgs {
    pub fn desired(&self) -> Result<DesiredUser> {
        DesiredUser::new(
            self.access_key.as_str(),
            self.secret_key.clone().map(Secret::from),
            self.policy.clone(),
            self.force,
            self.state,
        )
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
