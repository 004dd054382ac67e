//! [`AdminClient`] implementation that drives the MinIO client (`mc`).
//!
//! Every call runs `mc --json ...` and parses the newline-delimited JSON it
//! prints. Server credentials travel through an `MC_HOST_<alias>` variable on
//! the child process, so nothing is written to the user's `mc` config for
//! admin work. Alias operations are the exception: managing the local config
//! is their whole point.

use super::{AdminClient, AliasRecord, Connection, McCommand, UserRecord};
use crate::command_runner::{CommandRunner, Invocation, ProcessRunner};
use crate::error::{ReconcileError, Result};
use crate::types::{Secret, UserStatus};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Alias name the server is reachable under for admin commands.
pub const TARGET_ALIAS: &str = "reconcile";

pub struct McClient<R: CommandRunner = ProcessRunner> {
    runner: R,
    program: PathBuf,
    /// Rendered `MC_HOST_<alias>` value, when a server connection was given.
    host: Option<String>,
}

impl McClient<ProcessRunner> {
    /// Build a client around the `mc` binary at `mc_path`, or the first `mc`
    /// on `PATH`.
    ///
    /// `connection` may be omitted when only aliases are managed.
    pub fn locate(mc_path: Option<PathBuf>, connection: Option<&Connection>) -> Result<Self> {
        let program = match mc_path {
            Some(path) => path,
            None => which::which("mc").map_err(|e| {
                ReconcileError::config(format!("Failed to find required executable \"mc\": {e}"))
            })?,
        };
        Self::with_runner(ProcessRunner, program, connection)
    }
}

impl<R: CommandRunner> McClient<R> {
    /// Connection problems (bad URL, empty keys) are reported here, before
    /// any process is spawned.
    pub fn with_runner(
        runner: R,
        program: impl Into<PathBuf>,
        connection: Option<&Connection>,
    ) -> Result<Self> {
        let host = connection.map(Connection::mc_host).transpose()?;
        Ok(Self {
            runner,
            program: program.into(),
            host,
        })
    }

    fn invocation(&self, command: &McCommand) -> Result<Invocation> {
        let mut env = Vec::new();
        if command.needs_target() {
            let host = self.host.as_ref().ok_or_else(|| {
                ReconcileError::config("server url and credentials are required for this operation")
            })?;
            env.push((format!("MC_HOST_{TARGET_ALIAS}"), host.clone()));
        }

        Ok(Invocation {
            program: self.program.clone(),
            args: command.to_cli_args(TARGET_ALIAS),
            env,
            display: format!(
                "{} {}",
                self.program.display(),
                command.display_args(TARGET_ALIAS).join(" ")
            ),
        })
    }

    /// Run `command`, returning stdout. A non-zero exit becomes a command
    /// error labelled with `failure`.
    fn execute(&self, command: &McCommand, failure: &str) -> Result<String> {
        let invocation = self.invocation(command)?;
        if command.is_mutating() {
            debug!("mutating call: {}", invocation.display);
        }
        let output = self.runner.run(&invocation)?;
        Ok(output.ensure_success(failure, &invocation.display)?.stdout)
    }
}

/// Parse `mc --json` output: one JSON object per non-empty line.
fn json_lines(stdout: &str, what: &str) -> Result<Vec<Value>> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| {
                ReconcileError::parse(format!("{what}: line {} is not valid JSON: {e}", idx + 1))
            })
        })
        .collect()
}

fn from_value<T: for<'de> Deserialize<'de>>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ReconcileError::parse(format!("{what}: unexpected record shape: {e}")))
}

#[derive(Deserialize)]
struct AliasLine {
    alias: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "accessKey")]
    access_key: String,
    #[serde(rename = "secretKey", default)]
    secret_key: String,
}

#[derive(Deserialize)]
struct UserLine {
    #[serde(rename = "accessKey")]
    access_key: String,
    #[serde(rename = "policyName", default)]
    policy_name: Option<String>,
    #[serde(rename = "userStatus", default)]
    status: UserStatus,
}

/// `policyName` is a comma-joined list; empty entries are dropped.
fn split_policies(joined: &str) -> BTreeSet<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<UserLine> for UserRecord {
    fn from(line: UserLine) -> Self {
        Self {
            access_key: line.access_key,
            policies: line
                .policy_name
                .as_deref()
                .map(split_policies)
                .unwrap_or_default(),
            status: line.status,
        }
    }
}

#[derive(Deserialize)]
struct PolicyLine {
    policy: String,
}

#[derive(Deserialize)]
struct PolicyInfoLine {
    #[serde(rename = "policyInfo")]
    policy_info: PolicyInfo,
}

#[derive(Deserialize)]
struct PolicyInfo {
    #[serde(alias = "Policy")]
    policy: Value,
}

#[derive(Deserialize)]
struct LsLine {
    key: String,
}

/// `mc --json` status lines carry `"status": "error"` on failure even when
/// the exit code is zero for some subcommands.
fn is_success(value: &Value) -> bool {
    value
        .get("status")
        .and_then(Value::as_str)
        .is_none_or(|status| status == "success")
}

impl<R: CommandRunner> AdminClient for McClient<R> {
    fn list_aliases(&self) -> Result<Vec<AliasRecord>> {
        let stdout = self.execute(&McCommand::AliasList, "Failed to list aliases")?;

        let mut aliases = Vec::new();
        for value in json_lines(&stdout, "alias list")? {
            // Lines without credentials are status chatter, not aliases.
            if value.get("accessKey").is_none() {
                continue;
            }
            let line: AliasLine = from_value(value, "alias list")?;
            aliases.push(AliasRecord {
                name: line.alias,
                url: line.url,
                access_key: line.access_key,
                secret_key: Secret::new(line.secret_key),
            });
        }
        debug!("found {} aliases", aliases.len());
        Ok(aliases)
    }

    fn set_alias(
        &self,
        name: &str,
        url: &str,
        access_key: &str,
        secret_key: &Secret,
    ) -> Result<()> {
        let command = McCommand::AliasSet {
            name: name.to_string(),
            url: url.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.clone(),
        };
        self.execute(&command, "Failed to set alias").map(drop)
    }

    fn remove_alias(&self, name: &str) -> Result<()> {
        let command = McCommand::AliasRemove {
            name: name.to_string(),
        };
        self.execute(&command, "Failed to delete alias").map(drop)
    }

    fn list_policies(&self) -> Result<BTreeMap<String, Value>> {
        let stdout = self.execute(&McCommand::PolicyList, "Failed to list policies")?;

        let mut names = Vec::new();
        for value in json_lines(&stdout, "policy list")? {
            if !is_success(&value) || value.get("policy").is_none() {
                continue;
            }
            let line: PolicyLine = from_value(value, "policy list")?;
            names.push(line.policy);
        }

        let mut policies = BTreeMap::new();
        for name in names {
            let command = McCommand::PolicyInfo { name: name.clone() };
            let stdout = self.execute(&command, "Failed to read policy")?;
            let value = json_lines(&stdout, "policy info")?
                .into_iter()
                .find(|v| v.get("policyInfo").is_some())
                .ok_or_else(|| {
                    ReconcileError::parse(format!("policy info for '{name}' has no policyInfo"))
                })?;
            let info: PolicyInfoLine = from_value(value, "policy info")?;
            policies.insert(name, info.policy_info.policy);
        }
        debug!("found {} policies", policies.len());
        Ok(policies)
    }

    fn add_policy(&self, name: &str, file: &Path) -> Result<()> {
        let command = McCommand::PolicyCreate {
            name: name.to_string(),
            file: file.to_path_buf(),
        };
        self.execute(&command, "Failed to add policy").map(drop)
    }

    fn remove_policy(&self, name: &str) -> Result<()> {
        let command = McCommand::PolicyRemove {
            name: name.to_string(),
        };
        self.execute(&command, "Failed to remove policy").map(drop)
    }

    fn list_users(&self) -> Result<BTreeMap<String, UserRecord>> {
        let stdout = self.execute(&McCommand::UserList, "Failed to list users")?;

        let mut users = BTreeMap::new();
        for value in json_lines(&stdout, "user list")? {
            if !is_success(&value) || value.get("accessKey").is_none() {
                continue;
            }
            let line: UserLine = from_value(value, "user list")?;
            let record = UserRecord::from(line);
            users.insert(record.access_key.clone(), record);
        }
        debug!("found {} users", users.len());
        Ok(users)
    }

    fn add_user(&self, access_key: &str, secret_key: &Secret) -> Result<()> {
        let command = McCommand::UserAdd {
            access_key: access_key.to_string(),
            secret_key: secret_key.clone(),
        };
        self.execute(&command, "Failed to add user").map(drop)
    }

    fn user_info(&self, access_key: &str) -> Result<UserRecord> {
        let command = McCommand::UserInfo {
            access_key: access_key.to_string(),
        };
        let stdout = self.execute(&command, "Failed to read user")?;
        let value = json_lines(&stdout, "user info")?
            .into_iter()
            .find(|v| v.get("accessKey").is_some())
            .ok_or_else(|| {
                ReconcileError::parse(format!("user info for '{access_key}' has no accessKey"))
            })?;
        let line: UserLine = from_value(value, "user info")?;
        Ok(line.into())
    }

    fn enable_user(&self, access_key: &str) -> Result<()> {
        let command = McCommand::UserEnable {
            access_key: access_key.to_string(),
        };
        self.execute(&command, "Failed to enable user").map(drop)
    }

    fn disable_user(&self, access_key: &str) -> Result<()> {
        let command = McCommand::UserDisable {
            access_key: access_key.to_string(),
        };
        self.execute(&command, "Failed to disable user").map(drop)
    }

    fn remove_user(&self, access_key: &str) -> Result<()> {
        let command = McCommand::UserRemove {
            access_key: access_key.to_string(),
        };
        self.execute(&command, "Failed to remove user").map(drop)
    }

    fn attach_policy(&self, policy: &str, access_key: &str) -> Result<()> {
        let command = McCommand::PolicyAttach {
            policy: policy.to_string(),
            user: access_key.to_string(),
        };
        self.execute(&command, "Failed to attach policy").map(drop)
    }

    fn detach_policy(&self, policy: &str, access_key: &str) -> Result<()> {
        let command = McCommand::PolicyDetach {
            policy: policy.to_string(),
            user: access_key.to_string(),
        };
        self.execute(&command, "Failed to detach policy").map(drop)
    }

    fn bucket_exists(&self, name: &str) -> Result<bool> {
        let stdout = self.execute(&McCommand::BucketList, "Failed to list buckets")?;
        for value in json_lines(&stdout, "bucket list")? {
            if !is_success(&value) || value.get("key").is_none() {
                continue;
            }
            let line: LsLine = from_value(value, "bucket list")?;
            if line.key.trim_end_matches('/') == name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn make_bucket(&self, name: &str) -> Result<()> {
        let command = McCommand::MakeBucket {
            name: name.to_string(),
        };
        self.execute(&command, "Failed to create bucket").map(drop)
    }

    fn remove_bucket(&self, name: &str) -> Result<()> {
        let command = McCommand::RemoveBucket {
            name: name.to_string(),
        };
        self.execute(&command, "Failed to remove bucket").map(drop)
    }
}
