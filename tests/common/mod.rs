//! In-memory MinIO server used by the integration tests.
//!
//! `FakeAdmin` implements `AdminClient` over plain maps, records every call
//! it receives and can be told to fail a chosen call.

#![allow(dead_code)]

use minio_reconcile::{AdminClient, AliasRecord, ReconcileError, Result, Secret, UserRecord, UserStatus};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// One call received by the fake, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListAliases,
    SetAlias {
        name: String,
        url: String,
        access_key: String,
        secret_key: String,
    },
    RemoveAlias(String),
    ListPolicies,
    AddPolicy {
        name: String,
        document: Value,
    },
    RemovePolicy(String),
    ListUsers,
    AddUser {
        access_key: String,
        secret_key: String,
    },
    UserInfo(String),
    EnableUser(String),
    DisableUser(String),
    RemoveUser(String),
    AttachPolicy {
        policy: String,
        access_key: String,
    },
    DetachPolicy {
        policy: String,
        access_key: String,
    },
    BucketExists(String),
    MakeBucket(String),
    RemoveBucket(String),
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Call::ListAliases
                | Call::ListPolicies
                | Call::ListUsers
                | Call::UserInfo(_)
                | Call::BucketExists(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeUser {
    pub secret_key: String,
    pub policies: BTreeSet<String>,
    pub status: UserStatus,
}

impl FakeUser {
    /// Attached policies in name order.
    pub fn policy_names(&self) -> Vec<&str> {
        self.policies.iter().map(String::as_str).collect()
    }
}

type FailWhen = Box<dyn Fn(&Call) -> bool>;

#[derive(Default)]
pub struct FakeAdmin {
    pub aliases: RefCell<BTreeMap<String, AliasRecord>>,
    pub policies: RefCell<BTreeMap<String, Value>>,
    pub users: RefCell<BTreeMap<String, FakeUser>>,
    pub buckets: RefCell<BTreeSet<String>>,
    /// Paths of policy files handed to `add_policy`.
    pub staged_files: RefCell<Vec<PathBuf>>,
    calls: RefCell<Vec<Call>>,
    fail_when: Option<FailWhen>,
}

impl FakeAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(self, name: &str, url: &str, access_key: &str, secret_key: &str) -> Self {
        self.aliases.borrow_mut().insert(
            name.to_string(),
            AliasRecord {
                name: name.to_string(),
                url: url.to_string(),
                access_key: access_key.to_string(),
                secret_key: Secret::new(secret_key),
            },
        );
        self
    }

    pub fn with_policy(self, name: &str, document: Value) -> Self {
        self.policies.borrow_mut().insert(name.to_string(), document);
        self
    }

    pub fn with_user(
        self,
        access_key: &str,
        secret_key: &str,
        policies: &[&str],
        status: UserStatus,
    ) -> Self {
        self.users.borrow_mut().insert(
            access_key.to_string(),
            FakeUser {
                secret_key: secret_key.to_string(),
                policies: policies.iter().map(|p| p.to_string()).collect(),
                status,
            },
        );
        self
    }

    pub fn with_bucket(self, name: &str) -> Self {
        self.buckets.borrow_mut().insert(name.to_string());
        self
    }

    /// Fail the first and every later call matching `predicate`.
    pub fn failing_when(mut self, predicate: impl Fn(&Call) -> bool + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn user(&self, access_key: &str) -> Option<FakeUser> {
        self.users.borrow().get(access_key).cloned()
    }

    fn record(&self, call: Call) -> Result<()> {
        let fails = self.fail_when.as_ref().is_some_and(|f| f(&call));
        self.calls.borrow_mut().push(call.clone());
        if fails {
            return Err(ReconcileError::command(
                format!("injected failure: {call:?}"),
                "mc --json (fake)",
                "",
                "mc: <ERROR> injected",
                Some(1),
            ));
        }
        Ok(())
    }

    fn missing(what: &str, name: &str) -> ReconcileError {
        ReconcileError::command(
            format!("{what} '{name}' does not exist"),
            "mc --json (fake)",
            "",
            "mc: <ERROR> not found",
            Some(1),
        )
    }

    fn record_of(access_key: &str, user: &FakeUser) -> UserRecord {
        UserRecord {
            access_key: access_key.to_string(),
            policies: user.policies.clone(),
            status: user.status,
        }
    }
}

impl AdminClient for FakeAdmin {
    fn list_aliases(&self) -> Result<Vec<AliasRecord>> {
        self.record(Call::ListAliases)?;
        Ok(self.aliases.borrow().values().cloned().collect())
    }

    fn set_alias(&self, name: &str, url: &str, access_key: &str, secret_key: &Secret) -> Result<()> {
        self.record(Call::SetAlias {
            name: name.to_string(),
            url: url.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.expose().to_string(),
        })?;
        self.aliases.borrow_mut().insert(
            name.to_string(),
            AliasRecord {
                name: name.to_string(),
                url: url.to_string(),
                access_key: access_key.to_string(),
                secret_key: secret_key.clone(),
            },
        );
        Ok(())
    }

    fn remove_alias(&self, name: &str) -> Result<()> {
        self.record(Call::RemoveAlias(name.to_string()))?;
        self.aliases
            .borrow_mut()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::missing("alias", name))
    }

    fn list_policies(&self) -> Result<BTreeMap<String, Value>> {
        self.record(Call::ListPolicies)?;
        Ok(self.policies.borrow().clone())
    }

    fn add_policy(&self, name: &str, file: &Path) -> Result<()> {
        let document: Value = serde_json::from_str(&fs::read_to_string(file)?)?;
        self.staged_files.borrow_mut().push(file.to_path_buf());
        self.record(Call::AddPolicy {
            name: name.to_string(),
            document: document.clone(),
        })?;
        self.policies.borrow_mut().insert(name.to_string(), document);
        Ok(())
    }

    fn remove_policy(&self, name: &str) -> Result<()> {
        self.record(Call::RemovePolicy(name.to_string()))?;
        self.policies
            .borrow_mut()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::missing("policy", name))
    }

    fn list_users(&self) -> Result<BTreeMap<String, UserRecord>> {
        self.record(Call::ListUsers)?;
        Ok(self
            .users
            .borrow()
            .iter()
            .map(|(key, user)| (key.clone(), Self::record_of(key, user)))
            .collect())
    }

    /// Like the real server, re-adding an existing user re-enables it.
    fn add_user(&self, access_key: &str, secret_key: &Secret) -> Result<()> {
        self.record(Call::AddUser {
            access_key: access_key.to_string(),
            secret_key: secret_key.expose().to_string(),
        })?;
        let mut users = self.users.borrow_mut();
        let user = users.entry(access_key.to_string()).or_insert(FakeUser {
            secret_key: String::new(),
            policies: BTreeSet::new(),
            status: UserStatus::Enabled,
        });
        user.secret_key = secret_key.expose().to_string();
        user.status = UserStatus::Enabled;
        Ok(())
    }

    fn user_info(&self, access_key: &str) -> Result<UserRecord> {
        self.record(Call::UserInfo(access_key.to_string()))?;
        self.users
            .borrow()
            .get(access_key)
            .map(|user| Self::record_of(access_key, user))
            .ok_or_else(|| Self::missing("user", access_key))
    }

    fn enable_user(&self, access_key: &str) -> Result<()> {
        self.record(Call::EnableUser(access_key.to_string()))?;
        let mut users = self.users.borrow_mut();
        let user = users
            .get_mut(access_key)
            .ok_or_else(|| Self::missing("user", access_key))?;
        user.status = UserStatus::Enabled;
        Ok(())
    }

    fn disable_user(&self, access_key: &str) -> Result<()> {
        self.record(Call::DisableUser(access_key.to_string()))?;
        let mut users = self.users.borrow_mut();
        let user = users
            .get_mut(access_key)
            .ok_or_else(|| Self::missing("user", access_key))?;
        user.status = UserStatus::Disabled;
        Ok(())
    }

    fn remove_user(&self, access_key: &str) -> Result<()> {
        self.record(Call::RemoveUser(access_key.to_string()))?;
        self.users
            .borrow_mut()
            .remove(access_key)
            .map(|_| ())
            .ok_or_else(|| Self::missing("user", access_key))
    }

    fn attach_policy(&self, policy: &str, access_key: &str) -> Result<()> {
        self.record(Call::AttachPolicy {
            policy: policy.to_string(),
            access_key: access_key.to_string(),
        })?;
        if !self.policies.borrow().contains_key(policy) {
            return Err(Self::missing("policy", policy));
        }
        let mut users = self.users.borrow_mut();
        let user = users
            .get_mut(access_key)
            .ok_or_else(|| Self::missing("user", access_key))?;
        // Attach adds to the set, and attaching twice is refused.
        if !user.policies.insert(policy.to_string()) {
            return Err(ReconcileError::command(
                format!("policy '{policy}' is already attached"),
                "mc --json (fake)",
                "",
                "mc: <ERROR> policy change already in effect",
                Some(1),
            ));
        }
        Ok(())
    }

    fn detach_policy(&self, policy: &str, access_key: &str) -> Result<()> {
        self.record(Call::DetachPolicy {
            policy: policy.to_string(),
            access_key: access_key.to_string(),
        })?;
        let mut users = self.users.borrow_mut();
        let user = users
            .get_mut(access_key)
            .ok_or_else(|| Self::missing("user", access_key))?;
        if user.policies.remove(policy) {
            Ok(())
        } else {
            Err(Self::missing("policy mapping", policy))
        }
    }

    fn bucket_exists(&self, name: &str) -> Result<bool> {
        self.record(Call::BucketExists(name.to_string()))?;
        Ok(self.buckets.borrow().contains(name))
    }

    fn make_bucket(&self, name: &str) -> Result<()> {
        self.record(Call::MakeBucket(name.to_string()))?;
        self.buckets.borrow_mut().insert(name.to_string());
        Ok(())
    }

    fn remove_bucket(&self, name: &str) -> Result<()> {
        self.record(Call::RemoveBucket(name.to_string()))?;
        if self.buckets.borrow_mut().remove(name) {
            Ok(())
        } else {
            Err(Self::missing("bucket", name))
        }
    }
}
