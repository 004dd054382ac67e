//! User reconciliation.
//!
//! A user converges along three independent dimensions, always in this
//! order:
//!
//! 1. **Credential**: create the user, or re-issue the secret when forced.
//! 2. **Policy**: detach extra policies, then attach the wanted one.
//! 3. **Status**: enable or disable the account.
//!
//! Re-issuing a secret re-enables a disabled account on the server, so status
//! must come last to have the final word. Every step runs even when an
//! earlier one changed something, and the record is re-read from the server
//! after each mutation rather than patched locally.

use super::{Outcome, ReconcileOptions};
use crate::client::{AdminClient, UserRecord};
use crate::desired::DesiredUser;
use crate::error::{ReconcileError, Result};
use crate::types::UserStatus;
use tracing::debug;

/// Convergence steps in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Credential,
    Policy,
    Status,
}

const STEPS: [Step; 3] = [Step::Credential, Step::Policy, Step::Status];

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Convergence {
    Unchanged,
    Changed,
    /// Check mode found a needed mutation; the run stops here.
    WouldChange,
}

pub struct UserReconciler<'a, C: AdminClient + ?Sized> {
    client: &'a C,
    options: ReconcileOptions,
}

impl<'a, C: AdminClient + ?Sized> UserReconciler<'a, C> {
    pub fn new(client: &'a C, options: ReconcileOptions) -> Self {
        Self { client, options }
    }

    pub fn reconcile(&self, desired: &DesiredUser) -> Result<Outcome> {
        let user = self.client.list_users()?.remove(&desired.access_key);

        if !desired.state.is_present() {
            if user.is_none() {
                return Ok(Outcome::UNCHANGED);
            }
            debug!("user '{}' exists, removing", desired.access_key);
            if !self.options.check_mode {
                self.client.remove_user(&desired.access_key)?;
            }
            return Ok(Outcome::CHANGED);
        }

        let mut session = UserSession {
            client: self.client,
            check_mode: self.options.check_mode,
            access_key: &desired.access_key,
            user,
        };

        let mut changed = false;
        for step in STEPS {
            match session.converge(step, desired)? {
                Convergence::Unchanged => {}
                Convergence::Changed => changed = true,
                Convergence::WouldChange => return Ok(Outcome::CHANGED),
            }
        }
        Ok(Outcome::from_changed(changed))
    }
}

/// Live knowledge of one user during a reconciliation run.
struct UserSession<'a, C: AdminClient + ?Sized> {
    client: &'a C,
    check_mode: bool,
    access_key: &'a str,
    /// Last record read from the server; `None` until the user exists.
    user: Option<UserRecord>,
}

impl<C: AdminClient + ?Sized> UserSession<'_, C> {
    fn converge(&mut self, step: Step, desired: &DesiredUser) -> Result<Convergence> {
        match step {
            Step::Credential => self.converge_credential(desired),
            Step::Policy => self.converge_policy(desired),
            Step::Status => self.converge_status(desired),
        }
    }

    /// Run `op` unless in check mode, then refresh the record.
    fn apply<F>(&mut self, action: &str, op: F) -> Result<Convergence>
    where
        F: FnOnce(&C) -> Result<()>,
    {
        if self.check_mode {
            debug!("user '{}': would {}", self.access_key, action);
            return Ok(Convergence::WouldChange);
        }
        debug!("user '{}': {}", self.access_key, action);
        op(self.client)?;
        self.user = Some(self.client.user_info(self.access_key)?);
        Ok(Convergence::Changed)
    }

    fn converge_credential(&mut self, desired: &DesiredUser) -> Result<Convergence> {
        let access_key = self.access_key;
        let exists = self.user.is_some();
        match (exists, &desired.secret_key) {
            (false, Some(secret)) => self.apply("create", |c| c.add_user(access_key, secret)),
            (false, None) => Err(ReconcileError::config(format!(
                "cannot create user '{access_key}' without a secret_key"
            ))),
            (true, Some(secret)) if desired.force => {
                self.apply("rotate secret", |c| c.add_user(access_key, secret))
            }
            (true, _) => Ok(Convergence::Unchanged),
        }
    }

    /// Attach is additive on the server, so replacing a policy means detaching
    /// every other attached policy, one call each, then attaching the wanted
    /// one if it is still missing.
    fn converge_policy(&mut self, desired: &DesiredUser) -> Result<Convergence> {
        let access_key = self.access_key;
        let wanted = desired.policy.as_deref();
        let attached: Vec<String> = self
            .user
            .as_ref()
            .map(|u| u.policies.iter().cloned().collect())
            .unwrap_or_default();

        let mut result = Convergence::Unchanged;
        for policy in attached.iter().filter(|p| Some(p.as_str()) != wanted) {
            match self.apply("detach policy", |c| c.detach_policy(policy, access_key))? {
                Convergence::WouldChange => return Ok(Convergence::WouldChange),
                step => result = result.max(step),
            }
        }

        let Some(wanted) = wanted else {
            return Ok(result);
        };
        let has_wanted = self
            .user
            .as_ref()
            .is_some_and(|u| u.policies.contains(wanted));
        if has_wanted {
            return Ok(result);
        }
        self.apply("attach policy", |c| c.attach_policy(wanted, access_key))
            .map(|step| result.max(step))
    }

    fn converge_status(&mut self, desired: &DesiredUser) -> Result<Convergence> {
        let Some(target) = desired.state.target_status() else {
            return Ok(Convergence::Unchanged);
        };
        let access_key = self.access_key;

        if self.user.as_ref().map(|u| u.status) == Some(target) {
            return Ok(Convergence::Unchanged);
        }
        match target {
            UserStatus::Enabled => self.apply("enable", |c| c.enable_user(access_key)),
            UserStatus::Disabled => self.apply("disable", |c| c.disable_user(access_key)),
        }
    }
}
