//! Policy reconciliation.
//!
//! The server treats add as an upsert, so both "missing" and "different" are
//! fixed by the same staged add. Documents are compared in canonical form.

use super::{Outcome, ReconcileOptions};
use crate::client::AdminClient;
use crate::desired::DesiredPolicy;
use crate::error::Result;
use crate::policy::{StagedPolicy, documents_match};
use serde_json::Value;
use tracing::debug;

pub struct PolicyReconciler<'a, C: AdminClient + ?Sized> {
    client: &'a C,
    options: ReconcileOptions,
}

impl<'a, C: AdminClient + ?Sized> PolicyReconciler<'a, C> {
    pub fn new(client: &'a C, options: ReconcileOptions) -> Self {
        Self { client, options }
    }

    pub fn reconcile(&self, desired: &DesiredPolicy) -> Result<Outcome> {
        let policies = self.client.list_policies()?;
        let current = policies.get(&desired.name);

        // Document is set exactly when the policy should be present.
        let Some(document) = &desired.document else {
            if current.is_none() {
                return Ok(Outcome::UNCHANGED);
            }
            debug!("policy '{}' exists, removing", desired.name);
            if !self.options.check_mode {
                self.client.remove_policy(&desired.name)?;
            }
            return Ok(Outcome::CHANGED);
        };

        match current {
            Some(existing) if documents_match(existing, document) => {
                return Ok(Outcome::UNCHANGED);
            }
            Some(_) => debug!("policy '{}' differs, replacing", desired.name),
            None => debug!("policy '{}' not found, adding", desired.name),
        }

        if !self.options.check_mode {
            self.add(&desired.name, document)?;
        }
        Ok(Outcome::CHANGED)
    }

    fn add(&self, name: &str, document: &Value) -> Result<()> {
        let staged = StagedPolicy::write(document)?;
        self.client.add_policy(name, staged.path())
    }
}
