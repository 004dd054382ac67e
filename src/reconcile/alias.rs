//! Alias reconciliation.
//!
//! Aliases have no partial update: any difference in url or keys is fixed by
//! overwriting the whole alias.

use super::{Outcome, ReconcileOptions};
use crate::client::{AdminClient, AliasRecord};
use crate::desired::{AliasTarget, DesiredAlias};
use crate::error::Result;
use tracing::debug;

pub struct AliasReconciler<'a, C: AdminClient + ?Sized> {
    client: &'a C,
    options: ReconcileOptions,
}

impl<'a, C: AdminClient + ?Sized> AliasReconciler<'a, C> {
    pub fn new(client: &'a C, options: ReconcileOptions) -> Self {
        Self { client, options }
    }

    pub fn reconcile(&self, desired: &DesiredAlias) -> Result<Outcome> {
        // `mc` has no get-by-name for aliases.
        let current = self
            .client
            .list_aliases()?
            .into_iter()
            .find(|alias| alias.name == desired.name);

        // Target is set exactly when the alias should be present.
        let Some(target) = &desired.target else {
            if current.is_none() {
                return Ok(Outcome::UNCHANGED);
            }
            debug!("alias '{}' exists, removing", desired.name);
            if !self.options.check_mode {
                self.client.remove_alias(&desired.name)?;
            }
            return Ok(Outcome::CHANGED);
        };

        let failure = match &current {
            Some(record) if !needs_update(record, target) => return Ok(Outcome::UNCHANGED),
            Some(_) => {
                debug!("alias '{}' differs, overwriting", desired.name);
                "Failed to update alias"
            }
            None => {
                debug!("alias '{}' not found, creating", desired.name);
                "Failed to add alias"
            }
        };

        if !self.options.check_mode {
            self.client
                .set_alias(
                    &desired.name,
                    &target.url,
                    &target.access_key,
                    &target.secret_key,
                )
                .map_err(|e| e.with_message(failure))?;
        }
        Ok(Outcome::CHANGED)
    }
}

/// Field-for-field exact comparison of url and both keys.
fn needs_update(record: &AliasRecord, target: &AliasTarget) -> bool {
    record.url != target.url
        || record.access_key != target.access_key
        || record.secret_key != target.secret_key
}
