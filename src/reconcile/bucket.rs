//! Bucket reconciliation: existence only.
//!
//! `absent` removes the bucket. The server refuses to remove a bucket that
//! still holds objects, and that refusal is surfaced as a command error.

use super::{Outcome, ReconcileOptions};
use crate::client::AdminClient;
use crate::desired::DesiredBucket;
use crate::error::Result;
use crate::types::State;
use tracing::debug;

pub struct BucketReconciler<'a, C: AdminClient + ?Sized> {
    client: &'a C,
    options: ReconcileOptions,
}

impl<'a, C: AdminClient + ?Sized> BucketReconciler<'a, C> {
    pub fn new(client: &'a C, options: ReconcileOptions) -> Self {
        Self { client, options }
    }

    pub fn reconcile(&self, desired: &DesiredBucket) -> Result<Outcome> {
        let exists = self.client.bucket_exists(&desired.name)?;

        match (exists, desired.state) {
            (false, State::Present) => {
                debug!("bucket '{}' not found, creating", desired.name);
                if !self.options.check_mode {
                    self.client.make_bucket(&desired.name)?;
                }
                Ok(Outcome::CHANGED)
            }
            (true, State::Absent) => {
                debug!("bucket '{}' exists, removing", desired.name);
                if !self.options.check_mode {
                    self.client.remove_bucket(&desired.name)?;
                }
                Ok(Outcome::CHANGED)
            }
            (true, State::Present) | (false, State::Absent) => Ok(Outcome::UNCHANGED),
        }
    }
}
