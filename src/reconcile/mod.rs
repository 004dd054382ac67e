//! Reconcilers: compare desired state with what the server reports and issue
//! the minimal set of calls to converge.
//!
//! Every reconciler follows the same rules:
//!
//! - It re-reads live state on each run; nothing is cached between runs.
//! - In check mode it issues no mutating call and reports what *would* change.
//! - The first failing call aborts the run. Earlier mutations are not rolled
//!   back; running again converges from wherever the server was left.

pub mod alias;
pub mod bucket;
pub mod policy;
pub mod user;

use crate::client::AdminClient;
use crate::config_file::Resource;
use crate::error::Result;
use serde::Serialize;
use tracing::info;

pub use alias::AliasReconciler;
pub use bucket::BucketReconciler;
pub use policy::PolicyReconciler;
pub use user::UserReconciler;

/// Options shared by every reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Predict the outcome without issuing mutating calls.
    pub check_mode: bool,
}

impl ReconcileOptions {
    pub fn check() -> Self {
        Self { check_mode: true }
    }
}

/// Result of one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub changed: bool,
}

impl Outcome {
    pub const CHANGED: Outcome = Outcome { changed: true };
    pub const UNCHANGED: Outcome = Outcome { changed: false };

    pub fn from_changed(changed: bool) -> Self {
        Self { changed }
    }
}

/// Outcome of one resource in a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    pub kind: &'static str,
    pub name: String,
    pub changed: bool,
}

/// Reconcile a single resource of any kind.
pub fn reconcile_resource<C: AdminClient + ?Sized>(
    client: &C,
    options: ReconcileOptions,
    resource: &Resource,
) -> Result<Outcome> {
    match resource {
        Resource::Alias(desired) => AliasReconciler::new(client, options).reconcile(desired),
        Resource::Bucket(desired) => BucketReconciler::new(client, options).reconcile(desired),
        Resource::Policy(desired) => PolicyReconciler::new(client, options).reconcile(desired),
        Resource::User(desired) => UserReconciler::new(client, options).reconcile(desired),
    }
}

/// Reconcile resources in order, stopping at the first failure.
pub fn reconcile_all<C: AdminClient + ?Sized>(
    client: &C,
    options: ReconcileOptions,
    resources: &[Resource],
) -> Result<Vec<ResourceOutcome>> {
    let mut outcomes = Vec::with_capacity(resources.len());
    for resource in resources {
        let outcome = reconcile_resource(client, options, resource)?;
        info!(
            "{} '{}': {}",
            resource.kind(),
            resource.name(),
            if outcome.changed { "changed" } else { "ok" }
        );
        outcomes.push(ResourceOutcome {
            kind: resource.kind(),
            name: resource.name().to_string(),
            changed: outcome.changed,
        });
    }
    Ok(outcomes)
}
