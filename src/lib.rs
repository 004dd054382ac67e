//! minio-reconcile Library
//!
//! Declarative reconciliation of MinIO aliases, buckets, policies and users.
//! Every operation goes through the MinIO client (`mc`) behind the
//! [`AdminClient`] trait.

pub mod cli;
pub mod client;
pub mod command_runner;
pub mod config_file;
pub mod desired;
pub mod error;
pub mod policy;
pub mod reconcile;
pub mod report;
pub mod types;

// Re-export main types for convenience
pub use client::{AdminClient, AliasRecord, Connection, McClient, UserRecord};
pub use command_runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
pub use config_file::{BatchConfig, Resource};
pub use desired::{AliasTarget, DesiredAlias, DesiredBucket, DesiredPolicy, DesiredUser, PolicyContent};
pub use error::{ReconcileError, Result};
pub use policy::{Statement, StagedPolicy, build_document, canonicalize, documents_match};
pub use reconcile::{
    AliasReconciler, BucketReconciler, Outcome, PolicyReconciler, ReconcileOptions,
    ResourceOutcome, UserReconciler, reconcile_all, reconcile_resource,
};
pub use report::{FailureReport, Report};
pub use types::{Effect, Secret, State, UserState, UserStatus};
