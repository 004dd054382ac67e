//! Policy reconciliation against the in-memory server.

mod common;

use common::{Call, FakeAdmin};
use minio_reconcile::{
    DesiredPolicy, Effect, PolicyContent, PolicyReconciler, ReconcileError, ReconcileOptions,
    State, Statement,
};
use serde_json::json;

fn full_access_statements() -> PolicyContent {
    PolicyContent::Statements(vec![Statement::new(
        Effect::Allow,
        ["s3:*"],
        ["arn:aws:s3:::*"],
    )])
}

#[test]
fn test_empty_statements_match_hand_written_document() {
    let server =
        FakeAdmin::new().with_policy("fullaccess", json!({"Version": "2012-10-17", "Statement": []}));
    let desired = DesiredPolicy::present("fullaccess", PolicyContent::Statements(vec![]));

    let outcome = PolicyReconciler::new(&server, ReconcileOptions::default())
        .reconcile(&desired)
        .unwrap();

    assert!(!outcome.changed);
    assert!(server.mutating_calls().is_empty());
}

#[test]
fn test_statements_match_document_with_different_key_order() {
    let server = FakeAdmin::new().with_policy(
        "fullaccess",
        json!({
            "Statement": [{"Resource": ["arn:aws:s3:::*"], "Action": ["s3:*"], "Effect": "Allow"}],
            "Version": "2012-10-17"
        }),
    );
    let desired = DesiredPolicy::present("fullaccess", full_access_statements());

    let outcome = PolicyReconciler::new(&server, ReconcileOptions::default())
        .reconcile(&desired)
        .unwrap();
    assert!(!outcome.changed);
}

#[test]
fn test_missing_policy_is_added_from_staged_file() {
    let server = FakeAdmin::new();
    let desired = DesiredPolicy::present("fullaccess", full_access_statements());

    let outcome = PolicyReconciler::new(&server, ReconcileOptions::default())
        .reconcile(&desired)
        .unwrap();

    assert!(outcome.changed);
    match server.mutating_calls().as_slice() {
        [Call::AddPolicy { name, document }] => {
            assert_eq!(name, "fullaccess");
            assert_eq!(document["Version"], "2012-10-17");
            assert_eq!(document["Statement"][0]["Action"], json!(["s3:*"]));
        }
        other => panic!("expected one AddPolicy, got {other:?}"),
    }

    // The scratch file is gone once the reconcile call returns.
    let staged = server.staged_files.borrow();
    assert_eq!(staged.len(), 1);
    assert!(!staged[0].exists());
}

#[test]
fn test_failed_add_still_removes_staged_file() {
    let server = FakeAdmin::new().failing_when(|call| matches!(call, Call::AddPolicy { .. }));
    let desired = DesiredPolicy::present("fullaccess", full_access_statements());

    let err = PolicyReconciler::new(&server, ReconcileOptions::default())
        .reconcile(&desired)
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Command { .. }));
    assert!(!server.policies.borrow().contains_key("fullaccess"));

    let staged = server.staged_files.borrow();
    assert_eq!(staged.len(), 1);
    assert!(!staged[0].exists());
}

#[test]
fn test_different_document_is_replaced() {
    let server = FakeAdmin::new().with_policy(
        "readonly",
        json!({"Version": "2012-10-17", "Statement": [
            {"Effect": "Allow", "Action": ["s3:GetObject"], "Resource": ["arn:aws:s3:::old/*"]}
        ]}),
    );
    let desired = DesiredPolicy::present(
        "readonly",
        PolicyContent::Statements(vec![Statement::new(
            Effect::Allow,
            ["s3:GetObject"],
            ["arn:aws:s3:::new/*"],
        )]),
    );
    let reconciler = PolicyReconciler::new(&server, ReconcileOptions::default());

    assert!(reconciler.reconcile(&desired).unwrap().changed);
    server.clear_calls();
    assert!(!reconciler.reconcile(&desired).unwrap().changed);
    assert!(server.mutating_calls().is_empty());
}

#[test]
fn test_raw_document_is_compared_canonically() {
    let server = FakeAdmin::new().with_policy("raw", json!({"b": 1, "a": {"y": 2, "x": 1}}));
    let content = PolicyContent::from_json(r#"{"a": {"x": 1, "y": 2}, "b": 1}"#).unwrap();
    let outcome = PolicyReconciler::new(&server, ReconcileOptions::default())
        .reconcile(&DesiredPolicy::present("raw", content))
        .unwrap();
    assert!(!outcome.changed);
}

#[test]
fn test_absent_removes_and_absent_on_absent_is_a_no_op() {
    let server = FakeAdmin::new().with_policy("old", json!({"Version": "2012-10-17", "Statement": []}));
    let reconciler = PolicyReconciler::new(&server, ReconcileOptions::default());

    assert!(reconciler.reconcile(&DesiredPolicy::absent("old")).unwrap().changed);
    assert_eq!(server.mutating_calls(), vec![Call::RemovePolicy("old".into())]);

    server.clear_calls();
    assert!(!reconciler.reconcile(&DesiredPolicy::absent("old")).unwrap().changed);
    assert!(server.mutating_calls().is_empty());
}

#[test]
fn test_check_mode_stages_nothing() {
    let server = FakeAdmin::new();
    let outcome = PolicyReconciler::new(&server, ReconcileOptions::check())
        .reconcile(&DesiredPolicy::present("fullaccess", full_access_statements()))
        .unwrap();

    assert!(outcome.changed);
    assert!(server.mutating_calls().is_empty());
    assert!(server.staged_files.borrow().is_empty());
}

#[test]
fn test_exclusive_content_fails_before_any_call() {
    let server = FakeAdmin::new();
    let result = DesiredPolicy::new(
        "fullaccess",
        Some(PolicyContent::Document(json!({}))),
        Some(full_access_statements()),
        State::Present,
    );

    assert!(result.unwrap_err().is_config());
    assert!(server.calls().is_empty());
}
