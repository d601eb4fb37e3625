//! Parameter Resolution Tests
//!
//! Tests for operand collection through running contexts:
//! - LIFO order across resolved and pending entries
//! - Sentinel substitution for absent results
//! - Store errors absorbed as data
//! - Non-store failures aborting the instruction

use crate::common::*;
use proptest::prelude::*;
use stackmachine::{resolve_parameters, StackError, Value, ValueStack};

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn params_come_back_in_pop_order() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![
            set("a", "1"),
            Op::Push(Value::Int(10)),
            get("a"),
            Op::Push(Value::from("s")),
            get("b"),
            Op::Collect(4),
        ],
    )]);
    machine.run("root");

    assert_eq!(
        machine.journal.params_for("root"),
        vec![vec![not_present(), Value::from("s"), bytes(b"1"), Value::Int(10)]]
    );
}

#[test]
fn consecutive_collections_consume_the_stack() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![
            Op::Push(Value::Int(1)),
            Op::Push(Value::Int(2)),
            Op::Push(Value::Int(3)),
            Op::Collect(1),
            Op::Collect(2),
        ],
    )]);
    machine.run("root");

    assert_eq!(
        machine.journal.params_for("root"),
        vec![vec![Value::Int(3)], vec![Value::Int(2), Value::Int(1)]]
    );
}

#[test]
fn root_context_collects_params_inside_async_driver() {
    let machine = ScriptedMachine::new(vec![
        (
            "root",
            vec![
                set("a", "1"),
                Op::Push(Value::Int(1)),
                get("a"),
                Op::Collect(2),
                fork("child"),
                Op::Mark("after"),
            ],
        ),
        ("child", vec![Op::Push(Value::Int(2)), Op::Collect(1)]),
    ]);
    machine.runtime.block_on(async { machine.run("root") });

    assert!(machine.journal.errors.lock().is_empty());
    assert_eq!(
        machine.journal.params_for("root"),
        vec![vec![bytes(b"1"), Value::Int(1)]]
    );
    assert_eq!(machine.journal.params_for("child"), vec![vec![Value::Int(2)]]);
    assert!(machine.journal.has_mark("root", "after"));
}

#[test]
fn current_thread_driver_fails_collection_with_typed_error() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![Op::Push(Value::Int(1)), Op::Collect(1), Op::Mark("after")],
    )]);
    let driver = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    driver.block_on(async { machine.run("root") });

    let errors = machine.journal.errors.lock().clone();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.contains("current-thread runtime"));
    assert!(!machine.journal.has_mark("root", "after"));
}

// ============================================================================
// Sentinel & Error Absorption
// ============================================================================

#[test]
fn resolved_nil_is_reported_as_sentinel() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![Op::Push(Value::Nil), Op::Commit, Op::Collect(2)],
    )]);
    machine.run("root");

    assert_eq!(
        machine.journal.params_for("root"),
        vec![vec![not_present(), not_present()]]
    );
}

#[test]
fn store_error_becomes_error_bytes() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![Op::GetFailing(b"k".to_vec(), 1007), Op::Collect(1)],
    )]);
    machine.run("root");

    assert_eq!(machine.journal.params_for("root"), vec![vec![error_bytes(1007)]]);
    assert!(machine.journal.errors.lock().is_empty());
}

#[test]
fn store_error_keeps_its_position() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![
            Op::Push(Value::Int(1)),
            Op::GetFailing(b"k".to_vec(), 1020),
            Op::Push(Value::Int(3)),
            Op::Collect(3),
            Op::Mark("continued"),
        ],
    )]);
    machine.run("root");

    assert_eq!(
        machine.journal.params_for("root"),
        vec![vec![Value::Int(3), error_bytes(1020), Value::Int(1)]]
    );
    assert!(machine.journal.has_mark("root", "continued"));
}

#[test]
fn non_store_failure_aborts_instruction() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![
            Op::Push(Value::Int(1)),
            Op::PushBroken("disk on fire".to_string()),
            Op::Collect(2),
            Op::Mark("unreachable"),
        ],
    )]);
    machine.run("root");

    assert!(machine.journal.params_for("root").is_empty());
    assert!(!machine.journal.has_mark("root", "unreachable"));
    let errors = machine.journal.errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.contains("disk on fire"));
}

#[test]
fn underflow_aborts_instruction() {
    let machine = ScriptedMachine::new(vec![(
        "root",
        vec![Op::Push(Value::Int(1)), Op::Collect(2), Op::Mark("unreachable")],
    )]);
    machine.run("root");

    assert!(!machine.journal.has_mark("root", "unreachable"));
    assert!(machine.journal.errors.lock()[0].1.contains("stack underflow"));
}

#[test]
fn wrapped_non_store_failure_is_returned_unchanged() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut stack = ValueStack::new();
    stack.push_pending(0, async {
        Err(StackError::InvalidArgument("bad".to_string()).wrap("outer"))
    });

    let err = runtime
        .block_on(resolve_parameters(&mut stack, 1))
        .unwrap_err();
    match err {
        StackError::Wrapped { context, .. } => assert_eq!(context, "outer"),
        other => panic!("Wrong error variant: {:?}", other),
    }
}

// ============================================================================
// Property: LIFO regardless of pending/resolved mix
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_resolution_is_lifo(entries in proptest::collection::vec((any::<i64>(), any::<bool>()), 0..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let mut stack = ValueStack::new();
        for (index, (value, pending)) in entries.iter().copied().enumerate() {
            if pending {
                stack.push_pending(index, async move {
                    tokio::task::yield_now().await;
                    Ok(Value::Int(value))
                });
            } else {
                stack.push_value(index, Value::Int(value));
            }
        }

        let params = runtime.block_on(resolve_parameters(&mut stack, entries.len())).unwrap();
        let expected: Vec<Value> = entries.iter().rev().map(|(v, _)| Value::Int(*v)).collect();
        prop_assert_eq!(params, expected);
        prop_assert!(stack.is_empty());
    }
}
