//! Shared test utilities for the integration test suites.
//!
//! Provides a tiny scripted instruction set so tests can describe what each
//! context does as a list of [`Op`]s keyed by prefix.

#![allow(dead_code)]

use parking_lot::Mutex;
use stackmachine::{
    Context, Harness, InstructionSet, MemoryDatabase, MemoryTransaction, Result, StackError, StackItem,
    StackMachineConfig, StoreError, Value,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// One scripted instruction
#[derive(Clone, Debug)]
pub enum Op {
    /// Push a resolved value
    Push(Value),
    /// Push a pending read of `key` from the current transaction
    Get(Vec<u8>),
    /// Push a pending read that fails with store error `code`
    GetFailing(Vec<u8>, i32),
    /// Push a pending result failing with a non-store error
    PushBroken(String),
    /// Buffer a write in the current transaction
    Set(Vec<u8>, Vec<u8>),
    /// Push a pending commit of the current transaction
    Commit,
    /// Replace the current transaction
    NewTransaction,
    /// Switch to another transaction name
    Switch(Vec<u8>),
    /// Fork a context
    Fork(Vec<u8>),
    /// Pop operands and record them under the context's prefix
    Collect(usize),
    /// Sleep for the given number of milliseconds
    Sleep(u64),
    /// Record a marker under the context's prefix
    Mark(&'static str),
    /// Fail the instruction loop
    Fail(&'static str),
    /// Panic inside the instruction loop
    Panic(&'static str),
}

/// Everything a scripted machine observed
#[derive(Default)]
pub struct Journal {
    pub params: Mutex<Vec<(String, Vec<Value>)>>,
    pub marks: Mutex<Vec<(String, &'static str)>>,
    pub errors: Mutex<Vec<(String, String)>>,
}

impl Journal {
    pub fn params_for(&self, prefix: &str) -> Vec<Vec<Value>> {
        self.params
            .lock()
            .iter()
            .filter(|(p, _)| p == prefix)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn marks(&self) -> Vec<(String, &'static str)> {
        self.marks.lock().clone()
    }

    pub fn has_mark(&self, prefix: &str, mark: &str) -> bool {
        self.marks.lock().iter().any(|(p, m)| p == prefix && *m == mark)
    }
}

struct Script {
    ops: Vec<Op>,
    journal: Arc<Journal>,
}

impl InstructionSet<MemoryDatabase> for Script {
    fn execute_operations(&mut self, ctx: &mut Context<MemoryDatabase>) -> Result<()> {
        let ops = std::mem::take(&mut self.ops);
        for (index, op) in ops.into_iter().enumerate() {
            ctx.instruction_index = index;
            let prefix = ctx.pre_str().to_string();
            if let Err(e) = step(ctx, op, &self.journal) {
                self.journal.errors.lock().push((prefix, e.to_string()));
                return Err(e);
            }
        }
        Ok(())
    }
}

fn step(ctx: &mut Context<MemoryDatabase>, op: Op, journal: &Journal) -> Result<()> {
    match op {
        Op::Push(v) => ctx.push(v),
        Op::Get(key) => {
            let pending = current(ctx)?.get(&key);
            ctx.push(StackItem::Pending(pending));
        }
        Op::GetFailing(key, code) => {
            let tr = current(ctx)?;
            tr.fail_next_with(code);
            let pending = tr.get(&key);
            ctx.push(StackItem::Pending(pending));
        }
        Op::PushBroken(msg) => {
            ctx.push(StackItem::pending(async move {
                Err(StackError::Instruction(msg).wrap("pending layer"))
            }));
        }
        Op::Set(key, value) => current(ctx)?.set(&key, &value),
        Op::Commit => {
            let pending = current(ctx)?.commit();
            ctx.push(StackItem::Pending(pending));
        }
        Op::NewTransaction => ctx.new_transaction()?,
        Op::Switch(name) => ctx.switch_transaction(&name)?,
        Op::Fork(prefix) => ctx.add_context(&prefix)?,
        Op::Collect(n) => {
            let params = ctx.pop_params(n)?;
            journal
                .params
                .lock()
                .push((ctx.pre_str().to_string(), params));
        }
        Op::Sleep(ms) => std::thread::sleep(Duration::from_millis(ms)),
        Op::Mark(m) => journal.marks.lock().push((ctx.pre_str().to_string(), m)),
        Op::Fail(msg) => return Err(StackError::Instruction(msg.to_string())),
        Op::Panic(msg) => panic!("{}", msg),
    }
    Ok(())
}

fn current(ctx: &Context<MemoryDatabase>) -> Result<MemoryTransaction> {
    ctx.current_transaction()
        .ok_or_else(|| StackError::Instruction("no current transaction".to_string()))
}

/// Scripted machine: a harness whose contexts run the ops registered for their prefix
pub struct ScriptedMachine {
    pub runtime: Runtime,
    pub harness: Arc<Harness<MemoryDatabase>>,
    pub journal: Arc<Journal>,
}

impl ScriptedMachine {
    pub fn new(scripts: Vec<(&str, Vec<Op>)>) -> Self {
        Self::with_config(scripts, StackMachineConfig::default())
    }

    pub fn with_config(scripts: Vec<(&str, Vec<Op>)>, config: StackMachineConfig) -> Self {
        init_tracing();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to build runtime");
        let journal = Arc::new(Journal::default());
        let scripts: HashMap<Vec<u8>, Vec<Op>> = scripts
            .into_iter()
            .map(|(prefix, ops)| (prefix.as_bytes().to_vec(), ops))
            .collect();

        let j = Arc::clone(&journal);
        let harness = Harness::with_config(
            Arc::new(MemoryDatabase::new()),
            move |prefix: &[u8]| -> Result<Box<dyn InstructionSet<MemoryDatabase>>> {
                let ops = scripts.get(prefix).cloned().ok_or_else(|| {
                    StackError::InvalidArgument(format!("no script for {:?}", prefix))
                })?;
                Ok(Box::new(Script {
                    ops,
                    journal: Arc::clone(&j),
                }))
            },
            runtime.handle().clone(),
            config,
        )
        .expect("Failed to build harness");

        ScriptedMachine {
            runtime,
            harness,
            journal,
        }
    }

    /// Build the root context for `prefix` and run it to completion
    pub fn run(&self, prefix: &str) {
        self.harness
            .root_context(prefix.as_bytes())
            .expect("Failed to create root context")
            .run();
    }

    pub fn database(&self) -> &MemoryDatabase {
        self.harness.database()
    }
}

/// Route library logs through the test harness's captured output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Byte encoding a store error with `code` takes as a parameter
pub fn error_bytes(code: i32) -> Value {
    Value::Bytes(StoreError::new(code, "").error_bytes())
}

pub fn bytes(b: &[u8]) -> Value {
    Value::Bytes(b.to_vec())
}

pub fn not_present() -> Value {
    Value::Bytes(b"RESULT_NOT_PRESENT".to_vec())
}

pub fn get(key: &str) -> Op {
    Op::Get(key.as_bytes().to_vec())
}

pub fn set(key: &str, value: &str) -> Op {
    Op::Set(key.as_bytes().to_vec(), value.as_bytes().to_vec())
}

pub fn fork(prefix: &str) -> Op {
    Op::Fork(prefix.as_bytes().to_vec())
}

pub fn switch(name: &str) -> Op {
    Op::Switch(name.as_bytes().to_vec())
}
