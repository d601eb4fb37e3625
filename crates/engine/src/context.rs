//! Stack machine execution context
//!
//! A [`Context`] is one unit of execution: it owns a value stack, an
//! instruction cursor, the name of its current transaction and the workers of
//! any contexts it forked. Contexts of one machine tree share a [`Harness`]
//! holding the store client, the transaction registry and the protocol that
//! supplies instruction sets.
//!
//! ## Lifecycle
//!
//! ```text
//! Context::new(harness, prefix)   derive key range and names, create the initial transaction
//! context.run()                   execute the instruction set, swallow any failure
//!   └─ add_context(prefix)        fork: build the child here, run it on its own thread
//! drain_children()                join every fork, in order, before run() returns
//! ```
//!
//! Failures never escape `run()`. They are logged and the context simply stops;
//! its children are still waited for.

use crate::config::StackMachineConfig;
use crate::resolver;
use crate::stack::ValueStack;
use crate::supervision::{panic_message, Children};
use stackmachine_concurrency::TransactionRegistry;
use stackmachine_core::{
    prefix_range, printable, Database, KeySelector, Result, StackError, StackItem, StreamingMode,
    Value,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, error};

/// Instruction loop of one context
///
/// Supplied per protocol version. Closures taking `&mut Context<D>` implement it.
pub trait InstructionSet<D: Database>: Send {
    /// Execute the context's instructions to completion
    fn execute_operations(&mut self, ctx: &mut Context<D>) -> Result<()>;
}

impl<D, F> InstructionSet<D> for F
where
    D: Database,
    F: FnMut(&mut Context<D>) -> Result<()> + Send,
{
    fn execute_operations(&mut self, ctx: &mut Context<D>) -> Result<()> {
        self(ctx)
    }
}

/// Factory of instruction sets, one per context prefix
///
/// Called once for the root context and once for every fork.
pub trait Protocol<D: Database>: Send + Sync + 'static {
    /// Instruction set for the context running under `prefix`
    fn instructions(&self, prefix: &[u8]) -> Result<Box<dyn InstructionSet<D>>>;
}

impl<D, F> Protocol<D> for F
where
    D: Database,
    F: Fn(&[u8]) -> Result<Box<dyn InstructionSet<D>>> + Send + Sync + 'static,
{
    fn instructions(&self, prefix: &[u8]) -> Result<Box<dyn InstructionSet<D>>> {
        self(prefix)
    }
}

/// State shared by every context of one machine tree
pub struct Harness<D: Database> {
    db: Arc<D>,
    registry: TransactionRegistry<D::Transaction>,
    protocol: Box<dyn Protocol<D>>,
    runtime: Handle,
    config: StackMachineConfig,
}

impl<D: Database> Harness<D> {
    /// Create a harness with the default configuration
    ///
    /// `runtime` drives pending results when instruction sets block on
    /// parameter resolution from their worker thread.
    pub fn new(db: Arc<D>, protocol: impl Protocol<D>, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            db,
            registry: TransactionRegistry::new(),
            protocol: Box::new(protocol),
            runtime,
            config: StackMachineConfig::default(),
        })
    }

    /// Create a harness with an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn with_config(
        db: Arc<D>,
        protocol: impl Protocol<D>,
        runtime: Handle,
        config: StackMachineConfig,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self {
            db,
            registry: TransactionRegistry::new(),
            protocol: Box::new(protocol),
            runtime,
            config,
        }))
    }

    /// Store client
    pub fn database(&self) -> &Arc<D> {
        &self.db
    }

    /// Registry of live transactions
    pub fn registry(&self) -> &TransactionRegistry<D::Transaction> {
        &self.registry
    }

    /// Runtime driving pending results
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Active configuration
    pub fn config(&self) -> &StackMachineConfig {
        &self.config
    }

    /// Build the root context for `prefix`
    ///
    /// The root context runs on the caller's thread. That thread may be a
    /// plain thread or one inside a multi-thread Tokio runtime; inside a
    /// current-thread runtime every parameter collection fails with
    /// `BlockingInRuntime`.
    pub fn root_context(self: &Arc<Self>, prefix: &[u8]) -> Result<Context<D>> {
        Context::new(Arc::clone(self), prefix)
    }
}

/// One execution unit of the stack machine
pub struct Context<D: Database> {
    harness: Arc<Harness<D>>,
    stack: ValueStack,
    prefix: Vec<u8>,
    pre_str: String,
    tr_name: String,
    next_key: KeySelector,
    end_key: KeySelector,
    /// Index of the instruction being executed
    pub instruction_index: usize,
    /// Version cached by the instruction set
    pub last_version: Option<i64>,
    children: Children,
}

impl<D: Database> Context<D> {
    /// Create a context for `prefix` and its initial transaction
    ///
    /// The transaction name starts out as the printable form of `prefix`.
    ///
    /// # Errors
    ///
    /// Fails with the store error if the initial transaction cannot be created.
    pub fn new(harness: Arc<Harness<D>>, prefix: &[u8]) -> Result<Self> {
        let (next_key, end_key) = prefix_range(prefix);
        let pre_str = printable(prefix);
        let ctx = Self {
            harness,
            stack: ValueStack::new(),
            prefix: prefix.to_vec(),
            tr_name: pre_str.clone(),
            pre_str,
            next_key,
            end_key,
            instruction_index: 0,
            last_version: None,
            children: Children::new(),
        };
        ctx.new_transaction()?;
        Ok(ctx)
    }

    /// Namespace prefix of this context
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Printable form of the prefix
    pub fn pre_str(&self) -> &str {
        &self.pre_str
    }

    /// Registry name of the current transaction
    pub fn transaction_name(&self) -> &str {
        &self.tr_name
    }

    /// Selector for the first key of this context's namespace
    pub fn next_key(&self) -> &KeySelector {
        &self.next_key
    }

    /// Selector for the end of this context's namespace
    pub fn end_key(&self) -> &KeySelector {
        &self.end_key
    }

    /// Shared harness
    pub fn harness(&self) -> &Arc<Harness<D>> {
        &self.harness
    }

    /// Store client
    pub fn database(&self) -> &Arc<D> {
        &self.harness.db
    }

    /// Value stack
    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// Mutable value stack
    pub fn stack_mut(&mut self) -> &mut ValueStack {
        &mut self.stack
    }

    /// Push an item attributed to the current instruction
    pub fn push(&mut self, item: impl Into<StackItem>) {
        self.stack.push(self.instruction_index, item);
    }

    /// Number of forked contexts not yet joined
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    // ========================================================================
    // Transaction naming
    // ========================================================================

    /// Replace the current name's transaction with a fresh one
    pub fn new_transaction(&self) -> Result<()> {
        let tr = self.harness.db.create_transaction()?;
        self.harness.registry.put(&self.tr_name, tr);
        Ok(())
    }

    /// Transaction currently associated with this context's name
    pub fn current_transaction(&self) -> Option<D::Transaction> {
        self.harness.registry.get(&self.tr_name)
    }

    /// Associate `tr` with this context's name
    pub fn update_transaction(&self, tr: D::Transaction) {
        self.harness.registry.put(&self.tr_name, tr);
    }

    /// Switch to the transaction named by the printable form of `name`
    ///
    /// A name seen for the first time gets a fresh transaction; a known name
    /// keeps its existing one.
    pub fn switch_transaction(&mut self, name: &[u8]) -> Result<()> {
        self.tr_name = printable(name);
        let db = &self.harness.db;
        let created = self
            .harness
            .registry
            .ensure(&self.tr_name, || db.create_transaction())?;
        debug!(
            target: "stackmachine::context",
            prefix = %self.pre_str,
            name = %self.tr_name,
            created,
            "Switched transaction"
        );
        Ok(())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Pop `count` operands, waiting out pending ones
    ///
    /// See [`resolver::resolve_parameters`] for the ordering and error rules.
    pub async fn resolve_parameters(&mut self, count: usize) -> Result<Vec<Value>> {
        resolver::resolve_parameters(&mut self.stack, count).await
    }

    /// Blocking form of [`Context::resolve_parameters`]
    ///
    /// Drives resolution on the harness runtime. On a plain thread (every
    /// forked context) it blocks directly. On a thread already inside a
    /// multi-thread runtime it blocks through `block_in_place`.
    ///
    /// # Errors
    ///
    /// Returns `BlockingInRuntime` when called inside a current-thread
    /// runtime, which cannot give up its thread to block.
    pub fn pop_params(&mut self, count: usize) -> Result<Vec<Value>> {
        let runtime = self.harness.runtime.clone();
        let resolution = resolver::resolve_parameters(&mut self.stack, count);
        match Handle::try_current().map(|current| current.runtime_flavor()) {
            Err(_) => runtime.block_on(resolution),
            Ok(RuntimeFlavor::MultiThread) => {
                tokio::task::block_in_place(|| runtime.block_on(resolution))
            }
            Ok(_) => Err(StackError::BlockingInRuntime("current-thread")),
        }
    }

    /// Streaming mode with the given numeric code
    pub fn streaming_mode_from_code(code: i64) -> Result<StreamingMode> {
        StreamingMode::from_code(code)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Fork a context under `prefix` and start it on its own thread
    ///
    /// The child and its initial transaction are created on the calling
    /// thread; only its instruction loop runs concurrently.
    pub fn add_context(&mut self, prefix: &[u8]) -> Result<()> {
        let child = Context::new(Arc::clone(&self.harness), prefix)?;
        let name = format!("{}-{}", self.harness.config.thread_name_prefix, child.pre_str);
        debug!(target: "stackmachine::context", parent = %self.pre_str, child = %child.pre_str, "Forking context");
        self.children
            .spawn(name, self.harness.config.thread_stack_size, move || child.run())?;
        Ok(())
    }

    /// Execute this context to completion
    ///
    /// Any error or panic from the instruction set is logged and swallowed.
    /// Every forked context is joined before this returns.
    ///
    /// Runs on the calling thread; see [`Harness::root_context`] for which
    /// threads can block on parameters.
    pub fn run(mut self) {
        debug!(target: "stackmachine::context", prefix = %self.pre_str, "Context started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute()));
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(StackError::Panicked(panic_message(payload.as_ref()))),
        };
        if let Some(e) = failure {
            if self.harness.config.log_instruction_failures {
                error!(
                    target: "stackmachine::context",
                    prefix = %self.pre_str,
                    instruction = self.instruction_index,
                    error = %e,
                    "Instruction loop failed"
                );
            } else {
                debug!(
                    target: "stackmachine::context",
                    prefix = %self.pre_str,
                    instruction = self.instruction_index,
                    error = %e,
                    "Instruction loop failed"
                );
            }
        }

        self.drain_children();
        debug!(target: "stackmachine::context", prefix = %self.pre_str, "Context finished");
    }

    /// Wait for every forked context to terminate, in fork order
    pub fn drain_children(&mut self) {
        self.children.drain();
    }

    fn execute(&mut self) -> Result<()> {
        let mut instructions = self.harness.protocol.instructions(&self.prefix)?;
        instructions.execute_operations(self)
    }
}
