//! Stack machine configuration
//!
//! Settings for the worker threads that run forked contexts and for how
//! swallowed instruction failures are reported. Loadable from TOML.

use serde::{Deserialize, Serialize};
use stackmachine_core::{Result, StackError};

/// Configuration shared by every context of a machine tree
///
/// # Example
///
/// ```toml
/// thread_name_prefix = "stackmachine"
/// # thread_stack_size = 8388608
/// log_instruction_failures = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackMachineConfig {
    /// Forked contexts run on threads named `<prefix>-<context prefix>`
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
    /// Stack size in bytes for forked context threads (platform default if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_stack_size: Option<usize>,
    /// Report swallowed instruction failures at error level (debug otherwise)
    #[serde(default = "default_log_instruction_failures")]
    pub log_instruction_failures: bool,
}

fn default_thread_name_prefix() -> String {
    "stackmachine".to_string()
}

fn default_log_instruction_failures() -> bool {
    true
}

impl Default for StackMachineConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: default_thread_name_prefix(),
            thread_stack_size: None,
            log_instruction_failures: default_log_instruction_failures(),
        }
    }
}

impl StackMachineConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the document does not parse or fails validation.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StackMachineConfig =
            toml::from_str(s).map_err(|e| StackError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no worker thread could be started with
    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.is_empty() {
            return Err(StackError::InvalidConfig(
                "thread_name_prefix must not be empty".to_string(),
            ));
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(StackError::InvalidConfig(
                "thread_name_prefix must not contain NUL".to_string(),
            ));
        }
        if self.thread_stack_size == Some(0) {
            return Err(StackError::InvalidConfig(
                "thread_stack_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Stack machine configuration
#
# Forked contexts run on threads named "<thread_name_prefix>-<context prefix>"
thread_name_prefix = "stackmachine"

# Stack size in bytes for forked context threads (platform default if unset)
# thread_stack_size = 8388608

# Log swallowed instruction failures at error level (debug level when false)
log_instruction_failures = true
"#
    }
}
