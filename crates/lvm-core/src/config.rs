//! LVM Configuration
//!
//! Defines runtime limits for the virtual machine.
//! Configuration specifies constraints only; enforcement is handled by the VM.

/// VM Configuration
#[derive(Debug, Clone)]
pub struct LvmConfig {
    /// Maximum operand stack depth
    pub max_stack_size: usize,

    /// Maximum call depth (recursion limit)
    pub max_call_depth: usize,
}

impl Default for LvmConfig {
    fn default() -> Self {
        LvmConfig {
            max_stack_size: 1024,
            max_call_depth: 256,
        }
    }
}

impl LvmConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }
}
