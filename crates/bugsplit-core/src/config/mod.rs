//! Configuration for the introspector.
//!
//! This module contains:
//! - Target and polling constants
//! - `IntrospectorConfig` and its builder

use std::path::PathBuf;

/// Target process configuration.
pub mod target {
    /// Process name as listed by the OS, without the `.exe` suffix.
    pub const PROCESS_NAME: &str = "Bug Fables";

    /// Maximum bytes read for a room name.
    pub const ROOM_NAME_MAX_LEN: usize = 64;
}

/// Polling configuration.
pub mod polling {
    /// Interval between host ticks (ms).
    pub const POLL_INTERVAL_MS: u64 = 100;
}

/// Diagnostic log configuration.
pub mod diagnostics {
    /// Default file name for the diagnostic log.
    pub const DEFAULT_LOG_FILE: &str = "bugsplit-log.txt";
}

/// Configuration for [`GameMemory`](crate::memory::GameMemory)
#[derive(Debug, Clone)]
pub struct IntrospectorConfig {
    /// Process name to attach to
    pub process_name: String,
    /// Where to record version detection outcomes; `None` disables the file
    pub diagnostic_log: Option<PathBuf>,
}

impl Default for IntrospectorConfig {
    fn default() -> Self {
        Self {
            process_name: target::PROCESS_NAME.to_string(),
            diagnostic_log: None,
        }
    }
}

impl IntrospectorConfig {
    /// Create a new configuration builder
    pub fn builder() -> IntrospectorConfigBuilder {
        IntrospectorConfigBuilder::default()
    }
}

/// Builder for IntrospectorConfig
#[derive(Debug, Clone, Default)]
pub struct IntrospectorConfigBuilder {
    process_name: Option<String>,
    diagnostic_log: Option<PathBuf>,
}

impl IntrospectorConfigBuilder {
    /// Set the process name to attach to
    pub fn process_name<S: Into<String>>(mut self, name: S) -> Self {
        self.process_name = Some(name.into());
        self
    }

    /// Record version detection outcomes to this file
    pub fn diagnostic_log<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.diagnostic_log = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> IntrospectorConfig {
        let default = IntrospectorConfig::default();
        IntrospectorConfig {
            process_name: self.process_name.unwrap_or(default.process_name),
            diagnostic_log: self.diagnostic_log.or(default.diagnostic_log),
        }
    }
}
