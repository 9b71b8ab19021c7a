//! Elevation run configuration.
//!
//! One immutable value object built at startup and passed by reference into
//! the driver and scanner. Nothing reads configuration from ambient state.

use secrecy::SecretString;

/// Default case-insensitive marker for the su password prompt.
pub const DEFAULT_PROMPT_MARKER: &str = "password:";

/// Default prompt scan budget in bytes.
///
/// Sized to hold a login banner/MOTD plus a short prompt.
pub const DEFAULT_SCAN_LIMIT: usize = 4096;

/// Configuration for one elevation run.
#[derive(Debug)]
pub struct ElevateConfig {
    /// Password handed to su once the prompt is detected.
    pub root_password: SecretString,

    /// Case-insensitive fragment that identifies the password prompt.
    pub prompt_marker: String,

    /// Maximum number of output bytes to scan for the prompt.
    pub scan_limit: usize,
}

impl ElevateConfig {
    /// Create a configuration with the default marker and scan budget.
    pub fn new(root_password: SecretString) -> Self {
        Self {
            root_password,
            prompt_marker: DEFAULT_PROMPT_MARKER.to_string(),
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }

    /// Override the prompt marker.
    pub fn with_prompt_marker(mut self, marker: impl Into<String>) -> Self {
        self.prompt_marker = marker.into();
        self
    }

    /// Override the scan budget.
    pub fn with_scan_limit(mut self, limit: usize) -> Self {
        self.scan_limit = limit;
        self
    }
}
