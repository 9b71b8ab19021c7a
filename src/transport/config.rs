//! SSH connection configuration.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::TransportError;

/// Default SSH port, appended when the target gives none.
pub const DEFAULT_PORT: u16 = 22;

/// SSH connection configuration.
#[derive(Debug)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Unprivileged username for authentication.
    pub username: String,

    /// Unprivileged password. Also answers every keyboard-interactive
    /// challenge, whatever its prompt text.
    pub password: SecretString,

    /// Connection timeout.
    pub timeout: Duration,
}

impl SshConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a `host[:port]` target into host and port.
///
/// Accepts bare hostnames, `host:port`, bracketed IPv6 (`[::1]:2222` or
/// `[::1]`), and bare IPv6 literals (which contain multiple colons and are
/// treated as a host with the default port).
pub fn parse_target(target: &str, default_port: u16) -> Result<(String, u16), TransportError> {
    let invalid = || TransportError::InvalidTarget {
        target: target.to_string(),
    };

    if target.is_empty() {
        return Err(invalid());
    }

    // Bracketed IPv6, optionally followed by :port.
    if let Some(rest) = target.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        return match after.strip_prefix(':') {
            None if after.is_empty() => Ok((host.to_string(), default_port)),
            Some("") => Ok((host.to_string(), default_port)),
            Some(port) => Ok((host.to_string(), port.parse().map_err(|_| invalid())?)),
            None => Err(invalid()),
        };
    }

    match target.split_once(':') {
        // More than one colon means a bare IPv6 literal, not host:port.
        Some((_, rest)) if rest.contains(':') => Ok((target.to_string(), default_port)),
        Some((host, "")) => Ok((host.to_string(), default_port)),
        Some((host, port)) => Ok((host.to_string(), port.parse().map_err(|_| invalid())?)),
        None => Ok((target.to_string(), default_port)),
    }
}
