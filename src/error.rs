//! Error types for surelay.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for surelay operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session channel errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Elevation sequence errors
    #[error("Elevation error: {0}")]
    Elevation(#[from] ElevationError),

    /// Relay phase errors
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Connection attempt exceeded the configured timeout
    #[error("Connection to {host}:{port} timed out after {timeout:?}")]
    Timeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// The target argument could not be parsed as host[:port]
    #[error("Invalid target address '{target}'")]
    InvalidTarget { target: String },
}

/// Session channel errors (channel setup, stream I/O).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Failed to open the session channel
    #[error("Failed to open session channel: {0}")]
    Open(#[source] russh::Error),

    /// Failed to request a PTY on the channel
    #[error("PTY request failed: {0}")]
    PtyRequest(#[source] russh::Error),

    /// Failed to request an interactive shell
    #[error("Shell request failed: {0}")]
    ShellRequest(#[source] russh::Error),

    /// Failed to write to the session's input stream
    #[error("Error writing to session input: {0}")]
    Write(#[source] io::Error),

    /// Failed to signal end of input
    #[error("Error closing session input: {0}")]
    Eof(#[source] io::Error),

    /// Error while reading the session's output stream
    #[error("Error reading session output: {0}")]
    Read(#[source] io::Error),

    /// The output stream closed while more data was required
    #[error("Session output closed unexpectedly")]
    Closed,

    /// Failed to mirror session output to the local sink
    #[error("Error writing session output to local output: {0}")]
    Mirror(#[source] io::Error),
}

/// Elevation sequence errors (su command, prompt detection, credential).
#[derive(Error, Debug)]
pub enum ElevationError {
    /// Failed to send the elevation command line
    #[error("Error sending elevation command: {0}")]
    CommandSend(#[source] SessionError),

    /// The password prompt never appeared within the scan budget.
    ///
    /// Distinct from stream I/O errors so the caller can tell a
    /// misconfigured marker or an undersized buffer from a dead session.
    #[error("Password prompt not found in first {limit} bytes of output")]
    PromptNotFound { limit: usize },

    /// Stream error while scanning for the prompt
    #[error("Error scanning for password prompt: {0}")]
    PromptScan(#[source] SessionError),

    /// Failed to send the elevation credential
    #[error("Error sending elevation credential: {0}")]
    CredentialSend(#[source] SessionError),
}

/// Relay phase errors (script copy, termination, session teardown).
#[derive(Error, Debug)]
pub enum RelayError {
    /// Error reading the local script input
    #[error("Error reading script input: {0}")]
    ScriptRead(#[source] io::Error),

    /// Error writing the script to the session
    #[error("Error relaying script to session: {0}")]
    ScriptSend(#[source] SessionError),

    /// Error sending the shell termination sequence
    #[error("Error sending termination sequence: {0}")]
    TerminationSend(#[source] SessionError),

    /// Error closing the session's input stream
    #[error("Error closing session input: {0}")]
    InputClose(#[source] SessionError),

    /// The remote shell exited with a non-zero status
    #[error("Remote shell exited with status {status}")]
    RemoteExit { status: u32 },

    /// The session ended without reporting an exit status
    #[error("Session ended without reporting an exit status")]
    ExitStatusMissing,

    /// The output drain task panicked or was cancelled
    #[error("Output drain task failed: {0}")]
    DrainJoin(#[source] tokio::task::JoinError),
}

/// Result type alias using surelay's Error.
pub type Result<T> = std::result::Result<T, Error>;
