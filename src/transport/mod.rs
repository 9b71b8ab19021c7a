//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management,
//! handling connection setup, authentication, and channel creation.

pub mod config;
mod ssh;

pub use config::{DEFAULT_PORT, SshConfig, parse_target};
pub use ssh::SshTransport;
