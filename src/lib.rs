//! # surelay
//!
//! Connects to a host over SSH as an unprivileged user, runs `su` in an
//! interactive PTY shell, answers the password prompt, and relays a script
//! from local standard input into the elevated shell while mirroring all
//! remote output locally.
//!
//! The interesting part is the interactive protocol: a byte-at-a-time,
//! case-insensitive scan of raw session output for the password prompt
//! within a bounded budget, followed by a hand-off into a bidirectional
//! relay with a fixed termination sequence at the end.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use surelay::config::ElevateConfig;
//! use surelay::session::ByteStream;
//! use surelay::transport::{SshConfig, SshTransport};
//!
//! #[tokio::main]
//! async fn main() -> surelay::Result<()> {
//!     let transport = SshTransport::connect(SshConfig {
//!         host: "192.0.2.10".into(),
//!         port: 22,
//!         username: "sysadmin".into(),
//!         password: "changeme".to_string().into(),
//!         timeout: Duration::from_secs(30),
//!     })
//!     .await?;
//!
//!     let (output, input) = transport.open_shell().await?.split();
//!     let config = ElevateConfig::new("changeme".to_string().into());
//!     let mut script: &[u8] = b"id\n";
//!
//!     let sent = surelay::driver::run(
//!         ByteStream::new(output),
//!         input,
//!         &config,
//!         &mut script,
//!         tokio::io::stdout(),
//!     )
//!     .await?;
//!     println!("sent {sent} bytes");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use config::ElevateConfig;
pub use error::{Error, Result};
pub use session::ByteStream;
pub use transport::{SshConfig, SshTransport};
