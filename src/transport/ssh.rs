//! SSH transport implementation using russh.

use std::sync::Arc;

use log::debug;
use russh::client::{self, Handle, KeyboardInteractiveAuthResponse};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::config::SshConfig;
use crate::error::{SessionError, TransportError};
use crate::session::ShellSession;

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self, TransportError> {
        let ssh_config = Arc::new(client::Config::default());

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), SshHandler),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout,
        })?
        .map_err(TransportError::Ssh)?;

        Self::authenticate(&mut session, &config).await?;

        Ok(Self { session, config })
    }

    /// Open a session channel with a PTY and an interactive shell.
    ///
    /// PTY and shell negotiation failures are reported separately; either
    /// one leaves the session unusable.
    pub async fn open_shell(&self) -> Result<ShellSession, SessionError> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(SessionError::Open)?;

        channel
            .request_pty(true, "vt100", 0, 0, 0, 0, &[])
            .await
            .map_err(SessionError::PtyRequest)?;

        channel
            .request_shell(true)
            .await
            .map_err(SessionError::ShellRequest)?;

        debug!("shell ready on {}", self.config.socket_addr());

        Ok(ShellSession::new(channel))
    }

    /// Authenticate with the server.
    ///
    /// Tries password authentication first, then falls back to
    /// keyboard-interactive, answering every challenge with the same
    /// password regardless of the prompt or echo hints it carries.
    async fn authenticate(
        session: &mut Handle<SshHandler>,
        config: &SshConfig,
    ) -> Result<(), TransportError> {
        let password = config.password.expose_secret();

        let success = session
            .authenticate_password(&config.username, password)
            .await
            .map_err(TransportError::Ssh)?
            .success();
        if success {
            return Ok(());
        }

        debug!("password auth rejected, trying keyboard-interactive");

        let mut response = session
            .authenticate_keyboard_interactive_start(&config.username, None::<String>)
            .await
            .map_err(TransportError::Ssh)?;

        loop {
            match response {
                KeyboardInteractiveAuthResponse::Success => return Ok(()),
                KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } => {
                    let answers = vec![password.to_string(); prompts.len()];
                    response = session
                        .authenticate_keyboard_interactive_respond(answers)
                        .await
                        .map_err(TransportError::Ssh)?;
                }
                _ => {
                    return Err(TransportError::AuthenticationFailed {
                        user: config.username.clone(),
                    });
                }
            }
        }
    }

    /// Close the connection.
    pub async fn close(self) -> Result<(), TransportError> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
///
/// Host keys are accepted without verification, as the reference tooling
/// does; the targets this runs against are not expected to be in any
/// known_hosts file.
struct SshHandler;

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}
