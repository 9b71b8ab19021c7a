//! Elevation driver.
//!
//! Drives the whole post-connect sequence against an open PTY shell
//! session: send the elevation command, scan for the password prompt,
//! supply the credential, resynchronize on one output byte, then hand the
//! session over to the relay pump.

mod relay;
mod scan;

pub use relay::{TERMINATION_SEQUENCE, relay};
pub use scan::scan;

use log::{debug, warn};
use secrecy::ExposeSecret;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::ElevateConfig;
use crate::error::{ElevationError, Result};
use crate::session::{ByteStream, SessionInput, SessionOutput};

/// Command line sent to trigger elevation: show who is logged in, then su.
const ELEVATE_COMMAND: &[u8] = b"w && su\n";

/// Run the full elevation-and-relay sequence over an open shell session.
///
/// `script` is copied into the elevated shell once the prompt has been
/// answered; all session output goes to `mirror` as it arrives. Returns
/// the number of script bytes relayed.
pub async fn run<S, I, R, W>(
    mut output: ByteStream<S>,
    mut input: I,
    config: &ElevateConfig,
    script: &mut R,
    mut mirror: W,
) -> Result<u64>
where
    S: SessionOutput + 'static,
    I: SessionInput,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    input
        .send(ELEVATE_COMMAND)
        .await
        .map_err(ElevationError::CommandSend)?;

    let found = scan(
        &mut output,
        &mut mirror,
        &config.prompt_marker,
        config.scan_limit,
    )
    .await
    .map_err(ElevationError::PromptScan)?;
    if !found {
        return Err(ElevationError::PromptNotFound {
            limit: config.scan_limit,
        }
        .into());
    }
    debug!("password prompt detected");

    // Two CRLF pairs: one submits the password, the second dismisses any
    // trailing prompt echo.
    let credential = format!("{}\r\n\r\n", config.root_password.expose_secret());
    input
        .send(credential.as_bytes())
        .await
        .map_err(ElevationError::CredentialSend)?;

    // Read one byte before bulk relay so the copy below cannot race the
    // final prompt-confirmation byte. The elevation may already have
    // succeeded even if this read fails, so a failure here only warns.
    match output.next_byte().await {
        Ok(Some(byte)) => {
            let _ = mirror.write_all(&[byte]).await;
            let _ = mirror.flush().await;
        }
        Ok(None) => warn!("session output closed while waiting for byte after auth"),
        Err(e) => warn!("error waiting for byte after auth: {e}"),
    }

    let relayed = relay(output, &mut input, script, mirror).await?;
    Ok(relayed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::session::testing::{RecordingInput, ScriptedOutput, SharedSink};

    fn config() -> ElevateConfig {
        ElevateConfig::new("toor".to_string().into())
    }

    async fn run_scripted(
        chunks: &[&[u8]],
        config: &ElevateConfig,
        script: &[u8],
    ) -> (Result<u64>, RecordingInput, SharedSink) {
        let output = ByteStream::new(ScriptedOutput::new(chunks));
        let input = RecordingInput::new();
        let mirror = SharedSink::new();
        let mut script = script;
        let result = run(output, input.clone(), config, &mut script, mirror.clone()).await;
        (result, input, mirror)
    }

    #[tokio::test]
    async fn test_full_sequence_with_banner() {
        // Scenario: banner then prompt, nothing further until the
        // credential is written.
        let banner = b"Welcome\nuser's password:" as &[u8];
        let (result, input, mirror) = run_scripted(&[banner], &config(), b"echo hi\n").await;

        assert_eq!(result.unwrap(), 8);
        assert_eq!(
            input.writes(),
            vec![
                b"w && su\n".to_vec(),
                b"toor\r\n\r\n".to_vec(),
                b"echo hi\n".to_vec(),
                TERMINATION_SEQUENCE.to_vec(),
            ]
        );
        assert!(input.is_closed());
        // The whole banner, prompt included, was mirrored during the scan.
        assert_eq!(mirror.contents(), banner);
    }

    #[tokio::test]
    async fn test_prompt_not_found_is_distinct_error() {
        let config = config().with_scan_limit(10);
        let (result, input, mirror) =
            run_scripted(&[b"no prompt!" as &[u8]], &config, b"echo hi\n").await;

        match result {
            Err(Error::Elevation(ElevationError::PromptNotFound { limit })) => {
                assert_eq!(limit, 10);
            }
            other => panic!("expected PromptNotFound, got {other:?}"),
        }
        // Only the elevation command went out; no credential, no script.
        assert_eq!(input.writes(), vec![b"w && su\n".to_vec()]);
        assert!(!input.is_closed());
        assert_eq!(mirror.contents(), b"no prompt!");
    }

    #[tokio::test]
    async fn test_empty_script_reports_zero_bytes() {
        let (result, input, _) = run_scripted(&[b"password:" as &[u8]], &config(), b"").await;

        assert_eq!(result.unwrap(), 0);
        let writes = input.writes();
        assert_eq!(writes.last().unwrap(), TERMINATION_SEQUENCE);
        assert!(input.is_closed());
    }

    #[tokio::test]
    async fn test_confirmation_byte_and_remaining_output_are_mirrored() {
        let (result, _, mirror) = run_scripted(
            &[b"password:" as &[u8], b"\n", b"# whoami\nroot\n"],
            &config(),
            b"whoami\n",
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(mirror.contents(), b"password:\n# whoami\nroot\n");
    }

    #[tokio::test]
    async fn test_missing_confirmation_byte_is_not_fatal() {
        // Output ends right after the prompt; the resync read fails but
        // the relay still runs to completion.
        let (result, input, _) = run_scripted(&[b"password:" as &[u8]], &config(), b"id\n").await;

        assert_eq!(result.unwrap(), 3);
        assert!(input.is_closed());
    }

    #[tokio::test]
    async fn test_elevation_command_send_failure_is_fatal() {
        let output = ByteStream::new(ScriptedOutput::new(&[b"password:" as &[u8]]));
        let input = RecordingInput::failing_after(0);
        let mut script: &[u8] = b"id\n";

        let result = run(
            output,
            input.clone(),
            &config(),
            &mut script,
            SharedSink::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Elevation(ElevationError::CommandSend(_)))
        ));
        // The session never saw a byte of input.
        assert!(input.writes().is_empty());
        assert!(!input.is_closed());
    }

    #[tokio::test]
    async fn test_credential_send_failure_is_fatal() {
        // The elevation command goes out and the prompt is detected, then
        // the credential write fails.
        let output = ByteStream::new(ScriptedOutput::new(&[b"password:" as &[u8]]));
        let input = RecordingInput::failing_after(1);
        let mut script: &[u8] = b"id\n";

        let result = run(
            output,
            input.clone(),
            &config(),
            &mut script,
            SharedSink::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Elevation(ElevationError::CredentialSend(_)))
        ));
        // Only the elevation command made it through; no credential, no
        // script, no termination sequence.
        assert_eq!(input.written(), b"w && su\n");
        assert!(!input.is_closed());
    }

    #[tokio::test]
    async fn test_case_insensitive_prompt_marker() {
        let config = config().with_prompt_marker("Password:");
        let (result, _, _) = run_scripted(&[b"PASSWORD:" as &[u8]], &config, b"").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_deterministic_across_identical_sessions() {
        let mut runs = Vec::new();
        for _ in 0..2 {
            let (result, input, mirror) = run_scripted(
                &[b"motd\npassword:" as &[u8], b" \nroot# "],
                &config(),
                b"uname -a\n",
            )
            .await;
            runs.push((result.unwrap(), input.writes(), mirror.contents()));
        }
        assert_eq!(runs[0], runs[1]);
    }
}
