//! Relay pump: script copy, output drain, and session teardown.
//!
//! Once the elevation sequence has completed, the remaining session output
//! is drained to the local sink by a spawned task while the control task
//! copies the script body into the session. The drain task is joined after
//! the input stream is closed; that both guarantees the final output bytes
//! reach the sink and is where the remote exit status becomes available.

use log::warn;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RelayError;
use crate::session::{ByteStream, SessionInput, SessionOutput};

/// Bytes sent once the script has been fully relayed.
///
/// Ends three nested shell levels (the login shell, su's shell, and
/// whatever the script may have left open) and signals end-of-input three
/// times, whether or not the script balanced its own nesting.
pub const TERMINATION_SEQUENCE: &[u8] = b"\n\nexit\nexit\nexit\n\x04\n\x04\n\x04";

const SCRIPT_CHUNK: usize = 8192;

/// Relay the script into the session and drain its output until it closes.
///
/// On success, returns the number of script bytes copied into the session.
/// A failure while copying the script aborts before the termination
/// sequence is sent; the sequence is written verbatim exactly once, only
/// after the whole script body has gone through.
pub async fn relay<S, I, R, W>(
    output: ByteStream<S>,
    input: &mut I,
    script: &mut R,
    mirror: W,
) -> Result<u64, RelayError>
where
    S: SessionOutput + 'static,
    I: SessionInput,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let drain = tokio::spawn(drain_output(output, mirror));

    let mut total: u64 = 0;
    let mut buf = vec![0u8; SCRIPT_CHUNK];
    loop {
        let n = script.read(&mut buf).await.map_err(RelayError::ScriptRead)?;
        if n == 0 {
            break;
        }
        input
            .send(&buf[..n])
            .await
            .map_err(RelayError::ScriptSend)?;
        total += n as u64;
    }

    input
        .send(TERMINATION_SEQUENCE)
        .await
        .map_err(RelayError::TerminationSend)?;

    input.close().await.map_err(RelayError::InputClose)?;

    // The drain task returns the stream once the channel closes, carrying
    // the exit status with it.
    let output = drain.await.map_err(RelayError::DrainJoin)?;
    match output.exit_status() {
        Some(0) => Ok(total),
        Some(status) => Err(RelayError::RemoteExit { status }),
        None => Err(RelayError::ExitStatusMissing),
    }
}

/// Copy session output to the local sink until the channel closes.
///
/// Errors here never abort the relay: a failing local sink stops the
/// mirroring but the stream is still drained so the exit status arrives,
/// and a failing stream simply ends the drain.
async fn drain_output<S, W>(mut output: ByteStream<S>, mut mirror: W) -> ByteStream<S>
where
    S: SessionOutput,
    W: AsyncWrite + Unpin,
{
    let mut mirroring = true;
    loop {
        match output.next_chunk().await {
            Ok(Some(chunk)) => {
                if mirroring {
                    if let Err(e) = mirror.write_all(&chunk).await {
                        warn!("stopping local output mirror: {e}");
                        mirroring = false;
                    } else if let Err(e) = mirror.flush().await {
                        warn!("stopping local output mirror: {e}");
                        mirroring = false;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("session output ended with error: {e}");
                break;
            }
        }
    }
    output
}
