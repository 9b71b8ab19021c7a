//! Byte-at-a-time prompt scanner.
//!
//! Reads merged session output one byte per iteration into a bounded
//! buffer, mirroring each byte to the local sink as it arrives, and tests
//! the whole accumulated buffer for a case-insensitive occurrence of the
//! marker after every byte. Recomputing over the whole buffer (rather than
//! a rolling window) means a marker split across reads, or across
//! case-folding boundaries, is still detected; the buffer is small enough
//! that the quadratic comparison cost does not matter.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::SessionError;
use crate::session::{ByteStream, SessionOutput};

/// Scan for `marker` within the next `limit` bytes of session output.
///
/// Returns `Ok(true)` the instant the accumulated output contains the
/// marker, without consuming any further bytes; `Ok(false)` once exactly
/// `limit` bytes have been consumed without a match. Every byte read is
/// written to `mirror` exactly once, in order, so the user sees the live
/// session including the prompt itself. A read error or end of stream
/// while scanning is fatal: the remote state is unknown at that point.
pub async fn scan<S, W>(
    output: &mut ByteStream<S>,
    mirror: &mut W,
    marker: &str,
    limit: usize,
) -> Result<bool, SessionError>
where
    S: SessionOutput,
    W: AsyncWrite + Unpin,
{
    let needle = marker.to_lowercase();
    let mut buf: Vec<u8> = Vec::with_capacity(limit.min(4096));

    while buf.len() < limit {
        let byte = match output.next_byte().await? {
            Some(byte) => byte,
            None => return Err(SessionError::Closed),
        };

        mirror.write_all(&[byte]).await.map_err(SessionError::Mirror)?;
        mirror.flush().await.map_err(SessionError::Mirror)?;

        buf.push(byte);
        if String::from_utf8_lossy(&buf).to_lowercase().contains(&needle) {
            return Ok(true);
        }
    }

    Ok(false)
}
