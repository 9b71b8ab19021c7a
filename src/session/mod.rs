//! Session I/O adapter over the SSH channel.
//!
//! Wraps the russh channel halves behind two small traits so the elevation
//! driver and relay pump can be exercised against scripted sessions. The
//! output side merges the channel's stdout and stderr into one chunk stream
//! and records the remote exit status; [`ByteStream`] layers the
//! one-byte-at-a-time reads the prompt scanner needs on top, keeping
//! unconsumed chunk remainders for the relay phase.

use std::future::Future;
use std::io;

use bytes::{Buf, Bytes};
use log::debug;
use russh::client::Msg;
use russh::{Channel, ChannelMsg, ChannelReadHalf, ChannelWriteHalf};

use crate::error::SessionError;

/// Read side of a session: merged output chunks plus the exit status.
pub trait SessionOutput: Send {
    /// Receive the next merged output chunk, or `None` once the channel
    /// has closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Bytes>, SessionError>> + Send;

    /// Exit status of the remote command, once the channel reported one.
    fn exit_status(&self) -> Option<u32>;
}

/// Write side of a session.
pub trait SessionInput: Send {
    /// Write bytes to the session's input stream.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Signal end of input.
    fn close(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// An open session channel with a PTY and shell, ready to be split into
/// its read and write halves.
pub struct ShellSession {
    channel: Channel<Msg>,
}

impl ShellSession {
    pub(crate) fn new(channel: Channel<Msg>) -> Self {
        Self { channel }
    }

    /// Split into independently owned output and input halves.
    pub fn split(self) -> (ChannelOutput, ChannelInput) {
        let (read, write) = self.channel.split();
        (
            ChannelOutput {
                read,
                exit_status: None,
            },
            ChannelInput { write },
        )
    }
}

/// Output half of the channel, merging stdout and stderr.
pub struct ChannelOutput {
    read: ChannelReadHalf,
    exit_status: Option<u32>,
}

impl SessionOutput for ChannelOutput {
    async fn recv(&mut self) -> Result<Option<Bytes>, SessionError> {
        loop {
            match self.read.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    return Ok(Some(Bytes::copy_from_slice(&data)));
                }
                // Extended data is stderr; the merged stream makes no
                // distinction.
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    return Ok(Some(Bytes::copy_from_slice(&data)));
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!("remote command exited with status {exit_status}");
                    self.exit_status = Some(exit_status);
                }
                Some(ChannelMsg::ExitSignal { signal_name, .. }) => {
                    debug!("remote command killed by signal {signal_name:?}");
                }
                // EOF precedes close; keep waiting so a late exit status
                // is not lost.
                Some(ChannelMsg::Eof) => {}
                Some(ChannelMsg::Close) | None => return Ok(None),
                Some(msg) => {
                    debug!("ignoring channel message: {msg:?}");
                }
            }
        }
    }

    fn exit_status(&self) -> Option<u32> {
        self.exit_status
    }
}

/// Input half of the channel.
pub struct ChannelInput {
    write: ChannelWriteHalf<Msg>,
}

impl SessionInput for ChannelInput {
    async fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.write
            .data(data)
            .await
            .map_err(|e| SessionError::Write(io::Error::other(e)))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.write
            .eof()
            .await
            .map_err(|e| SessionError::Eof(io::Error::other(e)))
    }
}

/// Byte-granular reader over a [`SessionOutput`].
///
/// The scanner consumes output one byte at a time; whatever remains of a
/// partially consumed chunk stays buffered here and is the first thing the
/// relay drain emits.
pub struct ByteStream<S> {
    source: S,
    pending: Bytes,
}

impl<S: SessionOutput> ByteStream<S> {
    /// Wrap a session output stream.
    pub fn new(source: S) -> Self {
        Self {
            source,
            pending: Bytes::new(),
        }
    }

    /// Read exactly one byte, or `None` at end of stream.
    pub async fn next_byte(&mut self) -> Result<Option<u8>, SessionError> {
        while self.pending.is_empty() {
            match self.source.recv().await? {
                Some(chunk) => self.pending = chunk,
                None => return Ok(None),
            }
        }
        let byte = self.pending[0];
        self.pending.advance(1);
        Ok(Some(byte))
    }

    /// Read the next chunk, starting with any partially consumed remainder.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, SessionError> {
        if !self.pending.is_empty() {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }
        self.source.recv().await
    }

    /// Exit status reported by the underlying session, if any.
    pub fn exit_status(&self) -> Option<u32> {
        self.source.exit_status()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedOutput;
    use super::*;

    #[tokio::test]
    async fn test_next_byte_spans_chunks() {
        let output = ScriptedOutput::new(&[b"ab" as &[u8], b"", b"c"]);
        let mut stream = ByteStream::new(output);

        assert_eq!(stream.next_byte().await.unwrap(), Some(b'a'));
        assert_eq!(stream.next_byte().await.unwrap(), Some(b'b'));
        // Empty chunks are skipped, not surfaced.
        assert_eq!(stream.next_byte().await.unwrap(), Some(b'c'));
        assert_eq!(stream.next_byte().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_chunk_returns_pending_remainder_first() {
        let output = ScriptedOutput::new(&[b"xyz" as &[u8], b"rest"]);
        let mut stream = ByteStream::new(output);

        assert_eq!(stream.next_byte().await.unwrap(), Some(b'x'));

        // The unconsumed tail of the first chunk comes before new data.
        assert_eq!(stream.next_chunk().await.unwrap().unwrap().as_ref(), b"yz");
        assert_eq!(
            stream.next_chunk().await.unwrap().unwrap().as_ref(),
            b"rest"
        );
        assert_eq!(stream.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exit_status_after_drain() {
        let output = ScriptedOutput::new(&[b"hi" as &[u8]]).with_exit_status(Some(3));
        let mut stream = ByteStream::new(output);

        assert!(stream.exit_status().is_none());
        while stream.next_chunk().await.unwrap().is_some() {}
        assert_eq!(stream.exit_status(), Some(3));
    }
}
