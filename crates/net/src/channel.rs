//! Line-oriented message channel
//!
//! Wire format: one UTF-8 message per line, terminated by `\n`.
//! A trailing `\r` is tolerated on receive. Maximum line length: 64KB.

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tracing::trace;

use crate::error::{Error, Result};

/// Maximum accepted line length in bytes, excluding the terminator
const MAX_LINE_LEN: usize = 64 * 1024;

/// Outcome of a receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Line(String),
    /// The peer closed the stream
    EndOfStream,
}

/// Reading half of a channel
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Wait for the next complete line.
    ///
    /// Cancel-safe: bytes of a partially received line stay buffered and the
    /// next call picks up where this one stopped. An unterminated final line
    /// is returned as a line before `EndOfStream`.
    pub async fn receive_line(&mut self) -> Result<Received> {
        loop {
            let budget = (MAX_LINE_LEN + 1).saturating_sub(self.buf.len()) as u64;
            let n = (&mut self.inner)
                .take(budget)
                .read_until(b'\n', &mut self.buf)
                .await?;

            if self.buf.last() == Some(&b'\n') {
                return self.finish_line();
            }

            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(Received::EndOfStream);
                }
                return self.finish_line();
            }

            if self.buf.len() > MAX_LINE_LEN {
                self.buf.clear();
                return Err(Error::Protocol(format!(
                    "Line too long (max {} bytes)",
                    MAX_LINE_LEN
                )));
            }
        }
    }

    fn finish_line(&mut self) -> Result<Received> {
        let mut bytes = std::mem::take(&mut self.buf);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        let line = String::from_utf8(bytes)
            .map_err(|_| Error::Protocol("Line is not valid UTF-8".into()))?;
        trace!(len = line.len(), "Received line");
        Ok(Received::Line(line))
    }
}

/// Writing half of a channel
pub struct LineWriter<W> {
    inner: W,
    closed: bool,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: writer,
            closed: false,
        }
    }

    /// Write one line and flush it
    pub async fn send(&mut self, line: &str) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        if line.contains(['\n', '\r']) {
            return Err(Error::Protocol("Message contains a line break".into()));
        }
        if line.len() > MAX_LINE_LEN {
            return Err(Error::Protocol(format!(
                "Message too large: {} bytes (max {})",
                line.len(),
                MAX_LINE_LEN
            )));
        }

        self.inner.write_all(line.as_bytes()).await?;
        self.inner.write_all(b"\n").await?;

        // Flush so the peer sees the line now
        self.inner.flush().await?;

        trace!(len = line.len(), "Sent line");
        Ok(())
    }

    /// Shut down the write side; repeated calls do nothing
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// A duplex stream carrying one message per line
pub struct Channel<S> {
    reader: LineReader<ReadHalf<S>>,
    writer: LineWriter<WriteHalf<S>>,
}

impl<S: AsyncRead + AsyncWrite> Channel<S> {
    pub fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: LineReader::new(reader),
            writer: LineWriter::new(writer),
        }
    }

    pub async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.send(line).await
    }

    pub async fn receive_line(&mut self) -> Result<Received> {
        self.reader.receive_line().await
    }

    /// Close the channel; safe to call more than once
    pub async fn close(&mut self) -> Result<()> {
        self.writer.close().await
    }

    /// Borrow both halves at once, e.g. to read inside `select!` while writing elsewhere
    pub fn halves(&mut self) -> (&mut LineReader<ReadHalf<S>>, &mut LineWriter<WriteHalf<S>>) {
        (&mut self.reader, &mut self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_line_roundtrip() {
        let (a, b) = tokio::io::duplex(1024);
        let mut left = Channel::new(a);
        let mut right = Channel::new(b);

        left.send("hello").await.unwrap();
        left.send("").await.unwrap();
        left.send("world").await.unwrap();

        assert_eq!(right.receive_line().await.unwrap(), Received::Line("hello".into()));
        assert_eq!(right.receive_line().await.unwrap(), Received::Line("".into()));
        assert_eq!(right.receive_line().await.unwrap(), Received::Line("world".into()));
    }

    #[tokio::test]
    async fn test_end_of_stream_after_close() {
        let (a, b) = tokio::io::duplex(1024);
        let mut left = Channel::new(a);
        let mut right = Channel::new(b);

        left.send("bye").await.unwrap();
        left.close().await.unwrap();
        left.close().await.unwrap();

        assert_eq!(right.receive_line().await.unwrap(), Received::Line("bye".into()));
        assert_eq!(right.receive_line().await.unwrap(), Received::EndOfStream);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (a, _b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);
        channel.close().await.unwrap();
        assert!(matches!(channel.send("late").await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_crlf_and_unterminated_tail() {
        let mut reader = LineReader::new(Cursor::new(b"one\r\ntwo".to_vec()));
        assert_eq!(reader.receive_line().await.unwrap(), Received::Line("one".into()));
        assert_eq!(reader.receive_line().await.unwrap(), Received::Line("two".into()));
        assert_eq!(reader.receive_line().await.unwrap(), Received::EndOfStream);
    }

    #[tokio::test]
    async fn test_embedded_newline_rejected() {
        let mut writer = LineWriter::new(Vec::new());
        assert!(matches!(
            writer.send("a\nb").await,
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_line_rejected() {
        let data = vec![b'x'; MAX_LINE_LEN + 10];
        let mut reader = LineReader::new(Cursor::new(data));
        assert!(matches!(
            reader.receive_line().await,
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let mut reader = LineReader::new(Cursor::new(vec![0xff, 0xfe, b'\n']));
        assert!(matches!(
            reader.receive_line().await,
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_line_survives_cancellation() {
        let (mut raw, b) = tokio::io::duplex(64);
        let mut reader = LineReader::new(b);

        raw.write_all(b"QUEST").await.unwrap();
        let first = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            reader.receive_line(),
        )
        .await;
        assert!(first.is_err());

        raw.write_all(b"IONS_END\n").await.unwrap();
        assert_eq!(
            reader.receive_line().await.unwrap(),
            Received::Line("QUESTIONS_END".into())
        );
    }
}
