//! Async PDU reader over a byte stream
//!
//! [`PduReader`] wraps any `tokio` [`AsyncRead`] (a `TcpStream`, a TLS
//! stream, one half of a split socket) and returns one decoded message per
//! call to [`PduReader::read_pdu`]. Reads are chunked; a chunk may carry
//! several PDUs, a fraction of one, or both. Extra messages are queued and
//! returned by the following calls before the stream is read again.

use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{BerError, BerResult};
use crate::session::{MessageGrammar, PduSession};
use crate::statistics::DecodeStatistics;

/// Reader settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Bytes requested from the stream per read
    pub chunk_size: usize,
    /// Read timeout (None = infinite)
    pub timeout: Option<Duration>,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ReaderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create reader settings with timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Reads PDUs from an async byte stream
pub struct PduReader<R, G: MessageGrammar> {
    stream: R,
    session: PduSession<G>,
    settings: ReaderSettings,
    chunk: Vec<u8>,
    pending: VecDeque<G::Message>,
    closed: bool,
}

impl<R, G> PduReader<R, G>
where
    R: AsyncRead + Unpin,
    G: MessageGrammar,
{
    /// Create a reader with default settings
    pub fn new(stream: R, grammar: G) -> Self {
        Self::with_session(stream, PduSession::new(grammar), ReaderSettings::default())
    }

    pub fn with_session(stream: R, session: PduSession<G>, settings: ReaderSettings) -> Self {
        let chunk = vec![0; settings.chunk_size.max(1)];
        Self {
            stream,
            session,
            settings,
            chunk,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    /// Read the next message
    ///
    /// # Returns
    /// `Ok(Some(message))` for each decoded PDU, `Ok(None)` once the stream
    /// has ended on a PDU boundary.
    ///
    /// # Error Handling
    /// - `Timeout` if a read does not complete within the configured timeout
    /// - `Connection` if the stream fails
    /// - `UnexpectedEof` if the stream ends inside a PDU
    /// - any decode error; the reader is closed, but messages decoded before
    ///   the error are still returned by later calls
    pub async fn read_pdu(&mut self) -> BerResult<Option<G::Message>> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }
            if self.closed {
                return Ok(None);
            }

            let n = self.read_chunk().await?;
            if n == 0 {
                self.closed = true;
                if self.session.has_partial_pdu() {
                    let buffered = self.session.buffered_bytes();
                    warn!("Stream closed with {} bytes of a partial PDU", buffered);
                    self.session.reset();
                    return Err(BerError::UnexpectedEof { buffered });
                }
                debug!("Stream closed on a PDU boundary");
                return Ok(None);
            }

            let mut input = &self.chunk[..n];
            if let Err(e) = self.session.feed(&mut input, &mut self.pending) {
                // The next PDU boundary is lost; only queued messages remain
                self.closed = true;
                return Err(e);
            }
        }
    }

    async fn read_chunk(&mut self) -> BerResult<usize> {
        let read = self.stream.read(&mut self.chunk);
        let result = match self.settings.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, read).await {
                Ok(result) => result,
                Err(_) => {
                    self.session.statistics_mut().increment_timeouts();
                    return Err(BerError::Timeout);
                }
            },
            None => read.await,
        };

        result.map_err(|e| {
            self.closed = true;
            BerError::Connection(e)
        })
    }

    /// Check if the stream has ended or failed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn session(&self) -> &PduSession<G> {
        &self.session
    }

    pub fn statistics(&self) -> &DecodeStatistics {
        self.session.statistics()
    }

    /// Give back the stream, dropping any queued message
    pub fn into_inner(self) -> R {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berstream_codec::ber::BerTag;
    use berstream_codec::tlv::{TlvTree, TreeGrammar};
    use tokio_test::io::Builder;

    fn bind_request(name: &[u8]) -> TlvTree {
        TlvTree::constructed(
            BerTag::SEQUENCE,
            vec![
                TlvTree::primitive(BerTag::INTEGER, vec![0x01]),
                TlvTree::constructed(
                    BerTag::application(true, 0),
                    vec![
                        TlvTree::primitive(BerTag::INTEGER, vec![0x03]),
                        TlvTree::primitive(BerTag::OCTET_STRING, name.to_vec()),
                        TlvTree::primitive(BerTag::context_specific(false, 0), b"secret".to_vec()),
                    ],
                ),
            ],
        )
    }

    #[tokio::test]
    async fn test_fragmented_reads() {
        let request = bind_request(b"cn=admin,dc=example,dc=com");
        let bytes = request.encode().unwrap();
        let mut builder = Builder::new();
        for fragment in bytes.chunks(5) {
            builder.read(fragment);
        }

        let mut reader = PduReader::new(builder.build(), TreeGrammar::new());
        assert_eq!(reader.read_pdu().await.unwrap(), Some(request));
        assert_eq!(reader.read_pdu().await.unwrap(), None);
        assert!(reader.is_closed());

        let stats = reader.statistics();
        assert_eq!(stats.pdus_decoded, 1);
        assert_eq!(stats.bytes_received, bytes.len() as u64);
        assert_eq!(stats.partial_feeds, (bytes.len() as u64).div_ceil(5) - 1);
    }

    #[tokio::test]
    async fn test_several_pdus_in_one_read() {
        let first = bind_request(b"alice");
        let second = bind_request(b"bob");
        let mut bytes = first.encode().unwrap();
        bytes.extend(second.encode().unwrap());

        let stream = Builder::new().read(&bytes).build();
        let mut reader = PduReader::new(stream, TreeGrammar::new());

        assert_eq!(reader.read_pdu().await.unwrap(), Some(first));
        assert_eq!(reader.read_pdu().await.unwrap(), Some(second));
        assert_eq!(reader.read_pdu().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_small_chunks() {
        let request = bind_request(b"carol");
        let bytes = request.encode().unwrap();

        let stream = Builder::new().read(&bytes).build();
        let settings = ReaderSettings::new().with_chunk_size(3).without_timeout();
        let mut reader =
            PduReader::with_session(stream, PduSession::new(TreeGrammar::new()), settings);

        assert_eq!(reader.read_pdu().await.unwrap(), Some(request));
        assert_eq!(reader.read_pdu().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_eof_inside_pdu() {
        let bytes = bind_request(b"dave").encode().unwrap();
        let stream = Builder::new().read(&bytes[..10]).build();
        let mut reader = PduReader::new(stream, TreeGrammar::new());

        let err = reader.read_pdu().await.unwrap_err();
        assert!(matches!(err, BerError::UnexpectedEof { buffered: 10 }));
        assert!(!reader.session().has_partial_pdu());
        assert_eq!(reader.read_pdu().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_decode_error_keeps_earlier_messages() {
        let good = bind_request(b"erin");
        let mut bytes = good.encode().unwrap();
        bytes.extend_from_slice(&[0x30, 0x80]);

        // What follows the rejected PDU must not be decoded as a new one
        let stream = Builder::new()
            .read(&bytes)
            .read(&[0x04, 0x01, 0x00, 0x05, 0x00])
            .build();
        let mut reader = PduReader::new(stream, TreeGrammar::new());

        let err = reader.read_pdu().await.unwrap_err();
        assert!(matches!(err, BerError::ReservedLengthForm(0x80)));
        assert!(reader.is_closed());
        assert_eq!(reader.read_pdu().await.unwrap(), Some(good));
        assert_eq!(reader.read_pdu().await.unwrap(), None);
        assert_eq!(reader.statistics().pdus_rejected, 1);
        assert_eq!(reader.statistics().pdus_decoded, 1);

        // The unread bytes are still in the stream
        let mut stream = reader.into_inner();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, vec![0x04, 0x01, 0x00, 0x05, 0x00]);
    }

    #[tokio::test]
    async fn test_connection_error() {
        let stream = Builder::new()
            .read(&[0x30, 0x03])
            .read_error(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut reader = PduReader::new(stream, TreeGrammar::new());

        let err = reader.read_pdu().await.unwrap_err();
        assert!(matches!(err, BerError::Connection(_)));
        assert!(reader.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let stream = Builder::new()
            .read(&[0x30, 0x03, 0x02])
            .wait(Duration::from_secs(60))
            .build();
        let settings = ReaderSettings::with_timeout(Duration::from_secs(1));
        let mut reader =
            PduReader::with_session(stream, PduSession::new(TreeGrammar::new()), settings);

        let err = reader.read_pdu().await.unwrap_err();
        assert!(matches!(err, BerError::Timeout));
        assert_eq!(reader.statistics().timeouts, 1);
        assert!(reader.session().has_partial_pdu());
        assert!(!reader.is_closed());
    }
}
