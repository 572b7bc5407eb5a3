//! Fetch side of a transfer session: connect to a code's port, read the
//! header line, then drain the stream until the sender closes it.

use tokio::io::{AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::net::TcpStream;

use crate::transfer::{protocol, TransferError};

/// An accepted transfer: the advertised name plus the not-yet-read content.
///
/// The reader is single-pass; the content has no length field, so it runs
/// until the peer closes the connection.
pub struct FetchedFile {
    pub name: String,
    reader: BufReader<TcpStream>,
}

impl FetchedFile {
    /// Consume the stream, yielding the buffered reader over the content.
    pub fn into_reader(self) -> BufReader<TcpStream> {
        self.reader
    }

    /// Drain all content into `sink`, returning the byte count.
    pub async fn write_to<W>(mut self, sink: &mut W) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        Ok(tokio::io::copy(&mut self.reader, sink).await?)
    }
}

/// Connect to `host:code` and read the transfer header.
///
/// Fails with `MalformedHeader` if the first line does not carry the
/// `FileName:` prefix; the connection being refused means the code's one
/// transfer already happened (or never existed).
pub async fn fetch(host: &str, code: u16) -> Result<FetchedFile, TransferError> {
    let stream = TcpStream::connect((host, code)).await?;
    tracing::debug!(host, code, "connected to sender");

    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line).await?;

    let name = protocol::parse_header(&line)?;
    tracing::info!(code, name = %name, "receiving file");

    Ok(FetchedFile { name, reader })
}
