//! Serve side of a transfer session: bind the code's port, admit one client,
//! stream the file, tear down.

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::config::CHUNK_SIZE;
use crate::registry::{SessionRegistry, SessionState};
use crate::transfer::{protocol, TransferError};

/// Supervision knobs for a single `serve` call.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Give up if no client connects within this window. `None` waits
    /// indefinitely, which holds the task and the port until cancellation.
    pub accept_timeout: Option<Duration>,
    /// Cooperative cancellation while still waiting for a client. An
    /// in-flight transfer is not interrupted.
    pub cancel: CancellationToken,
}

/// Run one transfer session to completion.
///
/// Looks up `code`, binds a listener on that port, accepts exactly one
/// connection, then drops the listener so the port is free before the bytes
/// flow. The caller runs this on its own task; the returned result is the
/// session outcome, and the registry entry records it too.
pub async fn serve(
    registry: &SessionRegistry,
    code: u16,
    options: ServeOptions,
) -> Result<(), TransferError> {
    let path = match registry.lookup(code) {
        Some(path) => path,
        None => {
            tracing::warn!(code, "serve requested for unregistered code");
            return Err(TransferError::UnknownCode(code));
        }
    };

    // Claiming Offered -> Serving atomically rejects a second serve of the
    // same code before any socket is bound.
    if registry.transition(code, SessionState::Serving).is_err() {
        tracing::warn!(code, "serve requested for already-consumed code");
        return Err(TransferError::AlreadyConsumed(code));
    }

    let listener = match TcpListener::bind(("0.0.0.0", code)).await {
        Ok(listener) => listener,
        Err(source) => {
            tracing::error!(code, error = %source, "failed to bind transfer port");
            let _ = registry.transition(code, SessionState::Failed);
            return Err(TransferError::Bind { code, source });
        }
    };
    tracing::info!(code, file = %path.display(), "serving file");

    let accepted = wait_for_client(&listener, code, &options).await;
    // Listener goes away as soon as accept resolves; exactly one client is
    // ever admitted and the port is released even though the registry entry
    // stays behind.
    drop(listener);

    let stream = match accepted {
        Ok(stream) => stream,
        Err(err) => {
            let _ = registry.transition(code, SessionState::Failed);
            return Err(err);
        }
    };

    match send_file(stream, &path).await {
        Ok(bytes) => {
            tracing::info!(code, bytes, "transfer complete");
            let _ = registry.transition(code, SessionState::Completed);
            Ok(())
        }
        Err(err) => {
            tracing::error!(code, error = %err, "transfer aborted");
            let _ = registry.transition(code, SessionState::Failed);
            Err(err)
        }
    }
}

async fn wait_for_client(
    listener: &TcpListener,
    code: u16,
    options: &ServeOptions,
) -> Result<TcpStream, TransferError> {
    let accept = async {
        let (stream, peer) = listener.accept().await?;
        tracing::info!(code, %peer, "client connected");
        Ok::<_, std::io::Error>(stream)
    };

    match options.accept_timeout {
        Some(window) => tokio::select! {
            _ = options.cancel.cancelled() => Err(TransferError::Cancelled),
            _ = tokio::time::sleep(window) => Err(TransferError::AcceptTimeout(code)),
            result = accept => Ok(result?),
        },
        None => tokio::select! {
            _ = options.cancel.cancelled() => Err(TransferError::Cancelled),
            result = accept => Ok(result?),
        },
    }
}

/// Write the header line then the file in fixed-size chunks until EOF.
/// Returns the content byte count. Any I/O error aborts the transfer; the
/// connection close is the only end-of-stream signal the peer gets.
async fn send_file(stream: TcpStream, path: &Path) -> Result<u64, TransferError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed-file".to_string());

    let mut file = File::open(path).await?;
    let mut sink = BufWriter::new(stream);

    sink.write_all(&protocol::encode_header(&name)).await?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut sent = 0u64;
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        sink.write_all(&buffer[..read]).await?;
        sent += read as u64;
    }

    sink.flush().await?;
    sink.into_inner().shutdown().await?;
    Ok(sent)
}
