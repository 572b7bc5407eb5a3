//! One-shot TCP transfer: a listener per code sends the file to exactly one
//! client, which reads a single header line and then bytes until close.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{fetch, FetchedFile};
pub use server::{serve, ServeOptions};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no file is registered for code {0}")]
    UnknownCode(u16),
    #[error("code {0} was already served")]
    AlreadyConsumed(u16),
    #[error("failed to bind port {code}: {source}")]
    Bind {
        code: u16,
        source: std::io::Error,
    },
    #[error("timed out waiting for a client on port {0}")]
    AcceptTimeout(u16),
    #[error("transfer cancelled before a client connected")]
    Cancelled,
    #[error("malformed transfer header: {0:?}")]
    MalformedHeader(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
