pub mod common;
pub mod multipart;
pub mod registry;
pub mod server;
pub mod storage;
pub mod transfer;

// Constants shared between the send and fetch sides of the wire protocol
pub mod config {
    /// Transfer chunk size on the raw TCP path
    pub const CHUNK_SIZE: usize = 4096;

    /// Header line prefix: `FileName:<name>\n`, no separating space
    pub const HEADER_PREFIX: &str = "FileName:";
}
