#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;

use tempfile::TempDir;

pub const TEST_BOUNDARY: &str = "----portdrop-test-boundary";

/// Ask the OS for a free port, then release it for the code under test.
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind to ephemeral port")
        .local_addr()
        .expect("local addr")
        .port()
}

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write `content` as `name` inside `dir` and return the path.
pub async fn write_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, content)
        .await
        .expect("write test file");
    path
}

/// A minimal single-part multipart/form-data body the way a browser builds
/// one: `Content-Type:` part header unquoted, closing delimiter at the end.
pub fn multipart_body(boundary: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
