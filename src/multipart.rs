//! Hand-written multipart/form-data decoder.
//!
//! Extracts a single file part from a raw request body without a parsing
//! framework. The scan walks byte offsets, never decoded strings, so binary
//! payloads containing header-lookalike sequences decode correctly: header
//! markers are only searched before the body starts, and the boundary search
//! is a raw byte comparison.

use thiserror::Error;

const FILENAME_MARKER: &[u8] = b"filename=\"";
const CONTENT_TYPE_MARKER: &[u8] = b"content-type=\"";
const HEADER_END: &[u8] = b"\r\n\r\n";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One decoded file part. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Sanitized basename, no path separators
    pub name: String,
    /// Advisory content type from the part headers
    pub content_type: String,
    /// Exact body bytes of the part
    pub content: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no filename field in multipart body")]
    MissingFilename,
    #[error("filename field is not terminated")]
    UnterminatedFilename,
    #[error("content type value is not terminated")]
    UnterminatedContentType,
    #[error("multipart headers are not terminated")]
    MissingHeaderEnd,
    #[error("no boundary delimiter after content start")]
    MissingDelimiter,
    #[error("filename is not valid UTF-8")]
    InvalidFilename,
}

/// Scanner phases, advanced strictly left to right over the body.
///
/// `header_end` is resolved as soon as the filename is known so that the
/// remaining header scans never reach into the content region; that is what
/// keeps header-lookalike byte sequences inside the payload harmless.
enum Scan {
    SeekFilename,
    SeekContentType {
        filename_end: usize,
        header_end: usize,
    },
    SeekBodyStart {
        header_end: usize,
    },
    SeekDelimiter {
        content_start: usize,
    },
}

/// Decode a single-part multipart body. `boundary` is the token from the
/// request's Content-Type header, without the leading dashes.
pub fn decode(body: &[u8], boundary: &str) -> Result<UploadedFile, DecodeError> {
    let mut name = String::new();
    let mut content_type = DEFAULT_CONTENT_TYPE.to_string();
    let mut scan = Scan::SeekFilename;

    loop {
        scan = match scan {
            Scan::SeekFilename => {
                let marker = find(body, FILENAME_MARKER, 0).ok_or(DecodeError::MissingFilename)?;
                let start = marker + FILENAME_MARKER.len();
                let end = start
                    + find(&body[start..], b"\"", 0).ok_or(DecodeError::UnterminatedFilename)?;
                name = sanitize_name(
                    std::str::from_utf8(&body[start..end])
                        .map_err(|_| DecodeError::InvalidFilename)?,
                );
                let header_end =
                    find(body, HEADER_END, end).ok_or(DecodeError::MissingHeaderEnd)?;
                Scan::SeekContentType {
                    filename_end: end,
                    header_end,
                }
            }
            Scan::SeekContentType {
                filename_end,
                header_end,
            } => {
                // Optional; absent from the header region means the default
                // applies
                if let Some(marker) = find(&body[..header_end], CONTENT_TYPE_MARKER, filename_end) {
                    let start = marker + CONTENT_TYPE_MARKER.len();
                    let end = start
                        + find(&body[start..header_end + 2], b"\r\n", 0)
                            .ok_or(DecodeError::UnterminatedContentType)?;
                    content_type = String::from_utf8_lossy(&body[start..end]).into_owned();
                }
                Scan::SeekBodyStart { header_end }
            }
            Scan::SeekBodyStart { header_end } => Scan::SeekDelimiter {
                content_start: header_end + HEADER_END.len(),
            },
            Scan::SeekDelimiter { content_start } => {
                let closing = [b"\r\n--", boundary.as_bytes(), b"--"].concat();
                let next_part = [b"\r\n--", boundary.as_bytes()].concat();

                let content_end = find(body, &closing, content_start)
                    .or_else(|| find(body, &next_part, content_start))
                    .ok_or(DecodeError::MissingDelimiter)?;

                if content_end <= content_start {
                    return Err(DecodeError::MissingDelimiter);
                }

                return Ok(UploadedFile {
                    name,
                    content_type,
                    content: body[content_start..content_end].to_vec(),
                });
            }
        };
    }
}

/// First offset of `needle` in `haystack` at or after `from`, by raw byte
/// comparison.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() || from > haystack.len() - needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

/// Strip any path components a client may have smuggled into the filename.
fn sanitize_name(raw: &str) -> String {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .trim()
        .to_string();
    if base.is_empty() {
        "unnamed-file".to_string()
    } else {
        base
    }
}
