//! Upload and download endpoints.
//!
//! Upload: raw multipart body in, transfer code out. Download: relay the
//! one-shot TCP transfer for a code back over HTTP as an attachment.

use anyhow::Context;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Response};
use axum::Json;
use tokio_util::io::ReaderStream;

use crate::common::AppError;
use crate::multipart;
use crate::server::AppState;
use crate::transfer::{self, ServeOptions};

#[derive(serde::Serialize)]
pub struct OfferResponse {
    pub code: u16,
}

/// Decode the uploaded file, stage it, allocate a code, and spawn the
/// one-shot transfer task for that code.
pub async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<OfferResponse>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing Content-Type header".to_string()))?;

    if !content_type.starts_with("multipart/form-data") {
        return Err(AppError::BadRequest(
            "Content-Type must be multipart/form-data".to_string(),
        ));
    }
    let boundary = extract_boundary(content_type)
        .ok_or_else(|| AppError::BadRequest("no boundary in Content-Type".to_string()))?;

    let file = multipart::decode(&body, boundary)?;
    let path = state.store.save(&file).await?;
    let code = state.registry.offer(&path)?;

    // One task per offered code; it holds the port until a client connects,
    // the accept timeout fires, or shutdown cancels it.
    let options = ServeOptions {
        accept_timeout: state.config.accept_timeout(),
        cancel: state.shutdown.child_token(),
    };
    let registry = state.registry.clone();
    tokio::spawn(async move {
        if let Err(err) = transfer::serve(&registry, code, options).await {
            tracing::warn!(code, error = %err, "serve task ended without a transfer");
        }
    });

    Ok(Json(OfferResponse { code }))
}

/// Pull the file for `code` over the raw socket and relay it to the HTTP
/// client as an attachment.
pub async fn download_handler(
    Path(code): Path<u16>,
    State(state): State<AppState>,
) -> Result<Response<Body>, AppError> {
    // Resolve first so an unregistered code is a prompt 404, not a dial
    if state.registry.lookup(code).is_none() {
        return Err(AppError::NotFound(format!(
            "no file offered under code {code}"
        )));
    }

    let fetched = match transfer::fetch("127.0.0.1", code).await {
        Ok(fetched) => fetched,
        Err(transfer::TransferError::Io(err))
            if err.kind() == std::io::ErrorKind::ConnectionRefused =>
        {
            // Registry entry outlives the socket; the one transfer already
            // happened or the listener is gone.
            return Err(AppError::NotFound(format!(
                "code {code} is no longer being served"
            )));
        }
        Err(err) => return Err(err.into()),
    };

    let disposition = content_disposition(&fetched.name);
    let stream = ReaderStream::new(fetched.into_reader());

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .context("build download response")?)
}

/// Attachment header for `name`. Quotes would close the quoted-string early
/// and control characters are not valid in a header value, so both are
/// dropped from the advertised filename.
fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// `boundary=` token from a multipart Content-Type value.
fn extract_boundary(content_type: &str) -> Option<&str> {
    let boundary = content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))?;
    let boundary = boundary.trim_matches('"');
    (!boundary.is_empty()).then_some(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_drops_quotes_and_control_chars() {
        assert_eq!(
            content_disposition("plain.txt"),
            "attachment; filename=\"plain.txt\""
        );
        assert_eq!(
            content_disposition("evil\".txt\r\nX-Injected: 1"),
            "attachment; filename=\"evil.txtX-Injected: 1\""
        );
    }

    #[test]
    fn boundary_extraction() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=----WebKit123"),
            Some("----WebKit123")
        );
        assert_eq!(
            extract_boundary("multipart/form-data; charset=utf-8; boundary=\"quoted\""),
            Some("quoted")
        );
        assert_eq!(extract_boundary("multipart/form-data"), None);
        assert_eq!(extract_boundary("multipart/form-data; boundary="), None);
    }
}
