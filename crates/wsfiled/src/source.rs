//! Content sources: local files and remote HTTP resources.
//!
//! Both produce the resource's full byte content as one in-memory sequence;
//! chunking for the wire happens downstream in the streaming pipeline.

use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use thiserror::Error;
use tracing::debug;

/// Errors producing a resource's content.
///
/// Clone so the response cache can hand one fetch failure to every waiter
/// of a single-flight fetch; variants carry rendered messages instead of the
/// non-cloneable underlying errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("read failed for {path}: {message}")]
    Io { path: String, message: String },
    #[error("upstream fetch failed for {url}: {message}")]
    Upstream { url: String, message: String },
}

/// Read a local file into memory. No transcoding.
pub async fn read_file(path: &str) -> Result<Bytes, SourceError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Bytes::from(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SourceError::NotFound(path.to_string()))
        }
        Err(e) => Err(SourceError::Io {
            path: path.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Fetch a remote resource over HTTP GET.
///
/// Declares acceptance of gzip/deflate and inflates the body itself when the
/// upstream answers `Content-Encoding: gzip`; anything else passes through
/// unchanged. Non-2xx statuses are not special-cased: whatever body the
/// upstream returns is what gets streamed.
pub async fn fetch_url(client: &reqwest::Client, url: &str) -> Result<Bytes, SourceError> {
    let upstream = |e: &dyn std::fmt::Display| SourceError::Upstream {
        url: url.to_string(),
        message: e.to_string(),
    };

    let resp = client
        .get(url)
        .header(ACCEPT_ENCODING, "gzip,deflate")
        .send()
        .await
        .map_err(|e| upstream(&e))?;

    let gzipped = resp
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

    let body = resp.bytes().await.map_err(|e| upstream(&e))?;

    if gzipped {
        debug!(url, compressed_len = body.len(), "inflating gzip body");
        let mut inflated = Vec::new();
        GzDecoder::new(body.as_ref())
            .read_to_end(&mut inflated)
            .map_err(|e| upstream(&e))?;
        Ok(Bytes::from(inflated))
    } else {
        Ok(body)
    }
}
