//! Response classification.
//!
//! GRiD sometimes reports failures inside a `200 OK` body, and its error shape
//! overlaps with some success payloads. Classification therefore always probes
//! for a non-empty `error` field before decoding the real target type.

use indicatif::ProgressBar;
use reqwest::StatusCode;
use reqwest::blocking::Response;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{Read, Write};

use crate::error::{ErrorEnvelope, GridError, Result};

/// Terminal state of one API call.
#[derive(Debug)]
pub enum Outcome {
    /// The request never produced a response (DNS, TLS, connect, timeout).
    TransportFailure(GridError),
    /// Status outside `200..=299`; the body is kept as text and never decoded.
    HttpFailure {
        status: StatusCode,
        url: String,
        body: String,
    },
    /// Nominal success status with an error embedded in the body.
    ApplicationFailure { status: StatusCode, message: String },
    Success {
        status: StatusCode,
        url: String,
        body: Vec<u8>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The raw body of a successful response.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::TransportFailure(err) => Err(err),
            Self::HttpFailure { status, url, body } => Err(GridError::Http { status, url, body }),
            Self::ApplicationFailure { status, message } => {
                Err(GridError::Application { status, message })
            }
        }
    }

    /// Decodes a successful body into `T`; failures pass through untouched.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let url = match &self {
            Self::Success { url, .. } => url.clone(),
            _ => String::new(),
        };
        let body = self.into_result()?;
        serde_json::from_slice(&body)
            .map_err(|e| GridError::Deserialize(format!("{e} (url={url})")))
    }
}

/// Classifies the result of [`crate::transport::Transport::send`], reading the
/// whole body.
pub fn classify(sent: Result<Response>) -> Outcome {
    let response = match sent {
        Ok(response) => response,
        Err(err) => return Outcome::TransportFailure(err),
    };

    let status = response.status();
    let url = response.url().to_string();
    match response.bytes() {
        Ok(body) => classify_body(status, url, body.to_vec()),
        Err(source) => Outcome::TransportFailure(GridError::Transport { url, source }),
    }
}

/// Steps after the body has been read: status range, then the embedded-error
/// probe, then success.
pub fn classify_body(status: StatusCode, url: String, body: Vec<u8>) -> Outcome {
    if !status.is_success() {
        return Outcome::HttpFailure {
            status,
            url,
            body: String::from_utf8_lossy(&body).into_owned(),
        };
    }

    // Only JSON objects can carry the envelope; a derived struct would also
    // accept a positional array.
    let envelope = match serde_json::from_slice::<Value>(&body) {
        Ok(value @ Value::Object(_)) => serde_json::from_value::<ErrorEnvelope>(value).ok(),
        _ => None,
    };
    if let Some(envelope) = envelope {
        if let Some(message) = envelope.error_message() {
            tracing::debug!(%url, %message, "error embedded in successful response");
            return Outcome::ApplicationFailure { status, message };
        }
    }

    Outcome::Success { status, url, body }
}

/// Streams a successful body into `sink` instead of buffering it.
///
/// JSON bodies are still buffered and probed for an embedded error, since a
/// download endpoint answers with JSON only when something went wrong.
/// Returns the response headers and the number of bytes written.
pub(crate) fn stream_into<W: Write>(
    sent: Result<Response>,
    sink: &mut W,
    progress: Option<&ProgressBar>,
) -> Result<(HeaderMap, u64)> {
    let mut response = sent?;
    let status = response.status();
    let url = response.url().to_string();
    let headers = response.headers().clone();

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("json"));

    if !status.is_success() || is_json {
        let body = classify(Ok(response)).into_result()?;
        sink.write_all(&body)
            .map_err(|e| GridError::io("failed to write download", e))?;
        return Ok((headers, body.len() as u64));
    }

    if let (Some(pb), Some(len)) = (progress, response.content_length()) {
        pb.set_length(len);
    }

    let mut written: u64 = 0;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(GridError::io(format!("download from {url} interrupted"), e)),
        };
        sink.write_all(&buf[..n])
            .map_err(|e| GridError::io("failed to write download", e))?;
        written += n as u64;
        if let Some(pb) = progress {
            pb.inc(n as u64);
        }
    }
    sink.flush()
        .map_err(|e| GridError::io("failed to flush download", e))?;

    Ok((headers, written))
}
