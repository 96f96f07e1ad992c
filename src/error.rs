use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type Result<T, E = GridError> = std::result::Result<T, E>;

/// Everything that can go wrong between a façade call and its typed result.
#[derive(Debug, Error)]
pub enum GridError {
    /// A required input was missing or malformed; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// Credentials or base URL are missing or unreadable.
    #[error("not configured: {0}")]
    Config(String),

    #[error("could not connect to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{}", format_http_failure(.status, .url, .body))]
    Http {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// The service answered with a success status but embedded an error in the body.
    #[error("GRiD returned an error (HTTP {status}): {message}")]
    Application { status: StatusCode, message: String },

    #[error("failed to decode response: {0}")]
    Deserialize(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl GridError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// HTTP status associated with the failure, when a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } | Self::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Minimal shape GRiD uses to report failures, sometimes inside a 200 response.
///
/// Success payloads may share fields with this shape, so it is only ever used to
/// probe for a non-empty `error` before the full decode.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub(crate) error: Option<Value>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl ErrorEnvelope {
    /// The embedded error text, if the envelope carries a non-empty one.
    pub(crate) fn error_message(&self) -> Option<String> {
        let text = match self.error.as_ref()? {
            Value::Null => return None,
            Value::Bool(false) => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Array(items) if items.is_empty() => return None,
            Value::Object(map) if map.is_empty() => return None,
            other => other.to_string(),
        };
        if text.is_empty() {
            return None;
        }

        match self.message.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() && m != text => Some(format!("{text} ({m})")),
            _ => Some(text),
        }
    }
}

const BODY_EXCERPT_LEN: usize = 512;

fn excerpt(body: &str) -> &str {
    let body = body.trim();
    if body.len() <= BODY_EXCERPT_LEN {
        return body;
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

pub(crate) fn format_http_failure(status: &StatusCode, url: &str, body: &str) -> String {
    let server = excerpt(body);

    if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN {
        return format!(
            "GRiD authentication/authorization failed (HTTP {}).\n- Check the username, password and API key stored by `grid configure`\n- Re-run `grid configure` if your password changed\n\nServer message: {}\nrequest: {}",
            status.as_u16(),
            server,
            url
        );
    }

    if *status == StatusCode::NOT_FOUND {
        return format!(
            "GRiD resource not found (HTTP 404).\n- The primary key may not exist or may belong to another resource type\n- Check the configured base URL (`grid configure -b <url>`)\n\nServer message: {}\nrequest: {}",
            server, url
        );
    }

    format!(
        "API request failed: HTTP {} for url ({})\n{}",
        status.as_u16(),
        url,
        server
    )
}
