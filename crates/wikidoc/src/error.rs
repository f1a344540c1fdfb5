use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Failures raised by a [`Transport`](crate::transport::Transport) before a reply could be
/// interpreted. Each variant keeps whatever raw payload the remote side produced.
#[derive(Clone, Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("received HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("api error [{code}]: {info}")]
    Api {
        code: String,
        info: String,
        payload: Value,
    },
}

impl TransportError {
    /// Raw reply attached to the failure, if the server sent one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            TransportError::Api { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// High-level error type shared across wikidoc components.
///
/// `Clone` so that a single in-flight fetch can hand the same failure to every waiter.
#[derive(Clone, Debug, Error)]
pub enum WikidocError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("document not found: {title}")]
    NotFound { title: String, payload: Value },
    #[error("write rejected for {title}: {payload}")]
    WriteRejected { title: String, payload: Value },
    #[error("unexpected response ({context}): {payload}")]
    UnexpectedResponse { context: String, payload: Value },
    #[error("template tree error: {0}")]
    TemplateTree(String),
    #[error("title error: {0}")]
    Title(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_yaml::Error> for WikidocError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for WikidocError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl WikidocError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            WikidocError::UnexpectedResponse { context, payload } => {
                WikidocError::UnexpectedResponse {
                    context: format!("{ctx}: {context}"),
                    payload,
                }
            }
            WikidocError::TemplateTree(msg) => WikidocError::TemplateTree(format!("{ctx}: {msg}")),
            WikidocError::Title(msg) => WikidocError::Title(format!("{ctx}: {msg}")),
            WikidocError::Config(msg) => WikidocError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }

    /// The raw remote payload carried by this failure, when there is one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            WikidocError::Transport(err) => err.payload(),
            WikidocError::NotFound { payload, .. }
            | WikidocError::WriteRejected { payload, .. }
            | WikidocError::UnexpectedResponse { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_prefixes_message_variants() {
        let err = WikidocError::Config("missing api_url".into()).context("wiki.yaml");
        assert_eq!(err.to_string(), "configuration error: wiki.yaml: missing api_url");
    }

    #[test]
    fn payload_is_reachable_through_transport_errors() {
        let err = WikidocError::from(TransportError::Api {
            code: "badtoken".into(),
            info: "Invalid CSRF token.".into(),
            payload: json!({"error": {"code": "badtoken"}}),
        });
        assert_eq!(
            err.payload().and_then(|p| p.pointer("/error/code")),
            Some(&json!("badtoken"))
        );
    }
}
