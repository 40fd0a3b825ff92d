//! Error types for the Jenkins API client.
//!
//! # Design
//! `HttpStatus` renders as the raw response body and nothing else. Jenkins
//! puts its diagnostic (stack trace, "No such job", ...) in the body, and
//! callers surface that text directly. Every other variant is prefixed with
//! the stage that failed.

use thiserror::Error;

use crate::xml::NodeId;

/// Errors returned by `JenkinsClient` and the transports that feed it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, DNS, TLS or I/O failure while talking to the server.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status other than 200.
    #[error("{body}")]
    HttpStatus { status: u16, body: String },

    /// The response body was not well-formed XML.
    #[error("invalid XML response: {0}")]
    Parse(#[from] XmlError),

    /// The request could not be constructed (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while parsing or mutating an XML document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    /// Attributes were requested on a node that cannot carry them.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Children were requested under a text or comment node.
    #[error("node {0} cannot have children")]
    NotAContainer(NodeId),
}

/// Errors raised by `ClientConfig` validation and loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("server address must not be empty")]
    EmptyServer,

    #[error("server address must start with http:// or https://, got {0:?}")]
    UnsupportedScheme(String),

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
