//! Error types for the Sheldon client.
//!
//! # Design
//! Statuses an operation explicitly expects to fail with (404 on a lookup,
//! anything but 200 on a delete) are not errors: the facade folds them into
//! `false`, `None` or an empty list. `ApiError` covers what is left over:
//! transport failures, undecodable bodies, and the few places where the
//! service answers with something the client cannot interpret.

use crate::types::Id;

/// Errors returned by `SheldonClient` operations and the response parser.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS,
    /// timeout, broken body stream).
    #[error("transport failed: {0}")]
    TransportError(String),

    /// The service answered with a status the operation cannot fold into a
    /// failure sentinel.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A collection element had the other shape than the operation returns.
    #[error("expected {expected}-shaped element, found {found}")]
    UnexpectedElement {
        expected: &'static str,
        found: &'static str,
    },

    /// The `/status` document has no `schema` object.
    #[error("status document has no schema")]
    MissingSchema,

    /// An edge points at a node the service could not return.
    #[error("neighbour node {0} could not be fetched")]
    MissingNeighbour(Id),
}

impl ApiError {
    pub(crate) fn decode(err: serde_json::Error) -> Self {
        ApiError::DeserializationError(err.to_string())
    }
}
