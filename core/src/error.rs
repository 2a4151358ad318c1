//! Error types for the API client.
//!
//! # Design
//! `RequestError` is the one normalized failure kind: anything that goes
//! wrong on the wire (network failure, 4xx/5xx status) and a single-object
//! fetch that did not return exactly one object. Everything else indicates a
//! programming or contract error and keeps its own variant on `Error`:
//! arguments that cannot be serialized, and bodies that are not the JSON
//! shape the caller asked for.

use thiserror::Error;

/// Boxed error raised by a `Transport` when no HTTP response was received.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of a request against the remote API.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The HTTP round-trip itself failed (DNS, connect, I/O).
    #[error("request error: {source}")]
    Transport {
        #[source]
        source: TransportError,
    },

    /// The server answered with a 4xx or 5xx status.
    #[error("request error: HTTP {status} from {url}")]
    Status { status: u16, url: String, body: String },

    #[error("request for single object returned no objects")]
    NoObjects,

    #[error("request for single object returned {0} objects")]
    MultipleObjects(usize),
}

/// A caller-supplied argument that has no wire representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// A domain object exposes neither a uuid nor an id.
    #[error("object has no uuid or id to reference it by")]
    MissingIdentity,

    /// A list bound for a query string holds an unset element, which has no
    /// text form to join.
    #[error("list element is unset and cannot be joined into a query value")]
    NullListElement,

    #[error("non-finite float {0} cannot be serialized")]
    NonFiniteFloat(String),
}

/// Every error a `TembaClient` operation can return.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// The response body was not valid JSON, or not the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A JSON body was required but the server returned nothing.
    #[error("empty response from {url}")]
    EmptyBody { url: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
