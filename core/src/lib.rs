//! Synchronous base client for the versioned RapidPro/Temba REST API.
//!
//! # Overview
//! Resource clients describe a call as an endpoint name plus keyword
//! arguments (`Args`). This crate serializes those arguments into a query
//! string or JSON body, performs the authenticated HTTP round-trip, follows
//! `next` cursors across pages, and normalizes failures into `RequestError`.
//!
//! # Design
//! - `TembaClient` holds only immutable configuration and a `Transport`;
//!   each call owns its own request and result accumulator.
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`),
//!   so the client logic runs unchanged against `UreqTransport` or a test
//!   double.
//! - Domain objects are passed by identity through the `Reference` trait,
//!   never as full object graphs.
//! - Debug output goes through `tracing` and never affects results.

pub mod client;
pub mod config;
pub mod datetime;
pub mod error;
pub mod http;
pub mod serialize;
pub mod transport;
pub mod types;
pub mod value;

pub use client::{Page, Pages, TembaClient};
pub use config::ClientConfig;
pub use datetime::{format_iso8601, parse_iso8601};
pub use error::{Error, RequestError, Result, SerializeError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use serialize::{build_body, build_params, serialize_value, Data, Mode};
pub use transport::{Transport, UreqTransport};
pub use types::{Broadcast, Contact, Flow, Group, Message};
pub use value::{Args, Identity, Reference, Value};
