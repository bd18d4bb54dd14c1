//! Blocking client for the Sheldon graph service.
//!
//! # Overview
//! Sheldon stores typed nodes and typed, directed edges and exposes them over
//! HTTP+JSON. `SheldonClient` turns method calls into requests and responses
//! into `Node`, `Edge`, booleans or collections.
//!
//! # Design
//! - `urls` and `parse` are pure; all I/O goes through the `Transport`
//!   trait, so the client is testable without a network.
//! - Each operation expects one exact status code. Anything else yields the
//!   operation's failure value (`false`, `None`, empty list); transport and
//!   decode failures are `Err(ApiError)`.
//! - Configuration belongs to the client instance. `with_host` overrides the
//!   host for the duration of a closure and restores it on every exit path.
//! - Requests are logged through `tracing`; the crate never installs a
//!   subscriber.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod parse;
pub mod types;
pub mod urls;

pub use client::SheldonClient;
pub use config::{Config, DEFAULT_HOST};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{
    CreateEdge, CreateNode, Edge, Element, HighScoreFilter, Id, Node, Payload, SearchIndex,
};
