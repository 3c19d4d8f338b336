//! Core components for building multicloud driver crates.
//!
//! This crate provides the foundation the stratus drivers share. It defines
//! the transport and environment abstractions, the common error type, the
//! provider-independent resource model, and the decoding helpers query-style
//! cloud APIs need.
//!
//! ## Overview
//!
//! The crate is built around a few key pieces:
//!
//! - **Context**: a cheaply clonable container holding the HTTP transport
//!   and environment access a driver runs against
//! - **Error**: one error type with a kind taxonomy shared by every driver
//! - **Model**: capability traits ([`model::CloudDisk`],
//!   [`model::CloudLoadbalancer`], ...) that drivers implement for their
//!   resources
//! - **Decoding**: [`xml`] turns provider XML into JSON trees, [`value`]
//!   decodes and overlays them
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use stratus_core::{Context, HttpSend, Result};
//!
//! /// A transport that talks to a fixed test server.
//! #[derive(Debug)]
//! struct LocalSend;
//!
//! #[async_trait]
//! impl HttpSend for LocalSend {
//!     async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
//!         // hand the request to your HTTP client of choice
//!         todo!()
//!     }
//! }
//!
//! # fn main() {
//! let ctx = Context::default().with_http_send(LocalSend);
//! # let _ = ctx;
//! # }
//! ```
//!
//! ## Traits
//!
//! - [`HttpSend`]: for sending HTTP requests
//! - [`Env`]: for environment variable access
//! - [`model::CloudResource`] and the capability traits built on it
//!
//! ## Utilities
//!
//! - [`hash`]: HMAC and digest helpers for request signing
//! - [`time`]: timestamp formatting and parsing
//! - [`xml`]: XML to JSON tree conversion
//! - [`value`]: JSON tree decoding and refresh overlays
//! - [`utils`]: general utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod model;
pub mod time;
pub mod utils;
pub mod value;
pub mod xml;

mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};

mod error;
pub use error::{Error, ErrorKind, Result};
