//! dashlink-client: async session client for the app server protocol
//!
//! This crate implements the client side of the binary request/response
//! protocol spoken on an app server's SSL port: frame traffic, login
//! credential hashing, and the correlation layer that matches
//! asynchronously delivered responses to outstanding calls.
//!
//! It works against private servers only; the public cloud requires SSL
//! client authentication this client does not perform.
//!
//! The pieces:
//!
//! - [`AppClient`] — the façade: one operation per protocol command
//! - [`ClientConfig`] — endpoint, certificate policy and timeouts
//! - [`Reply`] / [`ClientError`] — what a settled call carries
//! - [`transport`] — the production TLS path (the engine itself runs over
//!   any `AsyncRead + AsyncWrite` stream)

mod client;
mod dispatch;
mod registry;

pub mod config;
pub mod error;
pub mod transport;

pub use client::AppClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use registry::Reply;

// Protocol types that appear in the public API surface
pub use dashlink_protocol::{PinKind, PinOp, Status, Widget};
