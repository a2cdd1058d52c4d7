//! dashlink-protocol: Wire protocol for the dashlink app session engine
//!
//! This crate defines the binary frame format, the command and status code
//! tables, structured command values, and the credential-hash derivation
//! used when talking to an app server over its TLS port.

pub mod auth;
pub mod codec;
pub mod command;
pub mod error;
pub mod frame;
pub mod id;
pub mod status;

pub use codec::FrameCodec;
pub use command::{Command, CommandType, Completion, PinKind, PinOp, ResponseKind, Widget};
pub use error::ProtocolError;
pub use frame::{Frame, FrameHeader, HEADER_SIZE, MAX_BODY_SIZE};
pub use id::MessageId;
pub use status::Status;
