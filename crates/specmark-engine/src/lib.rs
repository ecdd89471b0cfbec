//! Engine protocol client and step resolution.
//!
//! A specification engine process owns the authoritative step catalog and is
//! reached over a long-lived socket speaking a small request/response
//! protocol. This crate builds the protocol messages, drives one blocking
//! round trip at a time over a caller-supplied connection, and combines the
//! engine's answers with a project-level implementation index to decide
//! whether a written step is known, bound to an implementation, or
//! unimplemented.
//!
//! Connection lifecycle lives in [`ConnectionPool`]; the resolver and client
//! never open or close sockets themselves.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod messages;
pub mod resolver;

pub use client::ProtocolClient;
pub use config::EngineConfig;
pub use connection::{Connection, ConnectionPool, TcpConnection};
pub use error::{ConfigError, ProtocolError, ResolveError};
pub use messages::{Envelope, MessageKind, StepValuePair};
pub use resolver::{
    ImplementationHandle, ImplementationIndex, InMemoryImplementationIndex, StepResolution,
    StepResolver,
};
