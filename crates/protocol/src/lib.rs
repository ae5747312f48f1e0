//! Wire protocol spoken between a test runner and the core.
//!
//! Two channels carry protobuf messages inside varint length-prefixed frames:
//! the execution channel ([`Message`]) where the core drives the runner, and
//! the API channel ([`ApiMessage`]) where the runner queries the core.

pub mod api;
pub mod common;
mod convert;
pub mod error;
pub mod framing;
pub mod messages;

pub use api::*;
pub use common::*;
pub use error::{Error, ProtocolError, Result, TransportError};
pub use messages::*;
