//! # lh-core
//!
//! Shared foundation for lihe: the error taxonomy, the event model and the
//! [`EventSource`] contract every event reader implements.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod source;
pub mod types;

pub use error::{Error, Result};
pub use source::{EventSource, MemorySource};
pub use types::{CastorHit, Event, FourVector, KAON_MASS, PION_MASS, Track};

/// Crate version, shared by the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
