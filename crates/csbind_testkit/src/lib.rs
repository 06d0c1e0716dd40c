//! # csbind Testkit
//!
//! Test utilities for csbind.
//!
//! This crate provides:
//! - In-memory authorities for both execution models
//! - A loopback transport that records publishes and routes channels
//!   between endpoints
//! - Chat record fixtures, recording listeners and error handlers
//! - Property-based test generators using proptest
//! - Mutation vectors described in JSON
//!
//! ## Usage
//!
//! ```rust
//! use csbind_core::{MutationRequest, Observable};
//! use csbind_testkit::prelude::*;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(LoopbackTransport::new());
//! let authority = MemoryAuthority::with_records(chats(0..3));
//! let observable = Observable::new(
//!     chat_config("room"),
//!     Arc::clone(&transport),
//!     authority,
//!     None,
//! )
//! .unwrap();
//! observable.start(None).unwrap();
//! observable.set(MutationRequest::remove(0), None).unwrap();
//! assert_eq!(transport.published().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod authority;
pub mod fixtures;
pub mod generators;
pub mod transport;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::authority::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::transport::*;
    pub use crate::vectors::*;
}

pub use authority::*;
pub use fixtures::*;
pub use generators::*;
pub use transport::*;
pub use vectors::*;
