//! # csbind Core
//!
//! Keeps an ordered collection of records consistent between two endpoints
//! joined by a publish/subscribe transport.
//!
//! This crate provides:
//! - Argument contracts guarding every public operation
//! - Mode dispatch of mutations to an authoritative store
//! - Change detection by structural equality against the held snapshot
//! - Listener fan-out and outbound relay of genuine changes
//! - Snapshot reconciliation through `check` requests
//! - A direct ([`Observable`]) and a future-based ([`AsyncObservable`])
//!   execution model sharing one core
//!
//! ## Lifecycle
//!
//! An observable is dormant until started. Starting seeds the held snapshot
//! and subscribes the inbound channel `csbindSend<name>`. From then on local
//! `set` calls and inbound requests go through the same steps:
//! 1. Validate the request against the held snapshot
//! 2. Dispatch it to the authority
//! 3. Fetch the fresh snapshot
//! 4. If it differs, store it, notify listeners and publish the request on
//!    `csbindReceive<name>`
//!
//! ## Error Handling
//!
//! Every fallible operation takes an optional [`ErrorHandler`]. With a
//! handler, failures are passed to it and the call succeeds; without one,
//! they are returned.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod authority;
mod config;
mod contract;
mod deferred;
mod error;
mod observable;
mod pipeline;
pub mod rules;
mod state;
mod transport;

pub use authority::{AsyncAuthority, Authority, UpdateListener};
pub use config::{ExecutionModel, ObservableConfig};
pub use contract::{Contract, Rule};
pub use deferred::AsyncObservable;
pub use error::{fail_soft, CsbindError, CsbindResult, ErrorHandler};
pub use observable::Observable;
pub use pipeline::{AsyncPipeline, AsyncStage, Pipeline, Stage};
pub use state::{ObservableState, ObservableStats, Settled};
pub use transport::{InboundHandler, Transport};

pub use csbind_codec::{Snapshot, Value};
pub use csbind_protocol::{ChannelNames, Mode, MutationRequest};
