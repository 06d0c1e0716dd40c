//! # csbind Protocol
//!
//! Wire-level types shared by both endpoints of a csbind pair.
//!
//! This crate provides:
//! - [`Mode`] and the per-mode required properties
//! - [`MutationRequest`], a field-preserving tagged request
//! - [`ChannelNames`], the deterministic channel naming
//! - CBOR payload encoding for byte transports
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod messages;
mod mode;
mod request;

pub use channel::{ChannelNames, INBOUND_PREFIX, OUTBOUND_PREFIX};
pub use messages::{decode_payload, encode_payload};
pub use mode::{Mode, INBOUND_MODES, LOCAL_MODES};
pub use request::{MutationRequest, FIELD_ID, FIELD_INDEX, FIELD_MODE, FIELD_VALUES};
