//! # csbind Codec
//!
//! Record values for csbind.
//!
//! This crate provides:
//! - The dynamic [`Value`] type records are made of
//! - [`deep_clone`] / [`deep_equal`], the snapshot isolation primitives
//! - Canonical CBOR encoding for transports that carry bytes
//! - JSON conversion
//!
//! ## Canonical CBOR Rules
//!
//! - Maps are keyed by text and sorted by encoded key (length-first, then bytewise)
//! - Integers use shortest encoding
//! - Floats are always 64-bit
//! - No indefinite-length items
//! - Nesting is capped at [`MAX_DEPTH`]
//! - Date/time values use tag 0 with RFC 3339 text, to the nanosecond
//!
//! ## Usage
//!
//! ```
//! use csbind_codec::{from_cbor, to_canonical_cbor, Value};
//!
//! let record = Value::record([("content", "hello"), ("author", "me")]);
//! let bytes = to_canonical_cbor(&record).unwrap();
//! let decoded = from_cbor(&bytes).unwrap();
//! assert_eq!(record, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod json;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder, MAX_DEPTH};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{clone_snapshot, deep_clone, deep_equal, snapshots_equal, Callback, Snapshot, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn record_strategy() -> impl Strategy<Value = Value> {
        (
            "[a-z]{0,12}",
            "[a-z]{1,8}",
            0i64..4_000_000_000_000_000_000,
            any::<i64>(),
            any::<f64>(),
        )
            .prop_map(|(content, author, nanos, n, x)| {
                Value::record([
                    ("content", Value::from(content)),
                    ("author", Value::from(author)),
                    ("date", Value::from(Utc.timestamp_nanos(nanos))),
                    ("n", Value::Integer(n)),
                    ("x", Value::Float(x)),
                ])
            })
    }

    proptest! {
        #[test]
        fn clone_round_trip(records in prop::collection::vec(record_strategy(), 0..8)) {
            let snapshot: Snapshot = records;
            let copy = clone_snapshot(&snapshot);
            prop_assert!(snapshots_equal(&snapshot, &copy));
        }

        #[test]
        fn cbor_preserves_records(record in record_strategy()) {
            let bytes = to_canonical_cbor(&record).unwrap();
            prop_assert_eq!(from_cbor(&bytes).unwrap(), record);
        }
    }
}
