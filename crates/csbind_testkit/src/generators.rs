//! Property-based test generators using proptest.

use crate::fixtures::base_time;
use chrono::Duration;
use csbind_codec::{Snapshot, Value};
use csbind_protocol::MutationRequest;
use proptest::prelude::*;

/// Strategy for chat records with arbitrary content, author and date.
pub fn chat_record_strategy() -> impl Strategy<Value = Value> {
    (
        prop::string::string_regex("[a-zA-Z0-9 ]{0,24}").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
        0i64..1_000_000,
    )
        .prop_map(|(content, author, minutes)| {
            Value::record([
                ("content", Value::from(content)),
                ("author", Value::from(author)),
                ("date", Value::from(base_time() + Duration::minutes(minutes))),
            ])
        })
}

/// Strategy for snapshots of up to `max_len` chat records.
pub fn snapshot_strategy(max_len: usize) -> impl Strategy<Value = Snapshot> {
    prop::collection::vec(chat_record_strategy(), 0..=max_len)
}

/// Strategy for a snapshot together with a mutation valid against it.
pub fn snapshot_and_request_strategy(
    max_len: usize,
) -> impl Strategy<Value = (Snapshot, MutationRequest)> {
    snapshot_strategy(max_len).prop_flat_map(|snapshot| {
        let len = snapshot.len() as i64;
        let values = || prop::collection::vec(chat_record_strategy(), 1..4);
        let request = prop_oneof![
            (0..=len, values()).prop_map(|(i, v)| MutationRequest::insert(i, v)),
            (0..=len, values()).prop_map(|(i, v)| MutationRequest::edit(i, v)),
            values().prop_map(MutationRequest::add),
            (0..=len).prop_map(MutationRequest::remove),
        ];
        (Just(snapshot), request)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::CHAT_KEYS;

    proptest! {
        #[test]
        fn generated_records_carry_keys(record in chat_record_strategy()) {
            prop_assert!(record.has_keys(&CHAT_KEYS));
        }

        #[test]
        fn generated_requests_fit_snapshot((snapshot, request) in snapshot_and_request_strategy(6)) {
            if let Some(index) = request.index() {
                prop_assert!(index >= 0 && index as usize <= snapshot.len());
            }
            prop_assert!(request.mode().is_some());
        }
    }
}
