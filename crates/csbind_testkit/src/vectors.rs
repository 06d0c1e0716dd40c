//! Mutation vectors in JSON.
//!
//! Each vector names a seed snapshot, one request, and either the snapshot
//! expected afterwards or a fragment of the expected error. Records use
//! the chat shape of [`crate::fixtures::CHAT_KEYS`], with dates as text.

use csbind_codec::{CodecError, CodecResult, Snapshot, Value};
use csbind_protocol::MutationRequest;
use serde::{Deserialize, Serialize};

/// One seed, one request, one outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Records the authority starts with.
    pub seed: serde_json::Value,
    /// The request applied with `set`.
    pub request: serde_json::Value,
    /// Snapshot held afterwards, when the request succeeds.
    pub expected: Option<serde_json::Value>,
    /// Fragment of the error message, when the request fails.
    pub expected_error: Option<String>,
}

impl MutationVector {
    /// Seed records as values.
    pub fn seed(&self) -> CodecResult<Snapshot> {
        snapshot_from_json(self.seed.clone())
    }

    /// The request as a [`MutationRequest`].
    pub fn request(&self) -> CodecResult<MutationRequest> {
        let value = Value::from_json(self.request.clone())?;
        let type_name = value.type_name();
        MutationRequest::from_value(value).ok_or_else(|| {
            CodecError::invalid_structure(format!("request must be an object, found {type_name}"))
        })
    }

    /// Expected snapshot as values, if the vector expects success.
    pub fn expected(&self) -> CodecResult<Option<Snapshot>> {
        self.expected.clone().map(snapshot_from_json).transpose()
    }
}

/// Converts a JSON array of records into a snapshot.
pub fn snapshot_from_json(json: serde_json::Value) -> CodecResult<Snapshot> {
    match Value::from_json(json)? {
        Value::Array(records) => Ok(records),
        other => Err(CodecError::invalid_structure(format!(
            "snapshot must be an array, found {}",
            other.type_name()
        ))),
    }
}

/// Renders a snapshot as a JSON array, for comparisons and messages.
pub fn snapshot_to_json(values: &[Value]) -> serde_json::Value {
    serde_json::Value::Array(values.iter().map(Value::to_json).collect())
}

const MUTATION_VECTORS: &str = r#"[
  {
    "id": "insert_at_head",
    "description": "insert before the first record",
    "seed": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"},
      {"content": "chat1", "author": "author1", "date": "2014-11-02T00:00:00Z"}
    ],
    "request": {"mode": "insert", "index": 0, "values": [
      {"content": "chat9", "author": "author9", "date": "2014-11-09T00:00:00Z"}
    ]},
    "expected": [
      {"content": "chat9", "author": "author9", "date": "2014-11-09T00:00:00Z"},
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"},
      {"content": "chat1", "author": "author1", "date": "2014-11-02T00:00:00Z"}
    ],
    "expected_error": null
  },
  {
    "id": "insert_at_len",
    "description": "an index equal to the length appends",
    "seed": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"}
    ],
    "request": {"mode": "insert", "index": 1, "values": [
      {"content": "chat9", "author": "author9", "date": "2014-11-09T00:00:00Z"}
    ]},
    "expected": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"},
      {"content": "chat9", "author": "author9", "date": "2014-11-09T00:00:00Z"}
    ],
    "expected_error": null
  },
  {
    "id": "edit_middle",
    "description": "edit replaces the record at the index",
    "seed": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"},
      {"content": "chat1", "author": "author1", "date": "2014-11-02T00:00:00Z"},
      {"content": "chat2", "author": "author2", "date": "2014-11-03T00:00:00Z"}
    ],
    "request": {"mode": "edit", "index": 1, "values": [
      {"content": "edited", "author": "author1", "date": "2014-11-02T00:00:00Z"}
    ]},
    "expected": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"},
      {"content": "edited", "author": "author1", "date": "2014-11-02T00:00:00Z"},
      {"content": "chat2", "author": "author2", "date": "2014-11-03T00:00:00Z"}
    ],
    "expected_error": null
  },
  {
    "id": "remove_first",
    "description": "remove drops one record",
    "seed": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"},
      {"content": "chat1", "author": "author1", "date": "2014-11-02T00:00:00Z"}
    ],
    "request": {"mode": "remove", "index": 0},
    "expected": [
      {"content": "chat1", "author": "author1", "date": "2014-11-02T00:00:00Z"}
    ],
    "expected_error": null
  },
  {
    "id": "add_with_fraction",
    "description": "records may carry fractional numbers",
    "seed": [],
    "request": {"mode": "add", "values": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z", "rating": 4.5}
    ]},
    "expected": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z", "rating": 4.5}
    ],
    "expected_error": null
  },
  {
    "id": "insert_past_len",
    "description": "an index beyond the length is refused",
    "seed": [
      {"content": "chat0", "author": "author0", "date": "2014-11-01T00:00:00Z"}
    ],
    "request": {"mode": "insert", "index": 2, "values": [
      {"content": "chat9", "author": "author9", "date": "2014-11-09T00:00:00Z"}
    ]},
    "expected": null,
    "expected_error": "request index must be an integer between 0 and 1"
  },
  {
    "id": "unknown_mode",
    "description": "modes outside the local set are refused",
    "seed": [],
    "request": {"mode": "replace", "values": []},
    "expected": null,
    "expected_error": "request mode must be one of insert,edit,add,remove"
  },
  {
    "id": "record_missing_keys",
    "description": "values must carry every required key",
    "seed": [],
    "request": {"mode": "add", "values": [{"content": "chat0"}]},
    "expected": null,
    "expected_error": "request values must be records carrying keys content,author,date"
  }
]"#;

/// Every mutation vector.
pub fn mutation_vectors() -> Vec<MutationVector> {
    serde_json::from_str(MUTATION_VECTORS).expect("Failed to parse mutation vectors")
}

/// Every mutation vector, pretty-printed.
pub fn all_vectors_json() -> String {
    serde_json::to_string_pretty(&mutation_vectors()).expect("Failed to serialize vectors")
}
