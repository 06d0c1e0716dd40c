//! Mutation requests.

use crate::mode::Mode;
use csbind_codec::{Snapshot, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Property holding the mode string.
pub const FIELD_MODE: &str = "mode";
/// Property holding the target position.
pub const FIELD_INDEX: &str = "index";
/// Property holding the records.
pub const FIELD_VALUES: &str = "values";
/// Property conventionally used for correlation ids.
pub const FIELD_ID: &str = "id";

/// A tagged request describing one CRUD-or-check operation.
///
/// Requests are kept as a string-keyed map so that they can be validated
/// as received (a request may name an unknown mode or carry a malformed
/// index) and so that unknown fields survive every hop untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationRequest {
    fields: BTreeMap<String, Value>,
}

impl MutationRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an insert request.
    pub fn insert(index: i64, values: Snapshot) -> Self {
        Self::with_mode(Mode::Insert)
            .with_field(FIELD_INDEX, index)
            .with_field(FIELD_VALUES, values)
    }

    /// Creates an edit request.
    pub fn edit(index: i64, values: Snapshot) -> Self {
        Self::with_mode(Mode::Edit)
            .with_field(FIELD_INDEX, index)
            .with_field(FIELD_VALUES, values)
    }

    /// Creates an add request.
    pub fn add(values: Snapshot) -> Self {
        Self::with_mode(Mode::Add).with_field(FIELD_VALUES, values)
    }

    /// Creates a remove request.
    pub fn remove(index: i64) -> Self {
        Self::with_mode(Mode::Remove).with_field(FIELD_INDEX, index)
    }

    /// Creates a check request carrying the sender's snapshot.
    pub fn check(values: Snapshot) -> Self {
        Self::with_mode(Mode::Check).with_field(FIELD_VALUES, values)
    }

    /// Creates a full resynchronisation push.
    pub fn change_all(values: Snapshot) -> Self {
        Self::with_mode(Mode::ChangeAll).with_field(FIELD_VALUES, values)
    }

    fn with_mode(mode: Mode) -> Self {
        Self::new().with_field(FIELD_MODE, mode.as_str())
    }

    /// Sets an arbitrary field, replacing any previous value.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Stamps a random correlation id into the `id` field.
    pub fn with_correlation_id(self) -> Self {
        self.with_field(FIELD_ID, Uuid::new_v4().to_string())
    }

    /// Removes a field, returning its value.
    pub fn take_field(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Returns the raw field value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns true if the field is present.
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns all fields.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Returns the mode string as sent, if it is text.
    pub fn mode_text(&self) -> Option<&str> {
        self.field(FIELD_MODE).and_then(Value::as_text)
    }

    /// Returns the parsed mode, if it names one.
    pub fn mode(&self) -> Option<Mode> {
        self.mode_text().and_then(Mode::parse)
    }

    /// Returns the index, if it is an integer.
    pub fn index(&self) -> Option<i64> {
        self.field(FIELD_INDEX).and_then(Value::as_integer)
    }

    /// Returns the values, if they form a sequence.
    pub fn values(&self) -> Option<&[Value]> {
        self.field(FIELD_VALUES).and_then(Value::as_array)
    }

    /// Returns the correlation id, if present as text.
    pub fn correlation_id(&self) -> Option<&str> {
        self.field(FIELD_ID).and_then(Value::as_text)
    }

    /// Converts into a map value.
    pub fn into_value(self) -> Value {
        Value::Map(self.fields)
    }

    /// Builds a request from a map value; anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(fields) => Some(Self { fields }),
            _ => None,
        }
    }
}

impl From<BTreeMap<String, Value>> for MutationRequest {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<MutationRequest> for Value {
    fn from(request: MutationRequest) -> Self {
        request.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: i64) -> Value {
        Value::record([("content", Value::from(format!("chat{n}")))])
    }

    #[test]
    fn typed_constructors() {
        let req = MutationRequest::insert(2, vec![record(1)]);
        assert_eq!(req.mode(), Some(Mode::Insert));
        assert_eq!(req.index(), Some(2));
        assert_eq!(req.values(), Some(&[record(1)][..]));

        let req = MutationRequest::remove(1);
        assert_eq!(req.mode(), Some(Mode::Remove));
        assert!(req.values().is_none());

        let req = MutationRequest::change_all(vec![]);
        assert_eq!(req.mode_text(), Some("changeAll"));
    }

    #[test]
    fn extra_fields_survive_value_conversion() {
        let req = MutationRequest::add(vec![record(4)])
            .with_field("id", 5)
            .with_field("origin", "client-a");
        let back = MutationRequest::from_value(req.clone().into_value()).unwrap();
        assert_eq!(back, req);
        assert_eq!(back.field("id"), Some(&Value::Integer(5)));
        assert_eq!(back.field("origin"), Some(&Value::from("client-a")));
    }

    #[test]
    fn malformed_fields_are_kept_as_sent() {
        let req = MutationRequest::new()
            .with_field(FIELD_MODE, "bogus")
            .with_field(FIELD_INDEX, "test");
        assert_eq!(req.mode(), None);
        assert_eq!(req.mode_text(), Some("bogus"));
        assert_eq!(req.index(), None);
        assert!(req.has_field(FIELD_INDEX));
    }

    #[test]
    fn correlation_ids_are_unique() {
        let a = MutationRequest::remove(0).with_correlation_id();
        let b = MutationRequest::remove(0).with_correlation_id();
        assert!(a.correlation_id().is_some());
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn non_map_values_are_not_requests() {
        assert!(MutationRequest::from_value(Value::Array(vec![])).is_none());
    }
}
