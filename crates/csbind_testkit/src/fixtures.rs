//! Test fixtures.
//!
//! Chat-style records (content, author, date), configurations using them,
//! and listeners or error handlers that record what they see.

use chrono::{DateTime, Duration, TimeZone, Utc};
use csbind_core::{CsbindError, ErrorHandler, ObservableConfig, UpdateListener};
use csbind_codec::{Snapshot, Value};
use csbind_protocol::MutationRequest;
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::{Arc, Once};

/// Keys every chat record carries.
pub const CHAT_KEYS: [&str; 3] = ["content", "author", "date"];

/// Timestamp of `chat(0)`.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("Valid base timestamp")
}

/// Chat record number `n`, one minute after record `n - 1`.
pub fn chat(n: i64) -> Value {
    Value::record([
        ("content", Value::from(format!("chat{n}"))),
        ("author", Value::from(format!("user{}", n % 3))),
        ("date", Value::from(base_time() + Duration::minutes(n))),
    ])
}

/// Chat records for every number in `range`.
pub fn chats(range: Range<i64>) -> Snapshot {
    range.map(chat).collect()
}

/// A configuration named `name` requiring [`CHAT_KEYS`].
pub fn chat_config(name: &str) -> ObservableConfig {
    ObservableConfig::new(name).with_required_keys(CHAT_KEYS)
}

/// Calls seen by a [`recording_listener`].
pub type ListenerLog = Arc<Mutex<Vec<(Snapshot, MutationRequest)>>>;

/// A listener that stores every call.
pub fn recording_listener() -> (UpdateListener, ListenerLog) {
    let log: ListenerLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let listener: UpdateListener = Arc::new(move |values: &[Value], request: &MutationRequest| {
        sink.lock().push((values.to_vec(), request.clone()));
    });
    (listener, log)
}

/// Errors seen by a [`recording_handler`].
pub type ErrorLog = Arc<Mutex<Vec<CsbindError>>>;

/// An error handler that stores every error.
pub fn recording_handler() -> (ErrorHandler, ErrorLog) {
    let log: ErrorLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let handler: ErrorHandler = Arc::new(move |error: &CsbindError| {
        sink.lock().push(error.clone());
    });
    (handler, log)
}

static TRACING: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
