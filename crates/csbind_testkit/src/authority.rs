//! In-memory authoritative stores.

use async_trait::async_trait;
use csbind_core::{AsyncAuthority, Authority, CsbindError, CsbindResult};
use csbind_codec::{Snapshot, Value};
use csbind_protocol::{Mode, MutationRequest};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn clamp(index: Option<i64>, len: usize) -> usize {
    usize::try_from(index.unwrap_or(0).max(0)).map_or(len, |i| i.min(len))
}

/// Applies `request` to `records` with array-splice semantics.
///
/// Out-of-range positions are clamped, so `remove` at the length removes
/// nothing. Non-mutating modes leave `records` alone.
pub fn apply_mutation(records: &mut Vec<Value>, request: &MutationRequest) {
    let values = request.values().unwrap_or(&[]);
    let index = clamp(request.index(), records.len());
    match request.mode() {
        Some(Mode::Insert) => {
            records.splice(index..index, values.iter().cloned());
        }
        Some(Mode::Edit) => {
            let end = index.saturating_add(values.len()).min(records.len());
            records.splice(index..end, values.iter().cloned());
        }
        Some(Mode::Add) => records.extend(values.iter().cloned()),
        Some(Mode::Remove) => {
            if index < records.len() {
                records.remove(index);
            }
        }
        Some(Mode::Check) | Some(Mode::ChangeAll) | None => {}
    }
}

/// State shared by both in-memory stores.
#[derive(Debug, Default)]
struct Store {
    records: Mutex<Vec<Value>>,
    failure: Mutex<Option<String>>,
    gets: AtomicU64,
    mutations: AtomicU64,
}

impl Store {
    fn seeded(records: Vec<Value>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    fn check_failure(&self) -> CsbindResult<()> {
        match self.failure.lock().take() {
            Some(message) => Err(CsbindError::authority(message)),
            None => Ok(()),
        }
    }

    fn get(&self) -> CsbindResult<Snapshot> {
        self.check_failure()?;
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().clone())
    }

    fn mutate(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.check_failure()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        apply_mutation(&mut self.records.lock(), request);
        Ok(())
    }
}

/// A blocking store backed by a vector.
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthority {
    store: Arc<Store>,
}

impl MemoryAuthority {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `records`.
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            store: Arc::new(Store::seeded(records)),
        }
    }

    /// Copy of the current records.
    pub fn records(&self) -> Vec<Value> {
        self.store.records.lock().clone()
    }

    /// Replaces the records without going through an observable.
    pub fn replace(&self, records: Vec<Value>) {
        *self.store.records.lock() = records;
    }

    /// Makes the next call fail with an authority error.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.store.failure.lock() = Some(message.into());
    }

    /// Number of successful `get` calls.
    pub fn get_count(&self) -> u64 {
        self.store.gets.load(Ordering::SeqCst)
    }

    /// Number of successful mutation calls.
    pub fn mutation_count(&self) -> u64 {
        self.store.mutations.load(Ordering::SeqCst)
    }
}

impl Authority for MemoryAuthority {
    fn get(&self) -> CsbindResult<Snapshot> {
        self.store.get()
    }

    fn insert(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.store.mutate(request)
    }

    fn edit(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.store.mutate(request)
    }

    fn add(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.store.mutate(request)
    }

    fn remove(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.store.mutate(request)
    }
}

/// A suspending store backed by a vector, with optional latency per call.
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct AsyncMemoryAuthority {
    store: Arc<Store>,
    latency: Option<Duration>,
}

impl AsyncMemoryAuthority {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `records`.
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            store: Arc::new(Store::seeded(records)),
            latency: None,
        }
    }

    /// Sleeps for `latency` before every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Copy of the current records.
    pub fn records(&self) -> Vec<Value> {
        self.store.records.lock().clone()
    }

    /// Replaces the records without going through an observable.
    pub fn replace(&self, records: Vec<Value>) {
        *self.store.records.lock() = records;
    }

    /// Makes the next call fail with an authority error.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.store.failure.lock() = Some(message.into());
    }

    /// Number of successful `get` calls.
    pub fn get_count(&self) -> u64 {
        self.store.gets.load(Ordering::SeqCst)
    }

    /// Number of successful mutation calls.
    pub fn mutation_count(&self) -> u64 {
        self.store.mutations.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl AsyncAuthority for AsyncMemoryAuthority {
    async fn get(&self) -> CsbindResult<Snapshot> {
        self.delay().await;
        self.store.get()
    }

    async fn insert(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.delay().await;
        self.store.mutate(request)
    }

    async fn edit(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.delay().await;
        self.store.mutate(request)
    }

    async fn add(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.delay().await;
        self.store.mutate(request)
    }

    async fn remove(&self, request: &MutationRequest) -> CsbindResult<()> {
        self.delay().await;
        self.store.mutate(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(s: &str) -> Vec<Value> {
        s.chars().map(|c| Value::from(c.to_string())).collect()
    }

    fn applied(start: &str, request: MutationRequest) -> Vec<Value> {
        let mut records = letters(start);
        apply_mutation(&mut records, &request);
        records
    }

    #[test]
    fn splice_semantics() {
        assert_eq!(applied("ABC", MutationRequest::insert(2, letters("XY"))), letters("ABXYC"));
        assert_eq!(applied("ABC", MutationRequest::insert(3, letters("X"))), letters("ABCX"));
        assert_eq!(applied("ABC", MutationRequest::edit(1, letters("XY"))), letters("AXY"));
        assert_eq!(applied("ABC", MutationRequest::add(letters("XY"))), letters("ABCXY"));
        assert_eq!(applied("ABC", MutationRequest::remove(1)), letters("AC"));
    }

    #[test]
    fn positions_past_the_end_are_clamped() {
        assert_eq!(applied("ABC", MutationRequest::remove(3)), letters("ABC"));
        assert_eq!(applied("ABC", MutationRequest::edit(3, letters("X"))), letters("ABCX"));
        assert_eq!(applied("ABC", MutationRequest::check(letters("Z"))), letters("ABC"));
    }

    #[test]
    fn failure_is_one_shot() {
        let authority = MemoryAuthority::with_records(letters("A"));
        authority.fail_next("offline");
        assert_eq!(
            Authority::get(&authority),
            Err(CsbindError::authority("offline"))
        );
        assert_eq!(Authority::get(&authority), Ok(letters("A")));
        assert_eq!(authority.get_count(), 1);
    }

    #[test]
    fn clones_share_records() {
        let authority = MemoryAuthority::new();
        let other = authority.clone();
        authority.add(&MutationRequest::add(letters("Q"))).unwrap();
        assert_eq!(other.records(), letters("Q"));
        assert_eq!(other.mutation_count(), 1);
    }

    #[tokio::test]
    async fn async_store_applies_with_latency() {
        let authority = AsyncMemoryAuthority::with_records(letters("AB"))
            .with_latency(Duration::from_millis(1));
        AsyncAuthority::insert(&authority, &MutationRequest::insert(0, letters("Z")))
            .await
            .unwrap();
        assert_eq!(
            AsyncAuthority::get(&authority).await.unwrap(),
            letters("ZAB")
        );
    }
}
