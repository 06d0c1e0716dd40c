//! The authoritative store an observable mirrors.
//!
//! Stores are expected to apply mutations as follows:
//! - `insert` splices `values` before `index` (an append when `index` equals
//!   the length)
//! - `edit` replaces `values.len()` records starting at `index`
//! - `add` appends `values`
//! - `remove` deletes the one record at `index`

use crate::error::CsbindResult;
use async_trait::async_trait;
use csbind_codec::{Snapshot, Value};
use csbind_protocol::MutationRequest;
use std::sync::Arc;

/// Listener invoked with the new snapshot and the request that produced it.
pub type UpdateListener = Arc<dyn Fn(&[Value], &MutationRequest) + Send + Sync>;

/// A blocking authoritative store.
pub trait Authority: Send + Sync {
    /// Fetches the current snapshot.
    fn get(&self) -> CsbindResult<Snapshot>;

    /// Applies an insert request.
    fn insert(&self, request: &MutationRequest) -> CsbindResult<()>;

    /// Applies an edit request.
    fn edit(&self, request: &MutationRequest) -> CsbindResult<()>;

    /// Applies an add request.
    fn add(&self, request: &MutationRequest) -> CsbindResult<()>;

    /// Applies a remove request.
    fn remove(&self, request: &MutationRequest) -> CsbindResult<()>;
}

/// An authoritative store whose calls suspend.
#[async_trait]
pub trait AsyncAuthority: Send + Sync {
    /// Fetches the current snapshot.
    async fn get(&self) -> CsbindResult<Snapshot>;

    /// Applies an insert request.
    async fn insert(&self, request: &MutationRequest) -> CsbindResult<()>;

    /// Applies an edit request.
    async fn edit(&self, request: &MutationRequest) -> CsbindResult<()>;

    /// Applies an add request.
    async fn add(&self, request: &MutationRequest) -> CsbindResult<()>;

    /// Applies a remove request.
    async fn remove(&self, request: &MutationRequest) -> CsbindResult<()>;
}

impl<A: Authority + ?Sized> Authority for Arc<A> {
    fn get(&self) -> CsbindResult<Snapshot> {
        (**self).get()
    }

    fn insert(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).insert(request)
    }

    fn edit(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).edit(request)
    }

    fn add(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).add(request)
    }

    fn remove(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).remove(request)
    }
}

#[async_trait]
impl<A: AsyncAuthority + ?Sized> AsyncAuthority for Arc<A> {
    async fn get(&self) -> CsbindResult<Snapshot> {
        (**self).get().await
    }

    async fn insert(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).insert(request).await
    }

    async fn edit(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).edit(request).await
    }

    async fn add(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).add(request).await
    }

    async fn remove(&self, request: &MutationRequest) -> CsbindResult<()> {
        (**self).remove(request).await
    }
}
