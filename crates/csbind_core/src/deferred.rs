//! The future execution model.

use crate::authority::{AsyncAuthority, UpdateListener};
use crate::config::{ExecutionModel, ObservableConfig};
use crate::error::{fail_soft, CsbindError, CsbindResult, ErrorHandler};
use crate::pipeline::AsyncPipeline;
use crate::state::{ObservableState, ObservableStats, Settled, SharedCore};
use crate::transport::{InboundHandler, Transport};
use csbind_codec::{Snapshot, Value};
use csbind_protocol::{ChannelNames, Mode, MutationRequest, INBOUND_MODES, LOCAL_MODES};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{trace, warn};

struct Inner<T, A> {
    core: SharedCore<T>,
    authority: A,
    pipeline: AsyncPipeline<A>,
}

/// An observable whose authority calls suspend.
///
/// Operations return futures resolving to a handle on the same observable,
/// so calls chain with `.await?`. Authority calls made for one request run
/// one after another. Overlapping calls on one observable are not ordered
/// against each other: whichever authority round trip finishes first settles
/// first.
///
/// Inbound requests are validated on the transport's thread and then
/// applied on a task spawned onto the current Tokio runtime.
pub struct AsyncObservable<T, A> {
    inner: Arc<Inner<T, A>>,
}

impl<T, A> Clone for AsyncObservable<T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, A> AsyncObservable<T, A>
where
    T: Transport + 'static,
    A: AsyncAuthority + 'static,
{
    /// Execution model of this type.
    pub const MODEL: ExecutionModel = ExecutionModel::Future;

    /// Creates a dormant observable.
    ///
    /// An invalid configuration is reported to `on_error` when supplied and
    /// returned in either case.
    pub fn new(
        config: ObservableConfig,
        transport: T,
        authority: A,
        on_error: Option<&ErrorHandler>,
    ) -> CsbindResult<Self> {
        let core = SharedCore::new(config, transport).inspect_err(|e| {
            if let Some(handler) = on_error {
                handler(e);
            }
        })?;
        Ok(Self {
            inner: Arc::new(Inner {
                core,
                authority,
                pipeline: AsyncPipeline::standard(),
            }),
        })
    }

    /// Seeds the snapshot from the authority and subscribes the inbound
    /// channel.
    pub async fn start(&self, on_error: Option<&ErrorHandler>) -> CsbindResult<Self> {
        let result = match self.inner.authority.get().await {
            Ok(seed) => self.activate(seed),
            Err(e) => Err(e),
        };
        self.finish(result, on_error)
    }

    /// Applies a local mutation.
    ///
    /// Resolves to [`CsbindError::Unchanged`] when the snapshot did not
    /// change. That outcome bypasses `on_error`.
    pub async fn set(
        &self,
        request: MutationRequest,
        on_error: Option<&ErrorHandler>,
    ) -> CsbindResult<Self> {
        let result = self.apply(&request, &LOCAL_MODES).await;
        if result == Err(CsbindError::Unchanged) {
            return Err(CsbindError::Unchanged);
        }
        self.finish(result, on_error)
    }

    /// Compares a peer's snapshot against the held one and pushes a full
    /// resynchronisation on divergence.
    pub async fn check(&self, values: &[Value], on_error: Option<&ErrorHandler>) -> CsbindResult<Self> {
        let result = self.inner.core.reconcile(Some(values)).map(|_| ());
        self.finish(result, on_error)
    }

    /// Fetches the authority's current snapshot.
    pub async fn get(&self) -> CsbindResult<Snapshot> {
        self.inner.authority.get().await
    }

    /// Registers listeners called after every change.
    pub async fn add_updates<I>(&self, listeners: I) -> Self
    where
        I: IntoIterator<Item = UpdateListener>,
    {
        self.inner.core.add_listeners(listeners);
        self.clone()
    }

    /// Applies a request as if it arrived on the inbound channel and waits
    /// for it to settle.
    pub async fn receive(&self, request: MutationRequest) -> CsbindResult<()> {
        self.inner.core.note_inbound();
        let result = self.apply(&request, &INBOUND_MODES).await;
        self.note_inbound_outcome(&result);
        result
    }

    /// Copy of the held snapshot, `None` before start.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.inner.core.snapshot()
    }

    /// Returns true once started.
    pub fn is_started(&self) -> bool {
        self.inner.core.state() == ObservableState::Active
    }

    /// Lifecycle state.
    pub fn state(&self) -> ObservableState {
        self.inner.core.state()
    }

    /// Observable name.
    pub fn name(&self) -> &str {
        self.inner.core.name()
    }

    /// Channel names.
    pub fn channels(&self) -> &ChannelNames {
        self.inner.core.channels()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.core.listener_count()
    }

    /// Operation counters.
    pub fn stats(&self) -> ObservableStats {
        self.inner.core.stats()
    }

    fn activate(&self, seed: Snapshot) -> CsbindResult<()> {
        let weak = Arc::downgrade(&self.inner);
        self.inner.core.activate(seed, Self::inbound_handler(weak))
    }

    fn inbound_handler(weak: Weak<Inner<T, A>>) -> InboundHandler {
        Arc::new(move |request| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            let observable = AsyncObservable { inner };
            observable.inner.core.note_inbound();

            let accepted = observable
                .inner
                .core
                .guard(&request, &INBOUND_MODES, |_| {
                    Handle::try_current().map_err(|_| CsbindError::NoRuntime)
                });
            let runtime = match accepted {
                Ok(runtime) => runtime,
                Err(e) => {
                    observable.note_inbound_outcome(&Err(e.clone()));
                    return Err(e);
                }
            };

            runtime.spawn(async move {
                let result = observable.execute(&request).await;
                observable.note_inbound_outcome(&result);
            });
            Ok(())
        })
    }

    async fn apply(&self, request: &MutationRequest, modes: &[Mode]) -> CsbindResult<()> {
        let pending = self
            .inner
            .core
            .guard(request, modes, |request| Ok(self.execute(request)))?;
        pending.await
    }

    async fn execute(&self, request: &MutationRequest) -> CsbindResult<()> {
        let inner = &self.inner;
        if request.mode() == Some(Mode::Check) {
            inner.core.reconcile(request.values())?;
            return Ok(());
        }

        inner.pipeline.run(request, &inner.authority).await?;
        let fresh = inner.authority.get().await?;
        match inner.core.settle(fresh, request)? {
            Settled::Changed => Ok(()),
            Settled::Unchanged => Err(CsbindError::Unchanged),
        }
    }

    fn note_inbound_outcome(&self, result: &CsbindResult<()>) {
        match result {
            Ok(()) => {}
            Err(CsbindError::Unchanged) => {
                trace!(name = %self.name(), "inbound request unchanged");
            }
            Err(e) => {
                self.inner.core.note_failure(e);
                warn!(name = %self.name(), error = %e, "inbound request rejected");
            }
        }
    }

    fn finish(&self, result: CsbindResult<()>, on_error: Option<&ErrorHandler>) -> CsbindResult<Self> {
        if let Err(e) = &result {
            self.inner.core.note_failure(e);
        }
        fail_soft(result, on_error)?;
        Ok(self.clone())
    }
}

impl<T: Transport, A> std::fmt::Debug for AsyncObservable<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncObservable")
            .field("name", &self.inner.core.config().name)
            .finish_non_exhaustive()
    }
}
