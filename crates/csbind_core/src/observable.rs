//! The direct execution model.

use crate::authority::{Authority, UpdateListener};
use crate::config::{ExecutionModel, ObservableConfig};
use crate::error::{fail_soft, CsbindResult, ErrorHandler};
use crate::pipeline::Pipeline;
use crate::state::{ObservableState, ObservableStats, SharedCore};
use crate::transport::{InboundHandler, Transport};
use csbind_codec::{Snapshot, Value};
use csbind_protocol::{ChannelNames, Mode, MutationRequest, INBOUND_MODES, LOCAL_MODES};
use std::sync::{Arc, Weak};
use tracing::warn;

struct Inner<T, A> {
    core: SharedCore<T>,
    authority: A,
    pipeline: Pipeline<A>,
}

/// An observable whose authority calls block.
///
/// Every operation runs to completion before returning. A listener that
/// calls [`Observable::set`] on the same observable recurses.
///
/// Handles are cheap to clone and share one state. The inbound subscription
/// holds a weak reference: once the last handle is dropped, inbound requests
/// are ignored.
pub struct Observable<T, A> {
    inner: Arc<Inner<T, A>>,
}

impl<T, A> Clone for Observable<T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, A> Observable<T, A>
where
    T: Transport + 'static,
    A: Authority + 'static,
{
    /// Execution model of this type.
    pub const MODEL: ExecutionModel = ExecutionModel::Direct;

    /// Creates a dormant observable.
    ///
    /// An invalid configuration is reported to `on_error` when supplied and
    /// returned in either case, since no observable exists to hand back.
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
                pipeline: Pipeline::standard(),
            }),
        })
    }

    /// Seeds the snapshot from the authority and subscribes the inbound
    /// channel.
    pub fn start(&self, on_error: Option<&ErrorHandler>) -> CsbindResult<&Self> {
        let result = self
            .inner
            .authority
            .get()
            .and_then(|seed| self.activate(seed));
        self.finish(result, on_error)
    }

    /// Seeds the snapshot with `seed` and subscribes the inbound channel.
    pub fn start_with(&self, seed: Snapshot, on_error: Option<&ErrorHandler>) -> CsbindResult<&Self> {
        let result = self.activate(seed);
        self.finish(result, on_error)
    }

    /// Applies a local mutation.
    pub fn set(&self, request: MutationRequest, on_error: Option<&ErrorHandler>) -> CsbindResult<&Self> {
        let result = self.apply(&request, &LOCAL_MODES);
        self.finish(result, on_error)
    }

    /// Compares a peer's snapshot against the held one and pushes a full
    /// resynchronisation on divergence.
    pub fn check(&self, values: &[Value], on_error: Option<&ErrorHandler>) -> CsbindResult<&Self> {
        let result = self.inner.core.reconcile(Some(values)).map(|_| ());
        self.finish(result, on_error)
    }

    /// Fetches the authority's current snapshot.
    pub fn get(&self) -> CsbindResult<Snapshot> {
        self.inner.authority.get()
    }

    /// Registers listeners called after every change.
    pub fn add_updates<I>(&self, listeners: I) -> &Self
    where
        I: IntoIterator<Item = UpdateListener>,
    {
        self.inner.core.add_listeners(listeners);
        self
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

    /// Delivers a request as if it arrived on the inbound channel.
    pub fn receive(&self, request: MutationRequest) -> CsbindResult<()> {
        self.inner.core.note_inbound();
        let result = self.apply(&request, &INBOUND_MODES);
        if let Err(e) = &result {
            self.inner.core.note_failure(e);
            warn!(name = %self.name(), error = %e, "inbound request rejected");
        }
        result
    }

    fn activate(&self, seed: Snapshot) -> CsbindResult<()> {
        let weak = Arc::downgrade(&self.inner);
        self.inner.core.activate(seed, Self::inbound_handler(weak))
    }

    fn inbound_handler(weak: Weak<Inner<T, A>>) -> InboundHandler {
        Arc::new(move |request| match weak.upgrade() {
            Some(inner) => Observable { inner }.receive(request),
            None => Ok(()),
        })
    }

    fn apply(&self, request: &MutationRequest, modes: &[Mode]) -> CsbindResult<()> {
        let inner = &self.inner;
        inner.core.guard(request, modes, |request| {
            if request.mode() == Some(Mode::Check) {
                inner.core.reconcile(request.values())?;
                return Ok(());
            }

            inner.pipeline.run(request, &inner.authority)?;
            let fresh = inner.authority.get()?;
            inner.core.settle(fresh, request)?;
            Ok(())
        })
    }

    fn finish(&self, result: CsbindResult<()>, on_error: Option<&ErrorHandler>) -> CsbindResult<&Self> {
        if let Err(e) = &result {
            self.inner.core.note_failure(e);
        }
        fail_soft(result, on_error)?;
        Ok(self)
    }
}

impl<T: Transport, A> std::fmt::Debug for Observable<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("name", &self.inner.core.config().name)
            .finish_non_exhaustive()
    }
}
