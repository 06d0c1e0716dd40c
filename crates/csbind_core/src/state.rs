//! State shared by both execution models.
//!
//! [`SharedCore`] owns the held snapshot and the listener list and
//! implements the model-independent steps of applying a request: guarding it,
//! detecting change against the held snapshot, fanning out to listeners,
//! relaying outbound and answering checks. The observables wrap it with
//! their own way of calling the authority.

use crate::authority::UpdateListener;
use crate::config::ObservableConfig;
use crate::error::{CsbindError, CsbindResult};
use crate::rules;
use crate::transport::{InboundHandler, Transport};
use csbind_codec::{snapshots_equal, Snapshot, Value};
use csbind_protocol::{ChannelNames, Mode, MutationRequest};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

/// Lifecycle of an observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservableState {
    /// Constructed, no snapshot held yet.
    Dormant,
    /// Seeded and subscribed.
    Active,
}

/// Counters kept per observable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservableStats {
    /// Mutations that changed the snapshot.
    pub applied: u64,
    /// Mutations that left the snapshot as it was.
    pub unchanged: u64,
    /// Calls that failed.
    pub rejected: u64,
    /// Checks answered.
    pub checks: u64,
    /// Full resynchronisation pushes published.
    pub resyncs_sent: u64,
    /// Requests delivered by the transport.
    pub inbound: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Result of comparing a fresh snapshot against the held one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The snapshot changed; listeners ran and the request was relayed.
    Changed,
    /// Nothing changed; nothing was done.
    Unchanged,
}

#[derive(Default)]
struct Held {
    last_values: Option<Snapshot>,
    listeners: Vec<UpdateListener>,
}

/// Model-independent observable state.
pub struct SharedCore<T> {
    config: ObservableConfig,
    channels: ChannelNames,
    transport: T,
    held: Mutex<Held>,
    stats: RwLock<ObservableStats>,
}

impl<T: Transport> SharedCore<T> {
    /// Validates `config` and creates a dormant core.
    pub fn new(config: ObservableConfig, transport: T) -> CsbindResult<Self> {
        rules::construct_contract().call(config, |config| {
            Ok(Self {
                channels: config.channels(),
                config,
                transport,
                held: Mutex::new(Held::default()),
                stats: RwLock::new(ObservableStats::default()),
            })
        })
    }

    /// Observable name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration.
    pub fn config(&self) -> &ObservableConfig {
        &self.config
    }

    /// Channel names.
    pub fn channels(&self) -> &ChannelNames {
        &self.channels
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ObservableState {
        if self.held.lock().last_values.is_some() {
            ObservableState::Active
        } else {
            ObservableState::Dormant
        }
    }

    /// Copy of the held snapshot.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.held.lock().last_values.clone()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.held.lock().listeners.len()
    }

    /// Copy of the counters.
    pub fn stats(&self) -> ObservableStats {
        self.stats.read().clone()
    }

    /// Seeds the snapshot and subscribes `handler` on the inbound channel.
    ///
    /// If the subscription fails the core returns to dormant.
    pub fn activate(&self, seed: Snapshot, handler: InboundHandler) -> CsbindResult<()> {
        rules::start_contract(&self.config.required_keys).call(seed, |seed| {
            {
                let mut held = self.held.lock();
                if held.last_values.is_some() {
                    return Err(CsbindError::AlreadyStarted);
                }
                held.last_values = Some(seed);
            }

            if let Err(e) = self.transport.receive(&self.channels.inbound, handler) {
                self.held.lock().last_values = None;
                return Err(e);
            }

            debug!(
                name = %self.config.name,
                channel = %self.channels.inbound,
                "observable started"
            );
            Ok(())
        })
    }

    /// Appends listeners.
    pub fn add_listeners<I>(&self, listeners: I)
    where
        I: IntoIterator<Item = UpdateListener>,
    {
        self.held.lock().listeners.extend(listeners);
    }

    /// Runs `target` with `request` once the request contract holds against
    /// the held snapshot.
    pub fn guard<'r, R, F>(
        &self,
        request: &'r MutationRequest,
        modes: &[Mode],
        target: F,
    ) -> CsbindResult<R>
    where
        F: FnOnce(&'r MutationRequest) -> CsbindResult<R>,
    {
        let len = self
            .held
            .lock()
            .last_values
            .as_ref()
            .map(Vec::len)
            .ok_or(CsbindError::NotStarted)?;
        rules::request_contract(len, modes, &self.config.required_keys).call(request, target)
    }

    /// Compares `fresh` against the held snapshot.
    ///
    /// On change the held snapshot is replaced, every listener is called
    /// with the new snapshot and `request`, and `request` is published
    /// unchanged on the outbound channel.
    pub fn settle(&self, fresh: Snapshot, request: &MutationRequest) -> CsbindResult<Settled> {
        let (current, listeners) = {
            let mut held = self.held.lock();
            let previous = held.last_values.as_ref().ok_or(CsbindError::NotStarted)?;
            if snapshots_equal(previous, &fresh) {
                drop(held);
                self.bump(|s| s.unchanged += 1);
                trace!(name = %self.config.name, mode = ?request.mode_text(), "mutation unchanged");
                return Ok(Settled::Unchanged);
            }
            held.last_values = Some(fresh.clone());
            (fresh, held.listeners.clone())
        };

        for listener in &listeners {
            listener(&current, request);
        }
        self.transport.send(&self.channels.outbound, request)?;

        self.bump(|s| s.applied += 1);
        debug!(
            name = %self.config.name,
            mode = ?request.mode_text(),
            len = current.len(),
            listeners = listeners.len(),
            "mutation applied"
        );
        Ok(Settled::Changed)
    }

    /// Answers a check with a peer's snapshot.
    ///
    /// Returns true if the snapshots diverged and a full resynchronisation
    /// push was published. `None` counts as divergent.
    pub fn reconcile(&self, incoming: Option<&[Value]>) -> CsbindResult<bool> {
        let held = self.snapshot().ok_or(CsbindError::NotStarted)?;
        self.bump(|s| s.checks += 1);

        if incoming.is_some_and(|values| snapshots_equal(values, &held)) {
            trace!(name = %self.config.name, "check matched");
            return Ok(false);
        }

        let len = held.len();
        self.transport
            .send(&self.channels.outbound, &MutationRequest::change_all(held))?;
        self.bump(|s| s.resyncs_sent += 1);
        debug!(name = %self.config.name, len, "check diverged, pushed full snapshot");
        Ok(true)
    }

    /// Counts a request delivered by the transport.
    pub fn note_inbound(&self) {
        self.bump(|s| s.inbound += 1);
    }

    /// Counts a failed call.
    pub fn note_failure(&self, error: &CsbindError) {
        self.bump(|s| {
            s.rejected += 1;
            s.last_error = Some(error.to_string());
        });
    }

    fn bump(&self, update: impl FnOnce(&mut ObservableStats)) {
        if self.config.track_stats {
            update(&mut self.stats.write());
        }
    }
}
