//! Loopback transport.
//!
//! Records every publish, delivers injected requests to subscribers and can
//! forward a channel of one transport into a channel of another, which is
//! enough to stand two endpoints up in one process.

use csbind_core::{CsbindError, CsbindResult, InboundHandler, Transport};
use csbind_protocol::{ChannelNames, MutationRequest};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A publish seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Channel published on.
    pub channel: String,
    /// Request as published.
    pub payload: MutationRequest,
}

struct Route {
    from: String,
    peer: Arc<LoopbackTransport>,
    to: String,
}

/// An in-process transport.
#[derive(Default)]
pub struct LoopbackTransport {
    subscribers: Mutex<HashMap<String, Vec<InboundHandler>>>,
    published: Mutex<Vec<Published>>,
    routes: Mutex<Vec<Route>>,
    delivery_errors: Mutex<Vec<CsbindError>>,
    fail_sends: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl LoopbackTransport {
    /// Creates a transport with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every publish so far, oldest first.
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    /// Payloads published on `channel`, oldest first.
    pub fn published_on(&self, channel: &str) -> Vec<MutationRequest> {
        self.published
            .lock()
            .iter()
            .filter(|p| p.channel == channel)
            .map(|p| p.payload.clone())
            .collect()
    }

    /// Errors returned by peers while forwarding publishes.
    pub fn delivery_errors(&self) -> Vec<CsbindError> {
        self.delivery_errors.lock().clone()
    }

    /// Forgets recorded publishes.
    pub fn clear(&self) {
        self.published.lock().clear();
    }

    /// Number of handlers subscribed to `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers.lock().get(channel).map_or(0, Vec::len)
    }

    /// Makes every later publish fail.
    pub fn set_send_failure(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Makes every later subscription fail.
    pub fn set_subscribe_failure(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Delivers `request` to every handler on `channel`.
    ///
    /// Every handler runs; the first failure is returned.
    pub fn inject(&self, channel: &str, request: MutationRequest) -> CsbindResult<()> {
        let handlers = self
            .subscribers
            .lock()
            .get(channel)
            .cloned()
            .unwrap_or_default();

        let mut first_error = None;
        for handler in handlers {
            if let Err(e) = handler(request.clone()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Forwards every publish on `from` to `peer`'s channel `to`.
    ///
    /// A peer's failure does not fail the publish; it is kept in
    /// [`LoopbackTransport::delivery_errors`].
    pub fn route(&self, from: impl Into<String>, peer: &Arc<LoopbackTransport>, to: impl Into<String>) {
        self.routes.lock().push(Route {
            from: from.into(),
            peer: Arc::clone(peer),
            to: to.into(),
        });
    }

    /// Forwards `source`'s outbound channel for `name` into `sink`'s inbound
    /// channel, so that the `sink` endpoint mirrors the `source` endpoint.
    pub fn connect(source: &Arc<LoopbackTransport>, sink: &Arc<LoopbackTransport>, name: &str) {
        let channels = ChannelNames::for_name(name);
        source.route(channels.outbound, sink, channels.inbound);
    }
}

impl Transport for LoopbackTransport {
    fn receive(&self, channel: &str, handler: InboundHandler) -> CsbindResult<()> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(CsbindError::transport(format!("cannot subscribe to {channel}")));
        }
        self.subscribers
            .lock()
            .entry(channel.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }

    fn send(&self, channel: &str, payload: &MutationRequest) -> CsbindResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(CsbindError::transport(format!("cannot publish on {channel}")));
        }
        self.published.lock().push(Published {
            channel: channel.to_string(),
            payload: payload.clone(),
        });

        let targets: Vec<(Arc<LoopbackTransport>, String)> = self
            .routes
            .lock()
            .iter()
            .filter(|route| route.from == channel)
            .map(|route| (Arc::clone(&route.peer), route.to.clone()))
            .collect();
        for (peer, to) in targets {
            if let Err(e) = peer.inject(&to, payload.clone()) {
                self.delivery_errors.lock().push(e);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("published", &self.published.lock().len())
            .field("routes", &self.routes.lock().len())
            .finish_non_exhaustive()
    }
}
