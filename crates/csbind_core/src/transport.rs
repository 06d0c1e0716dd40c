//! Transport abstraction.

use crate::error::CsbindResult;
use csbind_protocol::MutationRequest;
use std::sync::Arc;

/// Handler the transport invokes for every request arriving on a channel.
pub type InboundHandler = Arc<dyn Fn(MutationRequest) -> CsbindResult<()> + Send + Sync>;

/// A publish/subscribe transport connecting two endpoints.
///
/// The engine subscribes once on its inbound channel and publishes on its
/// outbound channel. Implementations own delivery, ordering and framing.
pub trait Transport: Send + Sync {
    /// Subscribes `handler` to `channel`.
    fn receive(&self, channel: &str, handler: InboundHandler) -> CsbindResult<()>;

    /// Publishes `payload` on `channel`.
    fn send(&self, channel: &str, payload: &MutationRequest) -> CsbindResult<()>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn receive(&self, channel: &str, handler: InboundHandler) -> CsbindResult<()> {
        (**self).receive(channel, handler)
    }

    fn send(&self, channel: &str, payload: &MutationRequest) -> CsbindResult<()> {
        (**self).send(channel, payload)
    }
}
