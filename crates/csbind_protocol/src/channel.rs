//! Channel naming.

/// Prefix of the channel an endpoint subscribes to.
pub const INBOUND_PREFIX: &str = "csbindSend";

/// Prefix of the channel an endpoint publishes on.
pub const OUTBOUND_PREFIX: &str = "csbindReceive";

/// The pair of channels derived from an observable name.
///
/// Names must match the peer byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNames {
    /// Channel subscribed for inbound requests.
    pub inbound: String,
    /// Channel used for outbound publishes.
    pub outbound: String,
}

impl ChannelNames {
    /// Derives the channels for `name`.
    pub fn for_name(name: &str) -> Self {
        Self {
            inbound: format!("{INBOUND_PREFIX}{name}"),
            outbound: format!("{OUTBOUND_PREFIX}{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_match_wire_contract() {
        let channels = ChannelNames::for_name("test");
        assert_eq!(channels.inbound, "csbindSendtest");
        assert_eq!(channels.outbound, "csbindReceivetest");
    }
}
