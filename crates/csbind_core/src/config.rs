//! Configuration for observables.

use csbind_protocol::ChannelNames;
use std::fmt;

/// Configuration for an observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableConfig {
    /// Name used to derive the channel names.
    pub name: String,
    /// Keys every record must carry.
    pub required_keys: Vec<String>,
    /// Whether to keep operation counters.
    pub track_stats: bool,
}

impl ObservableConfig {
    /// Creates a configuration with no required keys.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_keys: Vec::new(),
            track_stats: true,
        }
    }

    /// Replaces the required record keys.
    pub fn with_required_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Appends one required record key.
    pub fn with_required_key(mut self, key: impl Into<String>) -> Self {
        self.required_keys.push(key.into());
        self
    }

    /// Enables or disables operation counters.
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.track_stats = enabled;
        self
    }

    /// Channel names derived from the name.
    pub fn channels(&self) -> ChannelNames {
        ChannelNames::for_name(&self.name)
    }
}

/// How authority calls and public operations are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionModel {
    /// Calls run to completion on the caller's stack.
    Direct,
    /// Calls return futures; each authority round trip is a suspension point.
    Future,
}

impl ExecutionModel {
    /// Returns the model name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionModel::Direct => "direct",
            ExecutionModel::Future => "future",
        }
    }
}

impl fmt::Display for ExecutionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
