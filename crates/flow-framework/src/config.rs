//! # Runtime Configuration
//!
//! Plain configuration structs for actors and pipelines. Both deserialize with
//! `serde` (every field optional, falling back to [`Default`]) so an
//! application can embed them in its own config, and both offer `with_*`
//! setters for code-first construction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one [`Actor`](crate::Actor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Name used in log fields.
    pub name: String,
    /// Mailbox capacity. Senders wait once this many messages are queued.
    pub mailbox_capacity: usize,
    /// Deadline applied by [`ActorClient::request`](crate::ActorClient::request).
    /// `None` waits indefinitely.
    #[serde(with = "millis")]
    pub request_timeout: Option<Duration>,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: "actor".to_string(),
            mailbox_capacity: 32,
            request_timeout: None,
        }
    }
}

impl ActorConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// What a pipeline does when a transform fails on one item.
///
/// Fixed when the pipeline is built; it never changes while items flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Tag the item as failed and keep going.
    #[default]
    Forward,
    /// Record the failure and cancel the whole pipeline.
    FailFast,
}

/// Settings for one [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of every channel between stages.
    pub channel_capacity: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
            failure_policy: FailurePolicy::Forward,
        }
    }
}

impl PipelineConfig {
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn fail_fast(self) -> Self {
        self.with_failure_policy(FailurePolicy::FailFast)
    }
}

/// `Option<Duration>` as whole milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&whole_millis(*d)),
            None => serializer.serialize_none(),
        }
    }

    /// Saturates at `u64::MAX` rather than wrapping.
    pub(super) fn whole_millis(d: Duration) -> u64 {
        u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

/// Zero-capacity channels are not allowed by tokio; clamp and say so.
pub(crate) fn clamp_capacity(what: &'static str, capacity: usize) -> usize {
    if capacity == 0 {
        tracing::warn!(what, "capacity 0 is not allowed, using 1");
        1
    } else {
        capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let actor = ActorConfig::default();
        assert_eq!(actor.mailbox_capacity, 32);
        assert_eq!(actor.request_timeout, None);

        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.channel_capacity, 16);
        assert_eq!(pipeline.failure_policy, FailurePolicy::Forward);
    }

    #[test]
    fn test_builders() {
        let actor = ActorConfig::named("ledger")
            .with_mailbox_capacity(4)
            .with_request_timeout(Duration::from_millis(250));
        assert_eq!(actor.name, "ledger");
        assert_eq!(actor.mailbox_capacity, 4);
        assert_eq!(actor.request_timeout, Some(Duration::from_millis(250)));

        let pipeline = PipelineConfig::default().with_channel_capacity(2).fail_fast();
        assert_eq!(pipeline.channel_capacity, 2);
        assert_eq!(pipeline.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_huge_timeout_saturates() {
        assert_eq!(millis::whole_millis(Duration::from_millis(250)), 250);
        assert_eq!(millis::whole_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_clamp_capacity() {
        assert_eq!(clamp_capacity("mailbox", 0), 1);
        assert_eq!(clamp_capacity("mailbox", 8), 8);
    }
}
