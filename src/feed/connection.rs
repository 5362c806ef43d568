//! Connection lifecycle of the book feed.

use serde::Serialize;

/// State of the feed's link to the exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Subscribed,
    /// Waiting to retry after `attempt` consecutive failures.
    Reconnecting { attempt: u32 },
}

/// Input to the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    Start,
    /// A snapshot was fetched successfully.
    Fetched,
    /// A fetch failed.
    Failed,
    Stop,
}

impl ConnectionState {
    pub fn transition(self, event: FeedEvent) -> ConnectionState {
        use ConnectionState::*;

        match (self, event) {
            (_, FeedEvent::Stop) => Disconnected,
            (Disconnected, FeedEvent::Start) => Connecting,
            (state, FeedEvent::Start) => state,
            (Disconnected, _) => Disconnected,
            (_, FeedEvent::Fetched) => Subscribed,
            (Connecting, FeedEvent::Failed) | (Subscribed, FeedEvent::Failed) => {
                Reconnecting { attempt: 1 }
            }
            (Reconnecting { attempt }, FeedEvent::Failed) => Reconnecting {
                attempt: attempt.saturating_add(1),
            },
        }
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self, ConnectionState::Subscribed)
    }
}
