//! Registry notifications.
//!
//! The deployed contract emits `TopicCreated`, `Voted` and `VotesFinalized`
//! logs. Here they are delivered synchronously to every registered
//! [`EventSink`] after the mutation that caused them has been applied.
//! Failed calls emit nothing.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Notification emitted once per successful registry write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    TopicCreated {
        topic_id: u64,
        description: String,
        end_time: u64,
    },
    Voted {
        topic_id: u64,
        voter: Address,
        option: String,
    },
    VotesFinalized {
        topic_id: u64,
    },
}

impl RegistryEvent {
    /// Topic the event refers to.
    pub fn topic_id(&self) -> u64 {
        match self {
            Self::TopicCreated { topic_id, .. }
            | Self::Voted { topic_id, .. }
            | Self::VotesFinalized { topic_id } => *topic_id,
        }
    }

    /// Event name as it appears in the contract ABI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TopicCreated { .. } => "TopicCreated",
            Self::Voted { .. } => "Voted",
            Self::VotesFinalized { .. } => "VotesFinalized",
        }
    }
}

/// Observer of registry notifications.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &RegistryEvent);
}

/// In-memory recorder of every event it sees.
///
/// Clones share the same log, so a test can keep one handle and give the
/// other to the registry.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RegistryEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far, in emission order.
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for EventLog {
    fn notify(&self, event: &RegistryEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        let handle = log.clone();

        log.notify(&RegistryEvent::TopicCreated {
            topic_id: 0,
            description: "d".to_string(),
            end_time: 10,
        });
        log.notify(&RegistryEvent::VotesFinalized { topic_id: 0 });

        let events = handle.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "TopicCreated");
        assert_eq!(events[1], RegistryEvent::VotesFinalized { topic_id: 0 });
    }

    #[test]
    fn test_event_topic_id() {
        let event = RegistryEvent::Voted {
            topic_id: 4,
            voter: Address::from_bytes([1u8; 20]),
            option: "Option1".to_string(),
        };
        assert_eq!(event.topic_id(), 4);
        assert_eq!(event.name(), "Voted");
    }
}
