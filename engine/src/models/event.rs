//! Event logging for auditing and replay.
//!
//! Every successful state-changing operation appends one typed event. The
//! log is the observability surface of the engine: it supports querying by
//! time, type, session, and participant, and serializes to JSON for export.

use crate::core::time::Timestamp;
use crate::models::session::SessionId;
use crate::rollover::RolloverOutcome;
use serde::{Deserialize, Serialize};

/// A state change that occurred at a specific instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    SessionCreated {
        at: Timestamp,
        session_id: SessionId,
        coordinator: String,
        unit_ref: String,
        max_supply: u64,
    },

    Deposited {
        at: Timestamp,
        session_id: SessionId,
        participant: String,
        amount: i64,
    },

    Withdrawn {
        at: Timestamp,
        session_id: SessionId,
        participant: String,
        amount: i64,
    },

    /// Lazy price discovery fixed the clearing price for the epoch.
    ClearingPriceSet {
        at: Timestamp,
        session_id: SessionId,
        result_price: i64,
        effective_price: i64,
    },

    UnitsMinted {
        at: Timestamp,
        session_id: SessionId,
        participant: String,
        units: u64,
        unit_price: i64,
        first_index: u64,
        receipt_id: String,
    },

    DepositForgone {
        at: Timestamp,
        session_id: SessionId,
        participant: String,
        released: i64,
        penalty: i64,
    },

    RolledOver {
        at: Timestamp,
        session_id: SessionId,
        outcome: RolloverOutcome,
    },

    RewardsWithdrawn {
        at: Timestamp,
        coordinator: String,
        asset: String,
        amount: i64,
    },
}

impl Event {
    /// Instant the event occurred.
    pub fn at(&self) -> Timestamp {
        match self {
            Event::SessionCreated { at, .. } => *at,
            Event::Deposited { at, .. } => *at,
            Event::Withdrawn { at, .. } => *at,
            Event::ClearingPriceSet { at, .. } => *at,
            Event::UnitsMinted { at, .. } => *at,
            Event::DepositForgone { at, .. } => *at,
            Event::RolledOver { at, .. } => *at,
            Event::RewardsWithdrawn { at, .. } => *at,
        }
    }

    /// Short event-type tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SessionCreated { .. } => "SessionCreated",
            Event::Deposited { .. } => "Deposited",
            Event::Withdrawn { .. } => "Withdrawn",
            Event::ClearingPriceSet { .. } => "ClearingPriceSet",
            Event::UnitsMinted { .. } => "UnitsMinted",
            Event::DepositForgone { .. } => "DepositForgone",
            Event::RolledOver { .. } => "RolledOver",
            Event::RewardsWithdrawn { .. } => "RewardsWithdrawn",
        }
    }

    /// Session the event relates to, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Event::SessionCreated { session_id, .. } => Some(*session_id),
            Event::Deposited { session_id, .. } => Some(*session_id),
            Event::Withdrawn { session_id, .. } => Some(*session_id),
            Event::ClearingPriceSet { session_id, .. } => Some(*session_id),
            Event::UnitsMinted { session_id, .. } => Some(*session_id),
            Event::DepositForgone { session_id, .. } => Some(*session_id),
            Event::RolledOver { session_id, .. } => Some(*session_id),
            Event::RewardsWithdrawn { .. } => None,
        }
    }

    /// Acting participant, if any.
    pub fn participant(&self) -> Option<&str> {
        match self {
            Event::Deposited { participant, .. } => Some(participant),
            Event::Withdrawn { participant, .. } => Some(participant),
            Event::UnitsMinted { participant, .. } => Some(participant),
            Event::DepositForgone { participant, .. } => Some(participant),
            _ => None,
        }
    }
}

/// Append-only event log with convenience queries.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at(&self, at: Timestamp) -> Vec<&Event> {
        self.events.iter().filter(|e| e.at() == at).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_session(&self, session_id: SessionId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.session_id() == Some(session_id))
            .collect()
    }

    pub fn events_for_participant(&self, participant: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.participant() == Some(participant))
            .collect()
    }

    /// Export the whole log as a JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposited(at: Timestamp, participant: &str) -> Event {
        Event::Deposited {
            at,
            session_id: 0,
            participant: participant.to_string(),
            amount: 1_000,
        }
    }

    #[test]
    fn test_event_accessors() {
        let e = deposited(42, "ALICE");
        assert_eq!(e.at(), 42);
        assert_eq!(e.event_type(), "Deposited");
        assert_eq!(e.session_id(), Some(0));
        assert_eq!(e.participant(), Some("ALICE"));
    }

    #[test]
    fn test_log_queries() {
        let mut log = EventLog::new();
        log.log(deposited(1, "ALICE"));
        log.log(deposited(1, "BOB"));
        log.log(Event::RewardsWithdrawn {
            at: 2,
            coordinator: "COORD".to_string(),
            asset: "CREDIT".to_string(),
            amount: 500,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.events_at(1).len(), 2);
        assert_eq!(log.events_of_type("Deposited").len(), 2);
        assert_eq!(log.events_for_session(0).len(), 2);
        assert_eq!(log.events_for_participant("BOB").len(), 1);
    }

    #[test]
    fn test_log_round_trips_through_json() {
        let mut log = EventLog::new();
        log.log(deposited(7, "ALICE"));

        let json = log.to_json().unwrap();
        let parsed: Vec<Event> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, log.events());
    }
}
