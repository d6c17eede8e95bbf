//! Bounded log of recent simulation events for external consumers.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A logged simulation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Tick at which the event occurred
    pub tick: u64,
    /// Human-readable description of the event
    pub description: String,
    /// Event category
    pub kind: EventKind,
}

/// Event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A predator captured its prey
    Predation,
    /// A flocking agent ate a food item
    Consumption,
    /// An egg was laid
    EggLaid,
    /// An egg hatched into a fish
    Hatch,
    /// A spawn request was skipped because the pool was full
    SpawnSkipped,
    /// An agent with a non-finite state was removed
    Deactivation,
}

/// Event log that keeps the most recent events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    /// Recent events, newest first
    events: VecDeque<LoggedEvent>,
    /// Maximum number of events to keep
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventLog {
    /// Creates a new event log with specified capacity
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Adds a new event to the log
    pub fn log(&mut self, tick: u64, kind: EventKind, description: String) {
        self.events.push_front(LoggedEvent {
            tick,
            description,
            kind,
        });
        self.events.truncate(self.max_events);
    }

    /// Returns all events, newest first
    pub fn events(&self) -> &VecDeque<LoggedEvent> {
        &self.events
    }

    /// Number of logged events of `kind`
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Clears all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
