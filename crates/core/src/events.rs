//! Attempt lifecycle events

use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// States of one fragment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptState {
    Clean,
    Decompiling,
    Spliced,
    Reconciled,
    Verified,
    Committed,
    Failed,
    Restored,
}

impl std::fmt::Display for AttemptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptState::Clean => write!(f, "CLEAN"),
            AttemptState::Decompiling => write!(f, "DECOMPILING"),
            AttemptState::Spliced => write!(f, "SPLICED"),
            AttemptState::Reconciled => write!(f, "RECONCILED"),
            AttemptState::Verified => write!(f, "VERIFIED"),
            AttemptState::Committed => write!(f, "COMMITTED"),
            AttemptState::Failed => write!(f, "FAILED"),
            AttemptState::Restored => write!(f, "RESTORED"),
        }
    }
}

/// Pipeline events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttemptEvent {
    Started {
        attempt: Uuid,
        marker: Marker,
        at: DateTime<Utc>,
    },
    StateChanged {
        attempt: Uuid,
        state: AttemptState,
        at: DateTime<Utc>,
    },
    Finished {
        attempt: Uuid,
        outcome: Outcome,
        reason: Option<String>,
        at: DateTime<Utc>,
    },
}

impl AttemptEvent {
    pub fn attempt_id(&self) -> Uuid {
        match self {
            AttemptEvent::Started { attempt, .. }
            | AttemptEvent::StateChanged { attempt, .. }
            | AttemptEvent::Finished { attempt, .. } => *attempt,
        }
    }
}

/// Event bus for broadcasting events
pub struct EventBus {
    subscribers: Vec<Box<dyn Fn(&AttemptEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&AttemptEvent) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    pub fn emit(&self, event: AttemptEvent) {
        for subscriber in &self.subscribers {
            subscriber(&event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
