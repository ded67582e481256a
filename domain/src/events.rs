//! Domain events raised by the user service and the handlers that consume them.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::UserId;

/// Something that happened to a user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserEvent {
    Added { id: UserId, email: String },
    Deleted { id: UserId },
}

impl UserEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            UserEvent::Added { id, .. } | UserEvent::Deleted { id } => *id,
        }
    }
}

/// Receives domain events. Implementations dispatch on the event kind.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &UserEvent);
}

/// Writes every event to the tracing pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn handle(&self, event: &UserEvent) {
        let id = event.user_id();
        match event {
            UserEvent::Added { email, .. } => info!(user_id = %id, %email, "user added"),
            UserEvent::Deleted { .. } => info!(user_id = %id, "user deleted"),
        }
    }
}

/// Keeps received events in arrival order. Handy for tests and audits.
#[derive(Debug, Default)]
pub struct RecordingEventHandler {
    events: Mutex<Vec<UserEvent>>,
}

impl RecordingEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything handled so far.
    pub fn events(&self) -> Vec<UserEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventHandler for RecordingEventHandler {
    fn handle(&self, event: &UserEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}

impl<H: EventHandler + ?Sized> EventHandler for std::sync::Arc<H> {
    fn handle(&self, event: &UserEvent) {
        (**self).handle(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_handler_keeps_order() {
        let h = RecordingEventHandler::new();
        h.handle(&UserEvent::Added {
            id: UserId::new(1),
            email: "a@e.com".into(),
        });
        h.handle(&UserEvent::Deleted { id: UserId::new(1) });
        let events = h.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], UserEvent::Added { .. }));
        assert_eq!(events[1], UserEvent::Deleted { id: UserId::new(1) });
    }

    #[test]
    fn user_id_covers_every_kind() {
        let added = UserEvent::Added {
            id: UserId::new(4),
            email: "x@e.com".into(),
        };
        assert_eq!(added.user_id(), UserId::new(4));
        assert_eq!(UserEvent::Deleted { id: UserId::new(9) }.user_id(), UserId::new(9));
    }

    #[test]
    fn logging_handler_accepts_every_kind() {
        let h = LoggingEventHandler;
        h.handle(&UserEvent::Added {
            id: UserId::new(1),
            email: "a@e.com".into(),
        });
        h.handle(&UserEvent::Deleted { id: UserId::new(1) });
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_string(&UserEvent::Deleted { id: UserId::new(2) }).unwrap();
        assert_eq!(json, r#"{"kind":"deleted","id":2}"#);
    }
}
