//! Validates and rebroadcasts ephemeral interaction events.
//!
//! Interactions bypass the store entirely; nothing here is persisted.

use std::sync::Arc;
use serde_json::Value;

use crate::broadcast::BroadcastHub;
use crate::error::SyncError;
use crate::model::{InteractionEvent, StateChanged};
use crate::protocol::EVENT_STATE_CHANGED;

pub struct InteractionRelay {
    hub: Arc<BroadcastHub>,
}

impl InteractionRelay {
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        Self { hub }
    }

    /// Relay `{type, button_id}` to all subscribers as
    /// `state_changed {id, state, status: "success"}`.
    ///
    /// On validation failure nothing is broadcast; the caller is expected
    /// to report the error to the sender alone.
    pub async fn relay(&self, raw: &Value) -> Result<StateChanged, SyncError> {
        let event = InteractionEvent::from_raw(raw).map_err(|e| {
            log::warn!("Validation error on button interaction ({e}): {raw}");
            e
        })?;

        log::info!(
            "Button interaction: {} on button {}",
            event.interaction_type,
            event.button_id
        );

        let payload = StateChanged::from(event);
        self.hub
            .publish(EVENT_STATE_CHANGED, &payload)
            .await
            .map_err(|e| SyncError::Unknown(e.to_string()))?;
        Ok(payload)
    }
}
