use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

use bridge_social::Publisher;
use bridge_types::events::GatewayEvent;
use bridge_types::models::AccountId;

/// Routes realtime events to the live socket of each account.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// Per-account targeted send channels: account_id -> (conn_id, sender).
    /// A newer connection for the same account replaces the older one.
    user_channels: RwLock<HashMap<AccountId, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a per-account channel. Returns (conn_id, receiver).
    pub fn register_user_channel(
        &self,
        user_id: AccountId,
    ) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .user_channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id, (conn_id, tx));
        (conn_id, rx)
    }

    /// Unregister a per-account channel, but only if conn_id still owns it.
    pub fn unregister_user_channel(&self, user_id: AccountId, conn_id: Uuid) {
        let mut channels = self
            .inner
            .user_channels
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if channels
            .get(&user_id)
            .is_some_and(|(stored, _)| *stored == conn_id)
        {
            channels.remove(&user_id);
        }
    }

    /// Send a targeted event. Returns false when nobody is listening.
    pub fn send_to_user(&self, user_id: AccountId, event: GatewayEvent) -> bool {
        let channels = self
            .inner
            .user_channels
            .read()
            .unwrap_or_else(|e| e.into_inner());
        match channels.get(&user_id) {
            Some((_, tx)) => tx.send(event).is_ok(),
            None => {
                trace!("No live channel for {}, event dropped", user_id);
                false
            }
        }
    }
}

impl Publisher for Dispatcher {
    fn publish(&self, channel: AccountId, event: GatewayEvent) -> bool {
        self.send_to_user(channel, event)
    }
}
