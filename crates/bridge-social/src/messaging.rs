use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::debug;

use bridge_db::Database;
use bridge_types::api::MessageResponse;
use bridge_types::events::GatewayEvent;
use bridge_types::models::{AccountId, Message};

use crate::clock::Clock;
use crate::directory::Directory;
use crate::error::SocialError;
use crate::realtime::Publisher;

/// Longest accepted message body, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Direct messaging between two accounts.
pub trait MessagingService: Send + Sync {
    /// Stores a message from `sender_id` to `receiver_id` and pushes it to
    /// the receiver's realtime channel. No connection between the two is
    /// required.
    fn send(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        content: &str,
        event_reference: Option<i64>,
    ) -> Result<MessageResponse, SocialError>;

    /// Both directions between the pair, oldest first.
    fn history(&self, user_id: AccountId, other_id: AccountId) -> Result<Vec<Message>, SocialError>;

    /// Every message touching `user_id`, newest first.
    fn all_for_user(&self, user_id: AccountId) -> Result<Vec<Message>, SocialError>;

    fn latest_between(
        &self,
        user_id: AccountId,
        other_id: AccountId,
    ) -> Result<Option<Message>, SocialError>;
}

pub struct MessageStore {
    db: Arc<Database>,
    directory: Directory,
    clock: Arc<dyn Clock>,
    publisher: Arc<dyn Publisher>,
    /// Held across persist + publish so channel order matches storage order.
    /// Holds the last assigned `sent_at`, which never goes backwards.
    send_lock: Mutex<Option<DateTime<Utc>>>,
}

impl MessageStore {
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self, SocialError> {
        let last_sent_at = db.latest_sent_at()?;
        Ok(Self {
            directory: Directory::new(db.clone()),
            db,
            clock,
            publisher,
            send_lock: Mutex::new(last_sent_at),
        })
    }
}

fn validate_content(content: &str) -> Result<(), SocialError> {
    if content.trim().is_empty() {
        return Err(SocialError::InvalidInput("Message content must not be empty".into()));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(SocialError::InvalidInput(format!(
            "Message content exceeds {} characters",
            MAX_CONTENT_CHARS
        )));
    }
    Ok(())
}

impl MessagingService for MessageStore {
    fn send(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        content: &str,
        event_reference: Option<i64>,
    ) -> Result<MessageResponse, SocialError> {
        validate_content(content)?;
        let sender = self.directory.require(sender_id)?;
        let receiver = self.directory.require(receiver_id)?;

        let mut last_sent_at = self
            .send_lock
            .lock()
            .map_err(|e| anyhow!("send lock poisoned: {}", e))?;

        let mut sent_at = self.clock.now_micros();
        if let Some(last) = *last_sent_at {
            sent_at = sent_at.max(last);
        }

        let message = self
            .db
            .insert_message(sender_id, receiver_id, content, event_reference, sent_at)?;
        *last_sent_at = Some(sent_at);

        let payload = MessageResponse::new(&message, &sender.display_name, &receiver.display_name);
        let delivered = self
            .publisher
            .publish(receiver_id, GatewayEvent::MessageCreate(payload.clone()));
        drop(last_sent_at);

        debug!(
            "Message {} stored: {} -> {} (live delivery: {})",
            message.id, sender_id, receiver_id, delivered
        );
        Ok(payload)
    }

    fn history(
        &self,
        user_id: AccountId,
        other_id: AccountId,
    ) -> Result<Vec<Message>, SocialError> {
        Ok(self.db.get_conversation(user_id, other_id)?)
    }

    fn all_for_user(&self, user_id: AccountId) -> Result<Vec<Message>, SocialError> {
        Ok(self.db.get_messages_for_user(user_id)?)
    }

    fn latest_between(
        &self,
        user_id: AccountId,
        other_id: AccountId,
    ) -> Result<Option<Message>, SocialError> {
        Ok(self.db.latest_message_between(user_id, other_id)?)
    }
}
