use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use bridge_types::models::{
    Account, AccountId, ConnectionPreview, ConversationSummary, Message,
};

use crate::directory::Directory;
use crate::error::SocialError;
use crate::graph::ConnectionService;
use crate::messaging::MessagingService;
use crate::presence::PresenceTracker;

/// Builds the per-user conversation list and the chat sidebar.
/// Nothing is cached; every call reads current state.
pub struct ConversationAggregator {
    connections: Arc<dyn ConnectionService>,
    messages: Arc<dyn MessagingService>,
    presence: PresenceTracker,
    directory: Directory,
}

impl ConversationAggregator {
    pub fn new(
        connections: Arc<dyn ConnectionService>,
        messages: Arc<dyn MessagingService>,
        presence: PresenceTracker,
        directory: Directory,
    ) -> Self {
        Self {
            connections,
            messages,
            presence,
            directory,
        }
    }

    /// One summary per counterpart the user has exchanged messages with,
    /// carrying the latest message, most recent conversation first.
    pub fn conversations(
        &self,
        user_id: AccountId,
    ) -> Result<Vec<ConversationSummary>, SocialError> {
        let latest = latest_per_counterpart(user_id, self.messages.all_for_user(user_id)?);

        let ids: Vec<AccountId> = latest.iter().map(|(id, _)| *id).collect();
        let accounts: HashMap<AccountId, Account> = self
            .directory
            .find_many(&ids)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(latest
            .into_iter()
            .filter_map(|(counterpart_id, message)| {
                let Some(account) = accounts.get(&counterpart_id) else {
                    warn!(
                        "Message {} references missing account {}",
                        message.id, counterpart_id
                    );
                    return None;
                };
                Some(ConversationSummary {
                    counterpart_id,
                    counterpart_name: account.display_name.clone(),
                    last_message: message.content,
                    last_message_at: message.sent_at,
                    is_online: self.presence.is_online(account),
                    last_active_at: account.last_active_at,
                })
            })
            .collect())
    }

    /// Accepted connections only, each with its latest message if any.
    pub fn connections_with_preview(
        &self,
        user_id: AccountId,
    ) -> Result<Vec<ConnectionPreview>, SocialError> {
        let mut previews = self
            .connections
            .list_active_connections(user_id)?
            .into_iter()
            .map(|account| -> Result<ConnectionPreview, SocialError> {
                let latest = self.messages.latest_between(user_id, account.id)?;
                Ok(ConnectionPreview {
                    id: account.id,
                    is_online: self.presence.is_online(&account),
                    last_active_at: account.last_active_at,
                    last_message: latest.as_ref().map(|m| m.content.clone()),
                    last_message_at: latest.as_ref().map(|m| m.sent_at),
                    name: account.display_name,
                    email: account.email,
                    role: account.role,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        previews.sort_by(preview_order);
        Ok(previews)
    }
}

/// Keeps the first message seen per counterpart. Input is newest-first, so
/// that first message is the latest one.
fn latest_per_counterpart(
    user_id: AccountId,
    newest_first: Vec<Message>,
) -> Vec<(AccountId, Message)> {
    let mut seen = HashSet::new();
    newest_first
        .into_iter()
        .filter_map(|message| {
            let counterpart = message.counterpart(user_id);
            seen.insert(counterpart).then_some((counterpart, message))
        })
        .collect()
}

/// Recent conversations first, then connections with no messages, online
/// before offline. Equal entries keep their order.
pub fn preview_order(a: &ConnectionPreview, b: &ConnectionPreview) -> Ordering {
    match (a.last_message_at, b.last_message_at) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.is_online.cmp(&a.is_online),
    }
}
