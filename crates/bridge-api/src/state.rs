use std::sync::Arc;

use bridge_social::{
    ConnectionService, ConversationAggregator, Directory, MessagingService, PresenceTracker,
};

pub type AppState = Arc<AppStateInner>;

/// Services shared by every REST handler.
pub struct AppStateInner {
    pub connections: Arc<dyn ConnectionService>,
    pub messaging: Arc<dyn MessagingService>,
    pub presence: PresenceTracker,
    pub aggregator: ConversationAggregator,
    pub directory: Directory,
    pub jwt_secret: String,
}
