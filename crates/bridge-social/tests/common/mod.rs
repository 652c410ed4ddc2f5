#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use bridge_db::Database;
use bridge_social::{
    ConnectionGraph, ConnectionService, ConversationAggregator, Directory, ManualClock,
    MessageStore, MessagingService, PresenceTracker, Publisher,
};
use bridge_types::events::GatewayEvent;
use bridge_types::models::{AccountId, Role};

/// In-memory subscriber registry standing in for the gateway dispatcher.
#[derive(Default)]
pub struct RecordingPublisher {
    subscribed: Mutex<HashSet<AccountId>>,
    delivered: Mutex<Vec<(AccountId, GatewayEvent)>>,
}

impl RecordingPublisher {
    pub fn subscribe(&self, channel: AccountId) {
        self.subscribed.lock().unwrap().insert(channel);
    }

    pub fn delivered(&self) -> Vec<(AccountId, GatewayEvent)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, channel: AccountId, event: GatewayEvent) -> bool {
        if !self.subscribed.lock().unwrap().contains(&channel) {
            return false;
        }
        self.delivered.lock().unwrap().push((channel, event));
        true
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap()
}

pub struct Harness {
    pub db: Arc<Database>,
    pub clock: Arc<ManualClock>,
    pub publisher: Arc<RecordingPublisher>,
    pub graph: Arc<ConnectionGraph>,
    pub presence: PresenceTracker,
    pub messages: Arc<MessageStore>,
    pub aggregator: ConversationAggregator,
}

impl Harness {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(start_time()));
        let publisher = Arc::new(RecordingPublisher::default());

        let graph = Arc::new(ConnectionGraph::new(db.clone(), clock.clone()));
        let presence = PresenceTracker::new(db.clone(), clock.clone());
        let messages =
            Arc::new(MessageStore::new(db.clone(), clock.clone(), publisher.clone()).unwrap());
        let aggregator = ConversationAggregator::new(
            graph.clone() as Arc<dyn ConnectionService>,
            messages.clone() as Arc<dyn MessagingService>,
            presence.clone(),
            Directory::new(db.clone()),
        );

        Self {
            db,
            clock,
            publisher,
            graph,
            presence,
            messages,
            aggregator,
        }
    }

    pub fn account(&self, name: &str) -> AccountId {
        let email = format!("{}@uni.edu", name.to_lowercase());
        self.db.create_account(&email, name, Role::Student).unwrap()
    }

    pub fn connect(&self, a: AccountId, b: AccountId) {
        let request = self.graph.send_request(a, b).unwrap();
        self.graph.respond(request.id, true).unwrap();
    }
}
