use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account ids are assigned by the profile subsystem's `users` table.
pub type AccountId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Alumni,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Alumni => "ALUMNI",
            Self::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "ALUMNI" => Ok(Self::Alumni),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// An account as the social core sees it. Everything except `last_active_at`
/// is owned by the profile subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub last_active_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Pending and accepted requests block a new request between the same pair.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown request status '{}'", other)),
        }
    }
}

/// Order-independent key for an unordered pair of accounts.
pub fn canonical_pair(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: i64,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl ConnectionRequest {
    /// The other side of the request relative to `user_id`.
    pub fn counterpart(&self, user_id: AccountId) -> AccountId {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// A persisted direct message. Never updated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    /// Set when the message shares an event listing.
    pub event_reference: Option<i64>,
}

impl Message {
    pub fn counterpart(&self, user_id: AccountId) -> AccountId {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// Connection state between two accounts, seen from the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    None,
    PendingOutgoing,
    PendingIncoming,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub user_id: AccountId,
    pub other_user_id: AccountId,
    pub status: ConnectionState,
    pub request_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sender: Option<bool>,
    pub is_connected: bool,
    pub can_connect: bool,
    pub can_accept: bool,
    pub can_cancel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub user_id: AccountId,
    pub is_online: bool,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// Latest message exchanged with one counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(rename = "userId")]
    pub counterpart_id: AccountId,
    #[serde(rename = "userName")]
    pub counterpart_name: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub is_online: bool,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// An accepted connection with its latest message, for the chat sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPreview {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_online: bool,
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_order_independent() {
        assert_eq!(canonical_pair(7, 3), (3, 7));
        assert_eq!(canonical_pair(3, 7), (3, 7));
        assert_eq!(canonical_pair(4, 4), (4, 4));
    }

    #[test]
    fn request_status_round_trips_through_str() {
        for status in [RequestStatus::Pending, RequestStatus::Accepted, RequestStatus::Rejected] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("pending".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn only_pending_and_accepted_are_active() {
        assert!(RequestStatus::Pending.is_active());
        assert!(RequestStatus::Accepted.is_active());
        assert!(!RequestStatus::Rejected.is_active());
    }

    #[test]
    fn counterpart_resolves_either_side() {
        let req = ConnectionRequest {
            id: 1,
            sender_id: 10,
            receiver_id: 20,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        };
        assert_eq!(req.counterpart(10), 20);
        assert_eq!(req.counterpart(20), 10);
    }

    #[test]
    fn connection_state_serializes_screaming_snake() {
        let json = serde_json::to_string(&ConnectionState::PendingIncoming).unwrap();
        assert_eq!(json, "\"PENDING_INCOMING\"");
    }
}
