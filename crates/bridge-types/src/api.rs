use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Account, AccountId, ConnectionRequest, Message, RequestStatus, Role};

// -- JWT Claims --

/// Bearer token claims. Tokens are minted by the credential service; this
/// side only validates them. Shared by the REST middleware and the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: AccountId,
    pub email: String,
    pub exp: usize,
}

// -- Accounts --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.display_name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

// -- Connections --

#[derive(Debug, Deserialize)]
pub struct RespondQuery {
    pub accept: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequestResponse {
    pub id: i64,
    pub sender: AccountSummary,
    pub receiver: AccountSummary,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl ConnectionRequestResponse {
    pub fn new(request: &ConnectionRequest, sender: &Account, receiver: &Account) -> Self {
        Self {
            id: request.id,
            sender: sender.into(),
            receiver: receiver.into(),
            status: request.status,
            created_at: request.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -- Presence --

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: AccountId,
    pub content: String,
    #[serde(default)]
    pub event_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub sender_id: AccountId,
    pub sender_name: String,
    pub recipient_id: AccountId,
    pub recipient_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_event_link: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
}

impl MessageResponse {
    pub fn new(message: &Message, sender_name: &str, recipient_name: &str) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            sender_name: sender_name.to_string(),
            recipient_id: message.receiver_id,
            recipient_name: recipient_name.to_string(),
            content: message.content.clone(),
            timestamp: message.sent_at,
            is_event_link: message.event_reference.is_some(),
            event_id: message.event_reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_accepts_missing_event_id() {
        let req: SendMessageRequest =
            serde_json::from_str(r#"{"recipientId": 4, "content": "hello"}"#).unwrap();
        assert_eq!(req.recipient_id, 4);
        assert_eq!(req.event_id, None);
    }

    #[test]
    fn message_response_flags_event_links() {
        let message = Message {
            id: 9,
            sender_id: 1,
            receiver_id: 2,
            content: "see you there".into(),
            sent_at: Utc::now(),
            event_reference: Some(33),
        };
        let json = serde_json::to_value(MessageResponse::new(&message, "Ada", "Grace")).unwrap();
        assert_eq!(json["isEventLink"], true);
        assert_eq!(json["eventId"], 33);
        assert_eq!(json["recipientName"], "Grace");
    }
}
