use serde::{Deserialize, Serialize};

use crate::api::MessageResponse;
use crate::models::AccountId;

/// Events pushed over the realtime gateway to one account's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    #[serde(rename = "ready")]
    Ready { user_id: AccountId },

    /// A direct message addressed to this account was stored
    #[serde(rename = "message")]
    MessageCreate(MessageResponse),
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    #[serde(rename = "identify")]
    Identify { token: String },

    /// Send a direct message; stored, then pushed to the receiver's channel
    #[serde(rename = "chat.send")]
    ChatSend {
        #[serde(rename = "receiverId")]
        receiver_id: AccountId,
        content: String,
        #[serde(default, rename = "eventId")]
        event_id: Option<i64>,
    },

    /// Counts as activity for presence
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_send_parses_from_wire_name() {
        let raw = r#"{"type":"chat.send","data":{"receiverId":12,"content":"hey"}}"#;
        let cmd: GatewayCommand = serde_json::from_str(raw).unwrap();
        assert_eq!(
            cmd,
            GatewayCommand::ChatSend {
                receiver_id: 12,
                content: "hey".into(),
                event_id: None,
            }
        );
    }

    #[test]
    fn heartbeat_has_no_payload() {
        let cmd: GatewayCommand = serde_json::from_str(r#"{"type":"heartbeat"}"#).unwrap();
        assert_eq!(cmd, GatewayCommand::Heartbeat);
    }

    #[test]
    fn ready_event_is_tagged() {
        let json = serde_json::to_value(GatewayEvent::Ready { user_id: 5 }).unwrap();
        assert_eq!(json["type"], "ready");
        assert_eq!(json["data"]["user_id"], 5);
    }
}
