//! Database row types. These map directly to SQLite rows.
//! Conversion into bridge-types models happens here so callers never see
//! raw status strings or timestamp text.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use bridge_types::models::{Account, ConnectionRequest, Message, RequestStatus, Role};

pub struct AccountRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub last_active_at: Option<String>,
}

impl AccountRow {
    pub fn into_account(self) -> Result<Account> {
        let role: Role = self.role.parse().map_err(|e: String| anyhow!(e))?;
        let last_active_at = self
            .last_active_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;
        Ok(Account {
            id: self.id,
            email: self.email,
            display_name: self.name,
            role,
            last_active_at,
        })
    }
}

pub struct ConnectionRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: String,
    pub created_at: String,
}

impl ConnectionRow {
    pub fn into_request(self) -> Result<ConnectionRequest> {
        let status: RequestStatus = self.status.parse().map_err(|e: String| anyhow!(e))?;
        Ok(ConnectionRequest {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            status,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub event_id: Option<i64>,
    pub sent_at: String,
}

impl MessageRow {
    pub fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            sent_at: parse_timestamp(&self.sent_at)?,
            event_reference: self.event_id,
        })
    }
}

/// Fixed-width RFC 3339 so that text ordering in SQL matches time ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone: "YYYY-MM-DD HH:MM:SS".
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| anyhow!("Corrupt timestamp '{}': {}", raw, e))
}
