use crate::Database;
use crate::models::{AccountRow, ConnectionRow, MessageRow, format_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use bridge_types::models::{
    Account, AccountId, ConnectionRequest, Message, RequestStatus, Role, canonical_pair,
};

const ACCOUNT_COLUMNS: &str = "id, email, name, role, last_active_at";
const REQUEST_COLUMNS: &str = "id, sender_id, receiver_id, status, created_at";
const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, event_id, sent_at";

/// Result of trying to open a new request between a pair.
#[derive(Debug)]
pub enum RequestInsert {
    Created(ConnectionRequest),
    /// An active request already exists for the pair; nothing was written.
    Blocked(ConnectionRequest),
}

/// Result of answering a request.
#[derive(Debug)]
pub enum AnswerOutcome {
    Answered(ConnectionRequest),
    NotFound,
    /// The request left PENDING before this answer arrived.
    AlreadyAnswered(ConnectionRequest),
}

impl Database {
    // -- Accounts (directory) --

    /// Rows are owned by the profile subsystem; this exists for seeding.
    pub fn create_account(&self, email: &str, name: &str, role: Role) -> Result<AccountId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, name, role) VALUES (?1, ?2, ?3)",
                (email, name, role.as_str()),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.with_conn(|conn| query_account(conn, "id = ?1", id))
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.with_conn(|conn| query_account(conn, "email = ?1", email))
    }

    /// Batch lookup. Unknown ids are simply absent from the result.
    pub fn get_accounts(&self, ids: &[AccountId]) -> Result<Vec<Account>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {} FROM users WHERE id IN ({}) ORDER BY id",
                ACCOUNT_COLUMNS,
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

            let rows = stmt
                .query_map(params.as_slice(), map_account)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(AccountRow::into_account).collect()
        })
    }

    /// Returns false when no such account exists.
    pub fn touch_account(&self, id: AccountId, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET last_active_at = ?2 WHERE id = ?1",
                rusqlite::params![id, format_timestamp(at)],
            )?;
            Ok(updated > 0)
        })
    }

    // -- Connection requests --

    /// Opens a PENDING request from `sender_id` to `receiver_id` unless an
    /// active request already exists for the pair. A REJECTED record for the
    /// pair is deleted in the same transaction.
    pub fn insert_connection_request(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        created_at: DateTime<Utc>,
    ) -> Result<RequestInsert> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(existing) = query_request_between(&tx, sender_id, receiver_id)? {
                if existing.status.is_active() {
                    return Ok(RequestInsert::Blocked(existing));
                }
                tx.execute("DELETE FROM connection_requests WHERE id = ?1", [existing.id])?;
            }

            let (lo, hi) = canonical_pair(sender_id, receiver_id);
            let inserted = tx.execute(
                "INSERT INTO connection_requests (sender_id, receiver_id, pair_lo, pair_hi, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    sender_id,
                    receiver_id,
                    lo,
                    hi,
                    RequestStatus::Pending.as_str(),
                    format_timestamp(created_at)
                ],
            );

            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    // Another writer won the pair; report what it stored.
                    drop(tx);
                    return match query_request_between(conn, sender_id, receiver_id)? {
                        Some(existing) => Ok(RequestInsert::Blocked(existing)),
                        None => Err(e.into()),
                    };
                }
                Err(e) => return Err(e.into()),
            }

            let request = ConnectionRequest {
                id: tx.last_insert_rowid(),
                sender_id,
                receiver_id,
                status: RequestStatus::Pending,
                created_at,
            };
            tx.commit()?;
            Ok(RequestInsert::Created(request))
        })
    }

    pub fn get_connection_request(&self, id: i64) -> Result<Option<ConnectionRequest>> {
        self.with_conn(|conn| query_request_by_id(conn, id))
    }

    /// Direction-agnostic lookup through the canonical pair key.
    pub fn find_request_between(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> Result<Option<ConnectionRequest>> {
        self.with_conn(|conn| query_request_between(conn, a, b))
    }

    /// Moves a PENDING request to `status`. Only the first answer wins.
    pub fn answer_connection_request(
        &self,
        id: i64,
        status: RequestStatus,
    ) -> Result<AnswerOutcome> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE connection_requests SET status = ?2 WHERE id = ?1 AND status = 'PENDING'",
                rusqlite::params![id, status.as_str()],
            )?;

            let outcome = match query_request_by_id(conn, id)? {
                None => AnswerOutcome::NotFound,
                Some(request) if updated > 0 => AnswerOutcome::Answered(request),
                Some(request) => AnswerOutcome::AlreadyAnswered(request),
            };
            Ok(outcome)
        })
    }

    /// Deletes the active request between the pair, if any. Returns the
    /// number of rows removed (0 or 1).
    pub fn delete_active_between(&self, a: AccountId, b: AccountId) -> Result<usize> {
        let (lo, hi) = canonical_pair(a, b);
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM connection_requests
                 WHERE pair_lo = ?1 AND pair_hi = ?2 AND status IN ('PENDING', 'ACCEPTED')",
                [lo, hi],
            )?;
            Ok(removed)
        })
    }

    pub fn list_requests_received(
        &self,
        receiver_id: AccountId,
        status: RequestStatus,
    ) -> Result<Vec<ConnectionRequest>> {
        self.with_conn(|conn| {
            query_requests(
                conn,
                "receiver_id = ?1 AND status = ?2",
                rusqlite::params![receiver_id, status.as_str()],
            )
        })
    }

    pub fn list_requests_sent(
        &self,
        sender_id: AccountId,
        status: RequestStatus,
    ) -> Result<Vec<ConnectionRequest>> {
        self.with_conn(|conn| {
            query_requests(
                conn,
                "sender_id = ?1 AND status = ?2",
                rusqlite::params![sender_id, status.as_str()],
            )
        })
    }

    /// ACCEPTED requests where the user is either side.
    pub fn list_accepted_for(&self, user_id: AccountId) -> Result<Vec<ConnectionRequest>> {
        self.with_conn(|conn| {
            query_requests(
                conn,
                "(sender_id = ?1 OR receiver_id = ?1) AND status = 'ACCEPTED'",
                rusqlite::params![user_id],
            )
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        content: &str,
        event_id: Option<i64>,
        sent_at: DateTime<Utc>,
    ) -> Result<Message> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, content, event_id, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    sender_id,
                    receiver_id,
                    content,
                    event_id,
                    format_timestamp(sent_at)
                ],
            )?;
            Ok(Message {
                id: conn.last_insert_rowid(),
                sender_id,
                receiver_id,
                content: content.to_string(),
                sent_at,
                event_reference: event_id,
            })
        })
    }

    /// Both directions between the pair, oldest first.
    pub fn get_conversation(&self, a: AccountId, b: AccountId) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "(sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)",
                "sent_at ASC, id ASC",
                None,
                rusqlite::params![a, b],
            )
        })
    }

    /// Every message touching the user, newest first.
    pub fn get_messages_for_user(&self, user_id: AccountId) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "sender_id = ?1 OR receiver_id = ?1",
                "sent_at DESC, id DESC",
                None,
                rusqlite::params![user_id],
            )
        })
    }

    pub fn latest_message_between(&self, a: AccountId, b: AccountId) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            let mut rows = query_messages(
                conn,
                "(sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)",
                "sent_at DESC, id DESC",
                Some(1),
                rusqlite::params![a, b],
            )?;
            Ok(rows.pop())
        })
    }

    /// Timestamp of the most recently stored message, if any.
    pub fn latest_sent_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.with_conn(|conn| {
            let raw: Option<String> =
                conn.query_row("SELECT MAX(sent_at) FROM messages", [], |row| row.get(0))?;
            raw.as_deref().map(crate::models::parse_timestamp).transpose()
        })
    }
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        last_active_at: row.get(4)?,
    })
}

fn map_request(row: &Row<'_>) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        event_id: row.get(4)?,
        sent_at: row.get(5)?,
    })
}

fn query_account<P: rusqlite::ToSql>(
    conn: &Connection,
    filter: &str,
    param: P,
) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM users WHERE {}", ACCOUNT_COLUMNS, filter);
    let row = conn.query_row(&sql, [param], map_account).optional()?;
    row.map(AccountRow::into_account).transpose()
}

fn query_request_by_id(conn: &Connection, id: i64) -> Result<Option<ConnectionRequest>> {
    let sql = format!("SELECT {} FROM connection_requests WHERE id = ?1", REQUEST_COLUMNS);
    let row = conn.query_row(&sql, [id], map_request).optional()?;
    row.map(ConnectionRow::into_request).transpose()
}

fn query_request_between(
    conn: &Connection,
    a: AccountId,
    b: AccountId,
) -> Result<Option<ConnectionRequest>> {
    let (lo, hi) = canonical_pair(a, b);
    // Active records win over a stale rejection for the same pair.
    let sql = format!(
        "SELECT {} FROM connection_requests
         WHERE pair_lo = ?1 AND pair_hi = ?2
         ORDER BY CASE status WHEN 'REJECTED' THEN 1 ELSE 0 END, id DESC
         LIMIT 1",
        REQUEST_COLUMNS
    );
    let row = conn.query_row(&sql, [lo, hi], map_request).optional()?;
    row.map(ConnectionRow::into_request).transpose()
}

fn query_requests(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<ConnectionRequest>> {
    let sql = format!(
        "SELECT {} FROM connection_requests WHERE {} ORDER BY created_at ASC, id ASC",
        REQUEST_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, map_request)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(ConnectionRow::into_request).collect()
}

fn query_messages(
    conn: &Connection,
    filter: &str,
    order: &str,
    limit: Option<u32>,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Message>> {
    let mut sql = format!(
        "SELECT {} FROM messages WHERE {} ORDER BY {}",
        MESSAGE_COLUMNS, filter, order
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
