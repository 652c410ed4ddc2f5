use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            email           TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            role            TEXT NOT NULL CHECK (role IN ('STUDENT', 'ALUMNI', 'ADMIN')),
            last_active_at  TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS connection_requests (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id    INTEGER NOT NULL REFERENCES users(id),
            receiver_id  INTEGER NOT NULL REFERENCES users(id),
            pair_lo      INTEGER NOT NULL,
            pair_hi      INTEGER NOT NULL,
            status       TEXT NOT NULL CHECK (status IN ('PENDING', 'ACCEPTED', 'REJECTED')),
            created_at   TEXT NOT NULL,
            CHECK (sender_id <> receiver_id),
            CHECK (pair_lo = min(sender_id, receiver_id) AND pair_hi = max(sender_id, receiver_id))
        );

        -- One active request per unordered pair, whoever sent it
        CREATE UNIQUE INDEX IF NOT EXISTS uq_connection_requests_active_pair
            ON connection_requests(pair_lo, pair_hi)
            WHERE status IN ('PENDING', 'ACCEPTED');

        CREATE INDEX IF NOT EXISTS idx_connection_requests_receiver
            ON connection_requests(receiver_id, status);

        CREATE INDEX IF NOT EXISTS idx_connection_requests_sender
            ON connection_requests(sender_id, status);

        CREATE TABLE IF NOT EXISTS messages (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id    INTEGER NOT NULL REFERENCES users(id),
            receiver_id  INTEGER NOT NULL REFERENCES users(id),
            content      TEXT NOT NULL,
            event_id     INTEGER,
            sent_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, sent_at);

        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id, sent_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
