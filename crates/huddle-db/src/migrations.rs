use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id            TEXT PRIMARY KEY,
                email         TEXT NOT NULL UNIQUE,
                display_name  TEXT NOT NULL,
                password      TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );

            CREATE TABLE channels (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL UNIQUE,
                description  TEXT,
                created_by   TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );

            CREATE TABLE channel_members (
                id          TEXT PRIMARY KEY,
                channel_id  TEXT NOT NULL REFERENCES channels(id),
                user_id     TEXT NOT NULL,
                joined_at   TEXT NOT NULL,
                UNIQUE(channel_id, user_id)
            );

            CREATE INDEX idx_channel_members_user
                ON channel_members(user_id);

            -- One row per unordered pair: ids are stored smaller-first.
            CREATE TABLE dm_conversations (
                id          TEXT PRIMARY KEY,
                user1_id    TEXT NOT NULL,
                user2_id    TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                UNIQUE(user1_id, user2_id),
                CHECK(user1_id <= user2_id)
            );

            CREATE INDEX idx_dm_conversations_user2
                ON dm_conversations(user2_id);

            -- Message logs. `seq` breaks ties between equal timestamps.
            CREATE TABLE channel_messages (
                seq           INTEGER PRIMARY KEY AUTOINCREMENT,
                id            TEXT NOT NULL UNIQUE,
                channel_id    TEXT NOT NULL,
                sender_id     TEXT NOT NULL,
                content       TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                edited_at     TEXT,
                message_type  TEXT NOT NULL DEFAULT 'TEXT'
            );

            CREATE INDEX idx_channel_messages_channel
                ON channel_messages(channel_id, created_at, seq);

            CREATE TABLE dm_messages (
                seq              INTEGER PRIMARY KEY AUTOINCREMENT,
                id               TEXT NOT NULL UNIQUE,
                conversation_id  TEXT NOT NULL,
                sender_id        TEXT NOT NULL,
                content          TEXT NOT NULL,
                created_at       TEXT NOT NULL,
                edited_at        TEXT,
                message_type     TEXT NOT NULL DEFAULT 'TEXT'
            );

            CREATE INDEX idx_dm_messages_conversation
                ON dm_messages(conversation_id, created_at, seq);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
