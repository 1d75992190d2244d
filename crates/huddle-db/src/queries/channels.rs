use anyhow::Result;
use huddle_types::models::{Channel, ChannelMembership, ChannelSummary};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{classify_insert, timestamp_at};
use crate::Database;
use crate::models::{InsertOutcome, format_timestamp};

// member_count is computed in the same statement (no N+1 on listings)
const SUMMARY_COLUMNS: &str = "c.id, c.name, c.description, c.created_by, c.created_at,
     (SELECT COUNT(*) FROM channel_members m WHERE m.channel_id = c.id)";

impl Database {
    /// Insert a channel and its creator's membership in one transaction.
    /// A taken name comes back as `Duplicate` and nothing is written.
    pub fn create_channel(
        &self,
        channel: &Channel,
        creator: &ChannelMembership,
    ) -> Result<InsertOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let inserted = tx.execute(
                "INSERT INTO channels (id, name, description, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &channel.id,
                    &channel.name,
                    &channel.description,
                    &channel.created_by,
                    format_timestamp(&channel.created_at),
                ),
            );
            if let Err(e) = inserted {
                // tx rolls back on drop
                return classify_insert(e);
            }

            tx.execute(
                "INSERT INTO channel_members (id, channel_id, user_id, joined_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (
                    &creator.id,
                    &creator.channel_id,
                    &creator.user_id,
                    format_timestamp(&creator.joined_at),
                ),
            )?;

            tx.commit()?;
            Ok(InsertOutcome::Inserted)
        })
    }

    pub fn get_channel(&self, id: &str) -> Result<Option<ChannelSummary>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM channels c WHERE c.id = ?1", SUMMARY_COLUMNS);
            let row = conn.query_row(&sql, [id], summary_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn channel_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM channels WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn list_channels(&self) -> Result<Vec<ChannelSummary>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM channels c ORDER BY c.created_at, c.name",
                SUMMARY_COLUMNS
            );
            query_summaries(conn, &sql, [])
        })
    }

    /// Channels the user currently belongs to.
    pub fn channels_for_user(&self, user_id: &str) -> Result<Vec<ChannelSummary>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM channels c
                 JOIN channel_members cm ON cm.channel_id = c.id
                 WHERE cm.user_id = ?1
                 ORDER BY c.name",
                SUMMARY_COLUMNS
            );
            query_summaries(conn, &sql, [user_id])
        })
    }
}

fn query_summaries<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<ChannelSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, summary_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<ChannelSummary> {
    let member_count: i64 = row.get(5)?;
    Ok(ChannelSummary {
        channel: Channel {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_by: row.get(3)?,
            created_at: timestamp_at(row, 4)?,
        },
        member_count: member_count as u64,
    })
}
