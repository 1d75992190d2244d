use anyhow::Result;
use huddle_types::models::{Message, MessageType, Page, PageRequest};
use rusqlite::Row;
use rusqlite::types::Type;

use super::{optional_timestamp_at, timestamp_at};
use crate::Database;
use crate::models::{LogKind, format_timestamp, timestamp_now};

impl Database {
    /// Append a message to a log. The creation timestamp is taken while the
    /// writer lock is held, so timestamps never run backwards relative to
    /// `seq` within one process.
    pub fn append_message(
        &self,
        kind: LogKind,
        id: &str,
        parent_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Message> {
        self.with_conn_mut(|conn| {
            let created_at = timestamp_now();
            let message_type = MessageType::default();
            let sql = format!(
                "INSERT INTO {} (id, {}, sender_id, content, created_at, message_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                kind.table(),
                kind.parent_column()
            );
            conn.execute(
                &sql,
                (
                    id,
                    parent_id,
                    sender_id,
                    content,
                    format_timestamp(&created_at),
                    message_type.as_str(),
                ),
            )?;

            Ok(Message {
                id: id.to_string(),
                parent_id: parent_id.to_string(),
                sender_id: sender_id.to_string(),
                content: content.to_string(),
                created_at,
                edited_at: None,
                message_type,
            })
        })
    }

    /// One page of a log, newest first; equal timestamps fall back to
    /// insertion order. The slice and the total are read in one transaction
    /// so they always agree.
    pub fn page_messages(
        &self,
        kind: LogKind,
        parent_id: &str,
        request: PageRequest,
    ) -> Result<Page<Message>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let count_sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?1",
                kind.table(),
                kind.parent_column()
            );
            let total: i64 = tx.query_row(&count_sql, [parent_id], |row| row.get(0))?;

            let sql = format!(
                "SELECT id, {parent}, sender_id, content, created_at, edited_at, message_type
                 FROM {table}
                 WHERE {parent} = ?1
                 ORDER BY created_at DESC, seq DESC
                 LIMIT ?2 OFFSET ?3",
                table = kind.table(),
                parent = kind.parent_column()
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    (parent_id, request.limit() as i64, request.offset() as i64),
                    message_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            drop(stmt);

            tx.commit()?;
            Ok(Page::new(rows, request, total as u64))
        })
    }

    pub fn count_messages(&self, kind: LogKind, parent_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?1",
                kind.table(),
                kind.parent_column()
            );
            let count: i64 = conn.query_row(&sql, [parent_id], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let raw_type: String = row.get(6)?;
    let message_type = raw_type.parse::<MessageType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into())
    })?;

    Ok(Message {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
        edited_at: optional_timestamp_at(row, 5)?,
        message_type,
    })
}
