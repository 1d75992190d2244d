use anyhow::Result;
use huddle_types::models::DmConversation;
use rusqlite::{OptionalExtension, Row};

use super::{classify_insert, timestamp_at};
use crate::Database;
use crate::models::{InsertOutcome, format_timestamp};

impl Database {
    /// Insert a conversation whose participant ids are already in canonical
    /// order. An existing row for the pair comes back as `Duplicate`.
    pub fn insert_dm_conversation(&self, conversation: &DmConversation) -> Result<InsertOutcome> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO dm_conversations (id, user1_id, user2_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (
                    &conversation.id,
                    &conversation.user1_id,
                    &conversation.user2_id,
                    format_timestamp(&conversation.created_at),
                ),
            );
            match inserted {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(e) => classify_insert(e),
            }
        })
    }

    /// Look up the conversation between two users, in either stored order.
    ///
    /// Reads from the writer so a lookup that follows a lost insert race
    /// always observes the winning row.
    pub fn find_dm_conversation(&self, user_a: &str, user_b: &str) -> Result<Option<DmConversation>> {
        self.with_conn_mut(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user1_id, user2_id, created_at FROM dm_conversations
                     WHERE (user1_id = ?1 AND user2_id = ?2)
                        OR (user1_id = ?2 AND user2_id = ?1)",
                    [user_a, user_b],
                    conversation_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_dm_conversation(&self, id: &str) -> Result<Option<DmConversation>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user1_id, user2_id, created_at FROM dm_conversations WHERE id = ?1",
                    [id],
                    conversation_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn dm_conversations_for_user(&self, user_id: &str) -> Result<Vec<DmConversation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user1_id, user2_id, created_at FROM dm_conversations
                 WHERE user1_id = ?1 OR user2_id = ?1
                 ORDER BY created_at DESC, id",
            )?;
            let rows = stmt
                .query_map([user_id], conversation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<DmConversation> {
    Ok(DmConversation {
        id: row.get(0)?,
        user1_id: row.get(1)?,
        user2_id: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn conversation(id: &str, a: &str, b: &str) -> DmConversation {
        DmConversation {
            id: id.to_string(),
            user1_id: a.to_string(),
            user2_id: b.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn second_insert_for_pair_is_duplicate() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            db.insert_dm_conversation(&conversation("x", "alice", "bob")).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            db.insert_dm_conversation(&conversation("y", "alice", "bob")).unwrap(),
            InsertOutcome::Duplicate
        );
        assert_eq!(db.dm_conversations_for_user("alice").unwrap().len(), 1);
    }

    #[test]
    fn find_matches_either_order() {
        let db = Database::open_in_memory().unwrap();
        db.insert_dm_conversation(&conversation("x", "alice", "bob")).unwrap();

        assert_eq!(db.find_dm_conversation("alice", "bob").unwrap().unwrap().id, "x");
        assert_eq!(db.find_dm_conversation("bob", "alice").unwrap().unwrap().id, "x");
        assert!(db.find_dm_conversation("alice", "carol").unwrap().is_none());

        assert_eq!(db.dm_conversations_for_user("bob").unwrap().len(), 1);
        assert!(db.dm_conversations_for_user("carol").unwrap().is_empty());
    }
}
