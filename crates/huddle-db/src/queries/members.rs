use anyhow::Result;
use huddle_types::models::ChannelMembership;

use super::classify_insert;
use crate::Database;
use crate::models::{InsertOutcome, format_timestamp};

impl Database {
    /// Single-statement insert. The UNIQUE(channel_id, user_id) constraint
    /// reports an existing membership as `Duplicate`; the foreign key on
    /// channel_id reports an unknown channel as `MissingParent`.
    pub fn insert_member(&self, membership: &ChannelMembership) -> Result<InsertOutcome> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO channel_members (id, channel_id, user_id, joined_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (
                    &membership.id,
                    &membership.channel_id,
                    &membership.user_id,
                    format_timestamp(&membership.joined_at),
                ),
            );
            match inserted {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(e) => classify_insert(e),
            }
        })
    }

    /// Returns the number of rows removed (0 or 1).
    pub fn delete_member(&self, channel_id: &str, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM channel_members WHERE channel_id = ?1 AND user_id = ?2",
                [channel_id, user_id],
            )?;
            Ok(removed)
        })
    }

    pub fn is_member(&self, channel_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM channel_members WHERE channel_id = ?1 AND user_id = ?2)",
                [channel_id, user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use huddle_types::models::Channel;

    fn membership(id: &str, channel_id: &str, user_id: &str) -> ChannelMembership {
        ChannelMembership {
            id: id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            joined_at: Utc::now(),
        }
    }

    fn seed_channel(db: &Database) {
        let channel = Channel {
            id: "c1".into(),
            name: "general".into(),
            description: None,
            created_by: "owner".into(),
            created_at: Utc::now(),
        };
        db.create_channel(&channel, &membership("m0", "c1", "owner")).unwrap();
    }

    #[test]
    fn insert_classifies_constraint_failures() {
        let db = Database::open_in_memory().unwrap();
        seed_channel(&db);

        assert_eq!(db.insert_member(&membership("m1", "c1", "u1")).unwrap(), InsertOutcome::Inserted);
        assert_eq!(db.insert_member(&membership("m2", "c1", "u1")).unwrap(), InsertOutcome::Duplicate);
        assert_eq!(
            db.insert_member(&membership("m3", "missing", "u1")).unwrap(),
            InsertOutcome::MissingParent
        );
        assert_eq!(db.get_channel("c1").unwrap().unwrap().member_count, 2);
    }

    #[test]
    fn delete_reports_rows_removed() {
        let db = Database::open_in_memory().unwrap();
        seed_channel(&db);
        db.insert_member(&membership("m1", "c1", "u1")).unwrap();

        assert_eq!(db.delete_member("c1", "u1").unwrap(), 1);
        assert_eq!(db.delete_member("c1", "u1").unwrap(), 0);
        assert!(!db.is_member("c1", "u1").unwrap());
        assert!(db.is_member("c1", "owner").unwrap());
    }
}
