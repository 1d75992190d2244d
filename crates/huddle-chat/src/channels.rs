use std::sync::Arc;

use huddle_db::{Database, InsertOutcome, timestamp_now};
use huddle_types::models::{Channel, ChannelMembership, ChannelSummary};
use tracing::info;
use uuid::Uuid;

use crate::error::{ChatError, ChatResult};

/// Channel existence and name uniqueness.
#[derive(Clone)]
pub struct ChannelDirectory {
    db: Arc<Database>,
}

impl ChannelDirectory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a channel with `creator` as its first member. The name check
    /// and the insert are one statement; a taken name is a `Conflict`.
    pub fn create(
        &self,
        name: &str,
        description: Option<&str>,
        creator: &str,
    ) -> ChatResult<ChannelSummary> {
        info!(name, creator, "Creating channel");

        let now = timestamp_now();
        let channel = Channel {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_by: creator.to_string(),
            created_at: now,
        };
        let membership = ChannelMembership {
            id: Uuid::new_v4().to_string(),
            channel_id: channel.id.clone(),
            user_id: creator.to_string(),
            joined_at: now,
        };

        match self.db.create_channel(&channel, &membership)? {
            InsertOutcome::Inserted => {
                info!(channel_id = %channel.id, "Channel created");
                Ok(ChannelSummary {
                    channel,
                    member_count: 1,
                })
            }
            InsertOutcome::Duplicate => Err(ChatError::conflict(format!(
                "Channel name already exists: {}",
                name
            ))),
            InsertOutcome::MissingParent => Err(ChatError::Storage(anyhow::anyhow!(
                "channel insert rejected by a foreign key"
            ))),
        }
    }

    pub fn get(&self, channel_id: &str) -> ChatResult<ChannelSummary> {
        self.db
            .get_channel(channel_id)?
            .ok_or_else(|| ChatError::not_found("Channel", channel_id))
    }

    pub fn list_all(&self) -> ChatResult<Vec<ChannelSummary>> {
        Ok(self.db.list_channels()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get() {
        let channels = ChannelDirectory::new(Arc::new(Database::open_in_memory().unwrap()));

        let created = channels.create("random", Some("off-topic"), "u1").unwrap();
        let fetched = channels.get(&created.channel.id).unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.channel.description.as_deref(), Some("off-topic"));
        assert_eq!(channels.list_all().unwrap().len(), 1);
    }

    #[test]
    fn unknown_channel_is_not_found() {
        let channels = ChannelDirectory::new(Arc::new(Database::open_in_memory().unwrap()));
        let err = channels.get("nope").unwrap_err();
        assert!(matches!(err, ChatError::NotFound { resource: "Channel", .. }));
    }
}
