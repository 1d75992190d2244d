use std::sync::Arc;

use huddle_db::{Database, InsertOutcome, timestamp_now};
use huddle_types::models::{ChannelMembership, ChannelSummary};
use tracing::info;
use uuid::Uuid;

use crate::error::{ChatError, ChatResult};

/// The user/channel relation. Every write is a single constrained
/// statement; nothing here caches, so `is_member` always reflects the
/// latest committed join or leave.
#[derive(Clone)]
pub struct MembershipRegistry {
    db: Arc<Database>,
}

impl MembershipRegistry {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn add_member(&self, channel_id: &str, user_id: &str) -> ChatResult<ChannelMembership> {
        info!(user_id, channel_id, "Adding user to channel");

        let membership = ChannelMembership {
            id: Uuid::new_v4().to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            joined_at: timestamp_now(),
        };

        match self.db.insert_member(&membership)? {
            InsertOutcome::Inserted => {
                info!(user_id, channel_id, "User added to channel");
                Ok(membership)
            }
            InsertOutcome::Duplicate => Err(ChatError::conflict(
                "User already a member of this channel",
            )),
            InsertOutcome::MissingParent => Err(ChatError::not_found("Channel", channel_id)),
        }
    }

    pub fn remove_member(&self, channel_id: &str, user_id: &str) -> ChatResult<()> {
        info!(user_id, channel_id, "Removing user from channel");

        if self.db.delete_member(channel_id, user_id)? == 1 {
            info!(user_id, channel_id, "User removed from channel");
            return Ok(());
        }

        // Nothing was deleted: tell a missing channel apart from a non-member.
        if self.db.channel_exists(channel_id)? {
            Err(ChatError::conflict("User is not a member of this channel"))
        } else {
            Err(ChatError::not_found("Channel", channel_id))
        }
    }

    /// Never fails for an unknown channel; it simply has no members.
    pub fn is_member(&self, channel_id: &str, user_id: &str) -> ChatResult<bool> {
        Ok(self.db.is_member(channel_id, user_id)?)
    }

    pub fn list_channels_for_user(&self, user_id: &str) -> ChatResult<Vec<ChannelSummary>> {
        Ok(self.db.channels_for_user(user_id)?)
    }
}
