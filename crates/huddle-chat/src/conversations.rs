use std::sync::Arc;

use huddle_db::{Database, InsertOutcome, timestamp_now};
use huddle_types::models::DmConversation;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ChatError, ChatResult};

/// Order two user ids so the smaller one comes first. Every conversation
/// row is stored in this order.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// DM conversation identity: exactly one conversation per unordered pair.
#[derive(Clone)]
pub struct ConversationDirectory {
    db: Arc<Database>,
}

impl ConversationDirectory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Return the conversation between the two users, creating it if needed.
    ///
    /// The UNIQUE(user1_id, user2_id) constraint arbitrates concurrent
    /// creators: whoever loses the insert re-reads and returns the winner's
    /// row, so both callers observe the same id.
    pub fn create_or_get(&self, current_user: &str, peer_user: &str) -> ChatResult<DmConversation> {
        info!(current_user, peer_user, "Creating/getting DM conversation");

        let (user1, user2) = canonical_pair(current_user, peer_user);

        if let Some(existing) = self.db.find_dm_conversation(user1, user2)? {
            return Ok(existing);
        }

        self.insert_or_fetch(user1, user2)
    }

    /// Insert the conversation for a canonical pair. If a concurrent
    /// creator already holds the pair, its row is read back and returned.
    fn insert_or_fetch(&self, user1: &str, user2: &str) -> ChatResult<DmConversation> {
        let conversation = DmConversation {
            id: Uuid::new_v4().to_string(),
            user1_id: user1.to_string(),
            user2_id: user2.to_string(),
            created_at: timestamp_now(),
        };

        match self.db.insert_dm_conversation(&conversation)? {
            InsertOutcome::Inserted => {
                info!(conversation_id = %conversation.id, "DM conversation created");
                Ok(conversation)
            }
            InsertOutcome::Duplicate => {
                debug!(user1, user2, "Lost DM creation race, re-reading");
                self.db.find_dm_conversation(user1, user2)?.ok_or_else(|| {
                    ChatError::Storage(anyhow::anyhow!(
                        "conversation for ({}, {}) rejected as duplicate but not found",
                        user1,
                        user2
                    ))
                })
            }
            InsertOutcome::MissingParent => Err(ChatError::Storage(anyhow::anyhow!(
                "conversation insert rejected by a foreign key"
            ))),
        }
    }

    pub fn get_by_id(&self, conversation_id: &str) -> ChatResult<DmConversation> {
        self.db
            .get_dm_conversation(conversation_id)?
            .ok_or_else(|| ChatError::not_found("DM Conversation", conversation_id))
    }

    /// Unlike `MembershipRegistry::is_member`, an unknown conversation is an
    /// error here rather than `false`.
    pub fn is_participant(&self, conversation_id: &str, user_id: &str) -> ChatResult<bool> {
        Ok(self.get_by_id(conversation_id)?.has_participant(user_id))
    }

    pub fn list_for_user(&self, user_id: &str) -> ChatResult<Vec<DmConversation>> {
        Ok(self.db.dm_conversations_for_user(user_id)?)
    }
}
