pub mod channels;
pub mod conversations;
pub mod error;
pub mod gateway;
pub mod log;
pub mod membership;

use std::sync::Arc;

use huddle_db::Database;

pub use channels::ChannelDirectory;
pub use conversations::{ConversationDirectory, canonical_pair};
pub use error::{ChatError, ChatResult};
pub use gateway::{
    ChannelConversations, ChannelMessaging, Conversation, ConversationKind, DirectConversations,
    DirectMessaging, MessagingGateway,
};
pub use log::{MessageLog, SqliteMessageLog};
pub use membership::MembershipRegistry;

/// Every chat component wired to one database.
pub struct Chat {
    pub channels: ChannelDirectory,
    pub members: MembershipRegistry,
    pub conversations: ConversationDirectory,
    pub channel_messages: ChannelMessaging,
    pub direct_messages: DirectMessaging,
}

impl Chat {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            channels: ChannelDirectory::new(db.clone()),
            members: MembershipRegistry::new(db.clone()),
            conversations: ConversationDirectory::new(db.clone()),
            channel_messages: MessagingGateway::new(ChannelConversations::new(db.clone())),
            direct_messages: MessagingGateway::new(DirectConversations::new(db)),
        }
    }
}
