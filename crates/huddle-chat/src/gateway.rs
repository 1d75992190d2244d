//! Authorization-gated access to the message logs.
//!
//! Channels and DMs follow the same flow: check that the caller may access
//! the parent, then delegate to that parent's log. The flow is written once
//! in [`MessagingGateway`]; each conversation variant only supplies its
//! access predicate and its log.

use std::sync::Arc;

use huddle_db::Database;
use huddle_types::models::{Message, Page, PageRequest};
use tracing::{info, warn};

use crate::conversations::ConversationDirectory;
use crate::error::{ChatError, ChatResult};
use crate::log::{MessageLog, SqliteMessageLog};
use crate::membership::MembershipRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    Channel,
    DirectMessage,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::DirectMessage => "dm",
        }
    }

    fn denial(&self) -> &'static str {
        match self {
            Self::Channel => "User is not a member of this channel",
            Self::DirectMessage => "User is not a participant in this conversation",
        }
    }
}

/// A kind of conversation the gateway can serve.
pub trait Conversation: Send + Sync {
    fn kind(&self) -> ConversationKind;

    /// Whether `user_id` may read and write `parent_id`'s log. An `Err`
    /// aborts the request as-is.
    fn may_access(&self, parent_id: &str, user_id: &str) -> ChatResult<bool>;

    fn log(&self) -> &dyn MessageLog;
}

/// Channels: access requires a current membership. Unknown channels have no
/// members, so they are denied rather than reported missing.
pub struct ChannelConversations {
    members: MembershipRegistry,
    log: Arc<dyn MessageLog>,
}

impl ChannelConversations {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            members: MembershipRegistry::new(db.clone()),
            log: Arc::new(SqliteMessageLog::channel(db)),
        }
    }

    pub fn with_log(members: MembershipRegistry, log: Arc<dyn MessageLog>) -> Self {
        Self { members, log }
    }
}

impl Conversation for ChannelConversations {
    fn kind(&self) -> ConversationKind {
        ConversationKind::Channel
    }

    fn may_access(&self, parent_id: &str, user_id: &str) -> ChatResult<bool> {
        self.members.is_member(parent_id, user_id)
    }

    fn log(&self) -> &dyn MessageLog {
        self.log.as_ref()
    }
}

/// DMs: access requires being one of the two participants. Unknown
/// conversations fail with `NotFound`.
pub struct DirectConversations {
    directory: ConversationDirectory,
    log: Arc<dyn MessageLog>,
}

impl DirectConversations {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            directory: ConversationDirectory::new(db.clone()),
            log: Arc::new(SqliteMessageLog::direct(db)),
        }
    }

    pub fn with_log(directory: ConversationDirectory, log: Arc<dyn MessageLog>) -> Self {
        Self { directory, log }
    }
}

impl Conversation for DirectConversations {
    fn kind(&self) -> ConversationKind {
        ConversationKind::DirectMessage
    }

    fn may_access(&self, parent_id: &str, user_id: &str) -> ChatResult<bool> {
        self.directory.is_participant(parent_id, user_id)
    }

    fn log(&self) -> &dyn MessageLog {
        self.log.as_ref()
    }
}

pub struct MessagingGateway<C> {
    conversation: C,
}

pub type ChannelMessaging = MessagingGateway<ChannelConversations>;
pub type DirectMessaging = MessagingGateway<DirectConversations>;

impl<C: Conversation> MessagingGateway<C> {
    pub fn new(conversation: C) -> Self {
        Self { conversation }
    }

    pub fn send(&self, parent_id: &str, sender_id: &str, content: &str) -> ChatResult<Message> {
        let kind = self.conversation.kind().as_str();
        info!(kind, parent_id, sender_id, "Sending message");

        self.authorize(parent_id, sender_id)?;
        let message = self.conversation.log().append(parent_id, sender_id, content)?;

        info!(kind, message_id = %message.id, "Message sent");
        Ok(message)
    }

    pub fn history(
        &self,
        parent_id: &str,
        user_id: &str,
        request: PageRequest,
    ) -> ChatResult<Page<Message>> {
        self.authorize(parent_id, user_id)?;
        self.conversation.log().page(parent_id, request)
    }

    fn authorize(&self, parent_id: &str, user_id: &str) -> ChatResult<()> {
        let kind = self.conversation.kind();
        if self.conversation.may_access(parent_id, user_id)? {
            return Ok(());
        }

        warn!(kind = kind.as_str(), parent_id, user_id, "Access denied");
        Err(ChatError::unauthorized(kind.denial()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::channels::ChannelDirectory;

    /// Counts every call that reaches the log.
    struct SpyLog {
        inner: SqliteMessageLog,
        calls: AtomicUsize,
    }

    impl MessageLog for SpyLog {
        fn append(&self, parent_id: &str, sender_id: &str, content: &str) -> ChatResult<Message> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.append(parent_id, sender_id, content)
        }

        fn page(&self, parent_id: &str, request: PageRequest) -> ChatResult<Page<Message>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.page(parent_id, request)
        }

        fn count(&self, parent_id: &str) -> ChatResult<u64> {
            self.inner.count(parent_id)
        }
    }

    fn spied_channels(db: Arc<Database>) -> (ChannelMessaging, Arc<SpyLog>) {
        let spy = Arc::new(SpyLog {
            inner: SqliteMessageLog::channel(db.clone()),
            calls: AtomicUsize::new(0),
        });
        let conversation = ChannelConversations::with_log(MembershipRegistry::new(db), spy.clone());
        (MessagingGateway::new(conversation), spy)
    }

    fn spied_dms(db: Arc<Database>) -> (DirectMessaging, Arc<SpyLog>) {
        let spy = Arc::new(SpyLog {
            inner: SqliteMessageLog::direct(db.clone()),
            calls: AtomicUsize::new(0),
        });
        let conversation = DirectConversations::with_log(ConversationDirectory::new(db), spy.clone());
        (MessagingGateway::new(conversation), spy)
    }

    #[test]
    fn non_member_never_reaches_the_log() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let general = ChannelDirectory::new(db.clone()).create("general", None, "u1").unwrap();
        let (gateway, spy) = spied_channels(db);

        let send = gateway.send(&general.channel.id, "intruder", "hi").unwrap_err();
        let read = gateway
            .history(&general.channel.id, "intruder", PageRequest::default())
            .unwrap_err();

        assert_eq!(send.to_string(), "User is not a member of this channel");
        assert!(matches!(read, ChatError::Unauthorized(_)));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
        assert_eq!(spy.count(&general.channel.id).unwrap(), 0);
    }

    #[test]
    fn unknown_channel_is_denied_not_missing() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (gateway, spy) = spied_channels(db);

        let err = gateway.send("no-such-channel", "u1", "hi").unwrap_err();
        assert!(matches!(err, ChatError::Unauthorized(_)));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_conversation_is_missing_not_denied() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (gateway, spy) = spied_dms(db);

        let err = gateway.send("no-such-dm", "u1", "hi").unwrap_err();
        assert!(matches!(err, ChatError::NotFound { .. }));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn outsider_cannot_read_a_dm() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let conv = ConversationDirectory::new(db.clone()).create_or_get("alice", "bob").unwrap();
        let (gateway, spy) = spied_dms(db);

        gateway.send(&conv.id, "alice", "hello").unwrap();
        let err = gateway.history(&conv.id, "mallory", PageRequest::default()).unwrap_err();

        assert_eq!(err.to_string(), "User is not a participant in this conversation");
        assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn member_round_trip() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let general = ChannelDirectory::new(db.clone()).create("general", None, "u1").unwrap();
        let gateway = ChannelMessaging::new(ChannelConversations::new(db));

        let sent = gateway.send(&general.channel.id, "u1", "hello").unwrap();
        let page = gateway
            .history(&general.channel.id, "u1", PageRequest::default())
            .unwrap();

        assert_eq!(page.content, vec![sent]);
    }
}
