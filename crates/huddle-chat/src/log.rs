use std::sync::Arc;

use huddle_db::{Database, LogKind};
use huddle_types::models::{Message, Page, PageRequest};
use uuid::Uuid;

use crate::error::ChatResult;

/// Append-only, time-ordered message store scoped by parent id.
///
/// Implementations do no authorization; callers go through
/// [`MessagingGateway`](crate::gateway::MessagingGateway).
pub trait MessageLog: Send + Sync {
    /// Persist a new message with a fresh id and server-side timestamp.
    fn append(&self, parent_id: &str, sender_id: &str, content: &str) -> ChatResult<Message>;

    /// Newest first, zero-based. Ties on `created_at` resolve by insertion
    /// order.
    fn page(&self, parent_id: &str, request: PageRequest) -> ChatResult<Page<Message>>;

    fn count(&self, parent_id: &str) -> ChatResult<u64>;
}

/// A message log backed by one of the SQLite message tables.
pub struct SqliteMessageLog {
    db: Arc<Database>,
    kind: LogKind,
}

impl SqliteMessageLog {
    pub fn channel(db: Arc<Database>) -> Self {
        Self {
            db,
            kind: LogKind::Channel,
        }
    }

    pub fn direct(db: Arc<Database>) -> Self {
        Self {
            db,
            kind: LogKind::Direct,
        }
    }
}

impl MessageLog for SqliteMessageLog {
    fn append(&self, parent_id: &str, sender_id: &str, content: &str) -> ChatResult<Message> {
        let id = Uuid::new_v4().to_string();
        Ok(self
            .db
            .append_message(self.kind, &id, parent_id, sender_id, content)?)
    }

    fn page(&self, parent_id: &str, request: PageRequest) -> ChatResult<Page<Message>> {
        Ok(self.db.page_messages(self.kind, parent_id, request)?)
    }

    fn count(&self, parent_id: &str) -> ChatResult<u64> {
        Ok(self.db.count_messages(self.kind, parent_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn pages_walk_newest_to_oldest() {
        let log = SqliteMessageLog::channel(Arc::new(Database::open_in_memory().unwrap()));
        for i in 0..5 {
            log.append("c1", "u1", &format!("msg {}", i)).unwrap();
        }

        let first = log.page("c1", PageRequest::new(0, 2)).unwrap();
        let second = log.page("c1", PageRequest::new(1, 2)).unwrap();
        let third = log.page("c1", PageRequest::new(2, 2)).unwrap();
        let beyond = log.page("c1", PageRequest::new(3, 2)).unwrap();

        let bodies: Vec<_> = [&first, &second, &third]
            .iter()
            .flat_map(|p| p.content.iter().map(|m| m.content.clone()))
            .collect();
        assert_eq!(bodies, ["msg 4", "msg 3", "msg 2", "msg 1", "msg 0"]);

        assert_eq!(first.total_elements, 5);
        assert_eq!(first.total_pages, 3);
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_elements, 5);
    }

    #[test]
    fn appended_ids_are_unique() {
        let log = SqliteMessageLog::direct(Arc::new(Database::open_in_memory().unwrap()));
        let ids: HashSet<_> = (0..50)
            .map(|_| log.append("d1", "u1", "same text").unwrap().id)
            .collect();
        assert_eq!(ids.len(), 50);
        assert_eq!(log.count("d1").unwrap(), 50);
    }
}
