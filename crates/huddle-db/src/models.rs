//! Database row types and helpers. Domain types from huddle-types are used
//! directly where a row maps one-to-one; `UserRow` carries the password hash,
//! which never leaves the API layer.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use huddle_types::models::User;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            created_at: self.created_at,
        }
    }
}

/// Result of an insert guarded by a storage constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A UNIQUE constraint rejected the row.
    Duplicate,
    /// A FOREIGN KEY constraint rejected the row.
    MissingParent,
}

/// Which message log a query targets. Both logs share a shape and differ
/// only in table and parent column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Channel,
    Direct,
}

impl LogKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Channel => "channel_messages",
            Self::Direct => "dm_messages",
        }
    }

    pub fn parent_column(&self) -> &'static str {
        match self {
            Self::Channel => "channel_id",
            Self::Direct => "conversation_id",
        }
    }
}

/// Current time at the precision the database stores, so a record returned
/// from a write compares equal to the same record read back.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so that text ordering in SQLite matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
