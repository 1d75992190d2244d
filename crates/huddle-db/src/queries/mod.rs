mod channels;
mod conversations;
mod members;
mod messages;
mod users;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Row, ffi};

use crate::models::{InsertOutcome, parse_timestamp};

/// Map a failed INSERT onto an outcome when a constraint rejected it.
/// Anything else is a real storage failure.
fn classify_insert(err: rusqlite::Error) -> Result<InsertOutcome> {
    if let rusqlite::Error::SqliteFailure(ref e, _) = err {
        match e.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE => return Ok(InsertOutcome::Duplicate),
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Ok(InsertOutcome::MissingParent),
            _ => {}
        }
    }
    Err(err.into())
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        parse_timestamp(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}
