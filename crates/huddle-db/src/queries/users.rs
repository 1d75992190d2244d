use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use super::{classify_insert, timestamp_at};
use crate::Database;
use crate::models::{InsertOutcome, UserRow, format_timestamp};

impl Database {
    /// Insert a user. A taken email comes back as `Duplicate`.
    pub fn create_user(&self, user: &UserRow) -> Result<InsertOutcome> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, display_name, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &user.id,
                    &user.email,
                    &user.display_name,
                    &user.password,
                    format_timestamp(&user.created_at),
                ),
            );
            match inserted {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(e) => classify_insert(e),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, display_name, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                display_name: row.get(2)?,
                password: row.get(3)?,
                created_at: timestamp_at(row, 4)?,
            })
        })
        .optional()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, email: &str) -> UserRow {
        UserRow {
            id: id.to_string(),
            email: email.to_string(),
            display_name: "Test User".to_string(),
            password: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_email_is_reported() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.create_user(&user("u1", "a@example.com")).unwrap(), InsertOutcome::Inserted);
        assert_eq!(db.create_user(&user("u2", "a@example.com")).unwrap(), InsertOutcome::Duplicate);

        let found = db.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert!(db.get_user_by_id("u2").unwrap().is_none());
    }
}
