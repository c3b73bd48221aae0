//! SQLite-backed key-value store over the `kv_entries` table.

use super::{KvResult, KvStore};
use rusqlite::{params, Connection, OptionalExtension};

/// Durable key-value store borrowing a migrated connection.
///
/// Obtain the connection from [`crate::db::open_db`] so the `kv_entries`
/// table is guaranteed to exist.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns all stored keys in ascending order.
    pub fn keys(&self) -> KvResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl KvStore for SqliteKvStore<'_> {
    fn read(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> KvResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteKvStore;
    use crate::db::open_db_in_memory;
    use crate::kv::KvStore;

    #[test]
    fn write_overwrites_existing_value() {
        let conn = open_db_in_memory().unwrap();
        let kv = SqliteKvStore::new(&conn);

        kv.write("todos", "[]").unwrap();
        kv.write("todos", "[1]").unwrap();

        assert_eq!(kv.read("todos").unwrap().as_deref(), Some("[1]"));
        assert_eq!(kv.keys().unwrap(), vec!["todos".to_string()]);
    }

    #[test]
    fn remove_missing_key_is_ok() {
        let conn = open_db_in_memory().unwrap();
        let kv = SqliteKvStore::new(&conn);

        kv.remove("never_written").unwrap();
        assert_eq!(kv.read("never_written").unwrap(), None);
    }
}
