use rusqlite::Connection;

pub mod tables {
    pub const ENTRIES: &str = "entries";
}

pub mod columns {
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
    pub const UPDATED_AT: &str = "updated_at";
}

/// keys of the stored JSON values
pub mod keys {
    pub const FAVORITES: &str = "favorites";
    pub const QUALITY: &str = "quality";
    pub const QUEUE: &str = "queue";
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
