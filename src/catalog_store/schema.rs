//! Versioned SQLite schema for the catalog database.

use anyhow::Result;
use rusqlite::Connection;

/// Database versions start at this offset so a plain sqlite file with
/// user_version 0 is recognizable as never having been initialized by us.
pub const BASE_DB_VERSION: usize = 7200;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub create: fn(&Connection, &VersionedSchema) -> Result<()>,
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

/// V 0
const ARTISTS_TABLE_V_0: Table = Table {
    name: "artists",
    schema: "CREATE TABLE artists (id TEXT NOT NULL UNIQUE, name TEXT NOT NULL UNIQUE, age INTEGER, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id));",
    indices: &["CREATE INDEX artists_name_index ON artists (name);"],
};
const ALBUMS_TABLE_V_0: Table = Table {
    name: "albums",
    schema: "CREATE TABLE albums (id TEXT NOT NULL UNIQUE, artist_id TEXT NOT NULL, name TEXT NOT NULL, genre TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id), CONSTRAINT artist_id FOREIGN KEY (artist_id) REFERENCES artists (id));",
    indices: &["CREATE INDEX albums_artist_id_index ON albums (artist_id);"],
};
const TRACKS_TABLE_V_0: Table = Table {
    name: "tracks",
    schema: "CREATE TABLE tracks (id TEXT NOT NULL UNIQUE, artist_id TEXT NOT NULL, album_id TEXT NOT NULL, name TEXT NOT NULL, duration REAL, times_played INTEGER NOT NULL DEFAULT 0, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id), CONSTRAINT artist_id FOREIGN KEY (artist_id) REFERENCES artists (id), CONSTRAINT album_id FOREIGN KEY (album_id) REFERENCES albums (id));",
    indices: &[
        "CREATE INDEX tracks_artist_id_index ON tracks (artist_id);",
        "CREATE INDEX tracks_album_id_index ON tracks (album_id);",
    ],
};

fn create_v0(conn: &Connection, schema: &VersionedSchema) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON;", [])?;
    for table in schema.tables {
        conn.execute(table.schema, [])?;
        for index in table.indices {
            conn.execute(index, [])?;
        }
    }
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + schema.version),
        [],
    )?;
    Ok(())
}

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ARTISTS_TABLE_V_0, ALBUMS_TABLE_V_0, TRACKS_TABLE_V_0],
    create: create_v0,
    migration: None,
}];
