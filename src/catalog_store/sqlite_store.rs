//! SQLite-backed catalog store implementation.

use super::schema::{BASE_DB_VERSION, VERSIONED_SCHEMAS};
use super::{CatalogStore, StoreError, StoreResult};
use crate::catalog::{Album, Artist, Track};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Catalog store backed by a single SQLite database file.
///
/// Every mutating operation is committed before the call returns; cascade
/// deletions run inside one transaction so a failure mid-cascade leaves no
/// orphaned children behind.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
    link_root: String,
}

impl SqliteCatalogStore {
    pub fn new<T: AsRef<Path>>(db_path: T, link_root: &str) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            Self::create_schema(&conn)?;
            conn
        };

        let version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, usize>(0))
            .context("Failed to read database version")?;
        if version < BASE_DB_VERSION {
            bail!("Database was not initialized by this server (user_version {})", version);
        }
        let version = version - BASE_DB_VERSION;
        if version >= VERSIONED_SCHEMAS.len() {
            bail!("Database version {} is too new", version);
        }
        Self::migrate_if_needed(&conn, version)?;

        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
            link_root: link_root.to_owned(),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory(link_root: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_schema(&conn)?;
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
            link_root: link_root.to_owned(),
        })
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        let latest_version = VERSIONED_SCHEMAS.last().unwrap();
        let create_fn = latest_version.create;
        create_fn(conn, latest_version)
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;

        Ok(())
    }

    fn row_exists(conn: &Connection, table: &str, id: &str) -> StoreResult<bool> {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", table),
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn count(&self, table: &str) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get::<usize, i64>(0)
        })
        .unwrap_or(0) as usize
    }

    fn parse_artist_row(&self, row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist::from_stored(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            &self.link_root,
        ))
    }

    fn parse_album_row(&self, row: &rusqlite::Row) -> rusqlite::Result<Album> {
        Ok(Album::from_stored(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            &self.link_root,
        ))
    }

    fn parse_track_row(&self, row: &rusqlite::Row) -> rusqlite::Result<Track> {
        Ok(Track::from_stored(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            &self.link_root,
        ))
    }
}

const SELECT_ARTIST: &str = "SELECT id, name, age FROM artists";
const SELECT_ALBUM: &str = "SELECT id, artist_id, name, genre FROM albums";
const SELECT_TRACK: &str =
    "SELECT id, artist_id, album_id, name, duration, times_played FROM tracks";

impl CatalogStore for SqliteCatalogStore {
    fn get_artist(&self, id: &str) -> StoreResult<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_ARTIST))?;
        match stmt.query_row(params![id], |row| self.parse_artist_row(row)) {
            Ok(artist) => Ok(Some(artist)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn get_all_artists(&self) -> StoreResult<Vec<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(SELECT_ARTIST)?;
        let artists = stmt
            .query_map([], |row| self.parse_artist_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn create_artist(&self, artist: &Artist) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        if Self::row_exists(&conn, "artists", &artist.id)? {
            return Err(StoreError::duplicate("artist", &artist.id));
        }
        conn.execute(
            "INSERT INTO artists (id, name, age) VALUES (?1, ?2, ?3)",
            params![artist.id, artist.name, artist.age],
        )?;
        Ok(())
    }

    fn delete_artist(&self, id: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "artists", id)? {
            return Err(StoreError::not_found("artist", id));
        }
        // Tracks reference the artist directly, so they go before albums.
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tracks WHERE artist_id = ?1", params![id])?;
        tx.execute("DELETE FROM albums WHERE artist_id = ?1", params![id])?;
        tx.execute("DELETE FROM artists WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    fn get_album(&self, id: &str) -> StoreResult<Option<Album>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_ALBUM))?;
        match stmt.query_row(params![id], |row| self.parse_album_row(row)) {
            Ok(album) => Ok(Some(album)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn get_all_albums(&self) -> StoreResult<Vec<Album>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(SELECT_ALBUM)?;
        let albums = stmt
            .query_map([], |row| self.parse_album_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn get_artist_albums(&self, artist_id: &str) -> StoreResult<Vec<Album>> {
        let conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "artists", artist_id)? {
            return Err(StoreError::not_found("artist", artist_id));
        }
        let mut stmt = conn.prepare(&format!("{} WHERE artist_id = ?1", SELECT_ALBUM))?;
        let albums = stmt
            .query_map(params![artist_id], |row| self.parse_album_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn create_album(&self, album: &Album) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "artists", &album.artist_id)? {
            return Err(StoreError::missing_parent("artist", &album.artist_id));
        }
        if Self::row_exists(&conn, "albums", &album.id)? {
            return Err(StoreError::duplicate("album", &album.id));
        }
        conn.execute(
            "INSERT INTO albums (id, artist_id, name, genre) VALUES (?1, ?2, ?3, ?4)",
            params![album.id, album.artist_id, album.name, album.genre],
        )?;
        Ok(())
    }

    fn delete_album(&self, id: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "albums", id)? {
            return Err(StoreError::not_found("album", id));
        }
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tracks WHERE album_id = ?1", params![id])?;
        tx.execute("DELETE FROM albums WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    fn get_track(&self, id: &str) -> StoreResult<Option<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_TRACK))?;
        match stmt.query_row(params![id], |row| self.parse_track_row(row)) {
            Ok(track) => Ok(Some(track)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn get_all_tracks(&self) -> StoreResult<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(SELECT_TRACK)?;
        let tracks = stmt
            .query_map([], |row| self.parse_track_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn get_artist_tracks(&self, artist_id: &str) -> StoreResult<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "artists", artist_id)? {
            return Err(StoreError::not_found("artist", artist_id));
        }
        let mut stmt = conn.prepare(&format!("{} WHERE artist_id = ?1", SELECT_TRACK))?;
        let tracks = stmt
            .query_map(params![artist_id], |row| self.parse_track_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn get_album_tracks(&self, album_id: &str) -> StoreResult<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "albums", album_id)? {
            return Err(StoreError::not_found("album", album_id));
        }
        let mut stmt = conn.prepare(&format!("{} WHERE album_id = ?1", SELECT_TRACK))?;
        let tracks = stmt
            .query_map(params![album_id], |row| self.parse_track_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn create_track(&self, track: &Track) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "albums", &track.album_id)? {
            return Err(StoreError::missing_parent("album", &track.album_id));
        }
        if Self::row_exists(&conn, "tracks", &track.id)? {
            return Err(StoreError::duplicate("track", &track.id));
        }
        conn.execute(
            "INSERT INTO tracks (id, artist_id, album_id, name, duration, times_played) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                track.id,
                track.artist_id,
                track.album_id,
                track.name,
                track.duration,
                track.times_played
            ],
        )?;
        Ok(())
    }

    fn delete_track(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM tracks WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::not_found("track", id));
        }
        Ok(())
    }

    fn play_track(&self, id: &str) -> StoreResult<Track> {
        {
            let conn = self.conn.lock().unwrap();
            let updated = conn.execute(
                "UPDATE tracks SET times_played = times_played + 1 WHERE id = ?1",
                params![id],
            )?;
            if updated == 0 {
                return Err(StoreError::not_found("track", id));
            }
        }
        self.get_track(id)?
            .ok_or_else(|| StoreError::not_found("track", id))
    }

    fn play_album_tracks(&self, album_id: &str) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "albums", album_id)? {
            return Err(StoreError::not_found("album", album_id));
        }
        let updated = conn.execute(
            "UPDATE tracks SET times_played = times_played + 1 WHERE album_id = ?1",
            params![album_id],
        )?;
        Ok(updated)
    }

    fn play_artist_tracks(&self, artist_id: &str) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        if !Self::row_exists(&conn, "artists", artist_id)? {
            return Err(StoreError::not_found("artist", artist_id));
        }
        let updated = conn.execute(
            "UPDATE tracks SET times_played = times_played + 1 WHERE artist_id = ?1",
            params![artist_id],
        )?;
        Ok(updated)
    }

    fn get_artists_count(&self) -> usize {
        self.count("artists")
    }

    fn get_albums_count(&self) -> usize {
        self.count("albums")
    }

    fn get_tracks_count(&self) -> usize {
        self.count("tracks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> SqliteCatalogStore {
        SqliteCatalogStore::open_in_memory("?").unwrap()
    }

    fn seed_abba(store: &SqliteCatalogStore) -> (Artist, Album, Track, Track) {
        let artist = Artist::new("Abba", Some(50), "?");
        store.create_artist(&artist).unwrap();
        let album = Album::new(&artist.id, "Arrival", "Pop", "?");
        store.create_album(&album).unwrap();
        let track1 = Track::new(&artist.id, &album.id, "Dancing Queen", Some(231.0), "?");
        store.create_track(&track1).unwrap();
        let track2 = Track::new(&artist.id, &album.id, "Money Money Money", None, "?");
        store.create_track(&track2).unwrap();
        (artist, album, track1, track2)
    }

    #[test]
    fn creates_and_reads_back_artist() {
        let store = create_test_store();
        let artist = Artist::new("Abba", Some(50), "?");
        store.create_artist(&artist).unwrap();

        let read_back = store.get_artist(&artist.id).unwrap().unwrap();
        assert_eq!(read_back, artist);
        assert_eq!(store.get_artists_count(), 1);
    }

    #[test]
    fn duplicate_artist_is_rejected() {
        let store = create_test_store();
        let artist = Artist::new("Abba", Some(50), "?");
        store.create_artist(&artist).unwrap();

        let again = Artist::new("Abba", Some(51), "?");
        match store.create_artist(&again) {
            Err(StoreError::Duplicate { entity, .. }) => assert_eq!(entity, "artist"),
            other => panic!("expected Duplicate, got {:?}", other),
        }
        assert_eq!(store.get_artists_count(), 1);
    }

    #[test]
    fn album_requires_existing_artist() {
        let store = create_test_store();
        let album = Album::new("bm9ib2R5", "Arrival", "Pop", "?");
        match store.create_album(&album) {
            Err(StoreError::MissingParent { entity, .. }) => assert_eq!(entity, "artist"),
            other => panic!("expected MissingParent, got {:?}", other),
        }
    }

    #[test]
    fn track_requires_existing_album() {
        let store = create_test_store();
        let track = Track::new("someone", "bm90aGVyZQ==", "Lonely", None, "?");
        match store.create_track(&track) {
            Err(StoreError::MissingParent { entity, .. }) => assert_eq!(entity, "album"),
            other => panic!("expected MissingParent, got {:?}", other),
        }
    }

    #[test]
    fn lists_by_parent() {
        let store = create_test_store();
        let (artist, album, track1, track2) = seed_abba(&store);

        let albums = store.get_artist_albums(&artist.id).unwrap();
        assert_eq!(albums, vec![album.clone()]);

        let artist_tracks = store.get_artist_tracks(&artist.id).unwrap();
        assert_eq!(artist_tracks.len(), 2);

        let album_tracks = store.get_album_tracks(&album.id).unwrap();
        assert_eq!(album_tracks, vec![track1, track2]);
    }

    #[test]
    fn listing_by_missing_parent_is_not_found() {
        let store = create_test_store();
        assert!(matches!(
            store.get_artist_albums("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.get_album_tracks("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn deleting_artist_cascades_to_albums_and_tracks() {
        let store = create_test_store();
        let (artist, album, track1, _) = seed_abba(&store);

        store.delete_artist(&artist.id).unwrap();

        assert!(store.get_artist(&artist.id).unwrap().is_none());
        assert!(store.get_album(&album.id).unwrap().is_none());
        assert!(store.get_track(&track1.id).unwrap().is_none());
        assert_eq!(store.get_albums_count(), 0);
        assert_eq!(store.get_tracks_count(), 0);
    }

    #[test]
    fn deleting_album_cascades_to_tracks_only() {
        let store = create_test_store();
        let (artist, album, _, _) = seed_abba(&store);

        store.delete_album(&album.id).unwrap();

        assert!(store.get_artist(&artist.id).unwrap().is_some());
        assert_eq!(store.get_tracks_count(), 0);
    }

    #[test]
    fn deleting_missing_entities_is_not_found() {
        let store = create_test_store();
        assert!(matches!(
            store.delete_artist("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_album("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_track("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn play_track_increments_counter() {
        let store = create_test_store();
        let (_, _, track1, track2) = seed_abba(&store);

        let played = store.play_track(&track1.id).unwrap();
        assert_eq!(played.times_played, 1);
        let played = store.play_track(&track1.id).unwrap();
        assert_eq!(played.times_played, 2);

        // the other track is untouched
        assert_eq!(store.get_track(&track2.id).unwrap().unwrap().times_played, 0);
    }

    #[test]
    fn play_album_touches_every_album_track_once() {
        let store = create_test_store();
        let (artist, album, track1, track2) = seed_abba(&store);

        let other_album = Album::new(&artist.id, "Waterloo", "Pop", "?");
        store.create_album(&other_album).unwrap();
        let other_track = Track::new(&artist.id, &other_album.id, "Waterloo", None, "?");
        store.create_track(&other_track).unwrap();

        let played = store.play_album_tracks(&album.id).unwrap();
        assert_eq!(played, 2);
        assert_eq!(store.get_track(&track1.id).unwrap().unwrap().times_played, 1);
        assert_eq!(store.get_track(&track2.id).unwrap().unwrap().times_played, 1);
        assert_eq!(
            store.get_track(&other_track.id).unwrap().unwrap().times_played,
            0
        );
    }

    #[test]
    fn play_artist_touches_tracks_across_albums() {
        let store = create_test_store();
        let (artist, _, track1, _) = seed_abba(&store);

        let other_album = Album::new(&artist.id, "Waterloo", "Pop", "?");
        store.create_album(&other_album).unwrap();
        let other_track = Track::new(&artist.id, &other_album.id, "Waterloo", None, "?");
        store.create_track(&other_track).unwrap();

        let played = store.play_artist_tracks(&artist.id).unwrap();
        assert_eq!(played, 3);
        assert_eq!(store.get_track(&track1.id).unwrap().unwrap().times_played, 1);
        assert_eq!(
            store.get_track(&other_track.id).unwrap().unwrap().times_played,
            1
        );
    }

    #[test]
    fn playing_missing_targets_is_not_found() {
        let store = create_test_store();
        assert!(matches!(
            store.play_track("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.play_album_tracks("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.play_artist_tracks("bm9ib2R5"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn reopens_existing_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        let artist = Artist::new("Abba", Some(50), "?");
        {
            let store = SqliteCatalogStore::new(&db_path, "?").unwrap();
            store.create_artist(&artist).unwrap();
        }

        let reopened = SqliteCatalogStore::new(&db_path, "?").unwrap();
        assert_eq!(reopened.get_artist(&artist.id).unwrap(), Some(artist));
    }
}
