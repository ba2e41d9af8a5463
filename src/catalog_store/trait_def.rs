//! CatalogStore trait definition.
//!
//! Abstracts catalog storage so the server can be wired against the
//! SQLite-backed store in production and an in-memory database in tests.

use super::StoreResult;
use crate::catalog::{Album, Artist, Track};

/// Storage backend for artists, albums and tracks.
///
/// Creation fails with `Duplicate` when the entity's derived id is already
/// taken, and with `MissingParent` when a referenced artist/album is absent.
/// Deletions cascade: an artist takes its albums and tracks with it, an
/// album takes its tracks.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    fn get_artist(&self, id: &str) -> StoreResult<Option<Artist>>;

    fn get_all_artists(&self) -> StoreResult<Vec<Artist>>;

    fn create_artist(&self, artist: &Artist) -> StoreResult<()>;

    /// Delete an artist and cascade to its albums and tracks. Tracks go
    /// first because they reference the artist directly, not only through
    /// their album.
    fn delete_artist(&self, id: &str) -> StoreResult<()>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn get_album(&self, id: &str) -> StoreResult<Option<Album>>;

    fn get_all_albums(&self) -> StoreResult<Vec<Album>>;

    /// List an artist's albums. `NotFound` if the artist does not exist.
    fn get_artist_albums(&self, artist_id: &str) -> StoreResult<Vec<Album>>;

    fn create_album(&self, album: &Album) -> StoreResult<()>;

    /// Delete an album and cascade to its tracks.
    fn delete_album(&self, id: &str) -> StoreResult<()>;

    // =========================================================================
    // Tracks
    // =========================================================================

    fn get_track(&self, id: &str) -> StoreResult<Option<Track>>;

    fn get_all_tracks(&self) -> StoreResult<Vec<Track>>;

    /// List an artist's tracks. `NotFound` if the artist does not exist.
    fn get_artist_tracks(&self, artist_id: &str) -> StoreResult<Vec<Track>>;

    /// List an album's tracks. `NotFound` if the album does not exist.
    fn get_album_tracks(&self, album_id: &str) -> StoreResult<Vec<Track>>;

    fn create_track(&self, track: &Track) -> StoreResult<()>;

    fn delete_track(&self, id: &str) -> StoreResult<()>;

    // =========================================================================
    // Play Counters
    // =========================================================================

    /// Increment a track's play counter by 1 and return the updated track.
    fn play_track(&self, id: &str) -> StoreResult<Track>;

    /// Increment the play counter of every track on an album by 1.
    /// Returns the number of tracks touched.
    fn play_album_tracks(&self, album_id: &str) -> StoreResult<usize>;

    /// Increment the play counter of every track by an artist by 1.
    /// Returns the number of tracks touched.
    fn play_artist_tracks(&self, artist_id: &str) -> StoreResult<usize>;

    // =========================================================================
    // Counts (for startup logging and the stats endpoint)
    // =========================================================================

    fn get_artists_count(&self) -> usize;

    fn get_albums_count(&self) -> usize;

    fn get_tracks_count(&self) -> usize;
}
