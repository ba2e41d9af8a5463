use crate::derived_id::derive_id;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Track {
    pub id: String,
    pub artist_id: String,
    pub album_id: String,
    pub name: String,
    pub duration: Option<f64>,
    pub times_played: i64,
    pub artist: String,
    pub album: String,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl Track {
    /// Build a track under an existing album. The artist id is carried
    /// alongside the album id so tracks can be listed and cascaded by
    /// artist without going through the album.
    pub fn new(
        artist_id: &str,
        album_id: &str,
        name: &str,
        duration: Option<f64>,
        link_root: &str,
    ) -> Track {
        let id = derive_id(name, Some(album_id));
        Track {
            artist: format!("{}/artists/{}", link_root, artist_id),
            album: format!("{}/albums/{}", link_root, album_id),
            self_link: format!("{}/tracks/{}", link_root, id),
            artist_id: artist_id.to_owned(),
            album_id: album_id.to_owned(),
            name: name.to_owned(),
            duration,
            times_played: 0,
            id,
        }
    }

    pub fn from_stored(
        id: String,
        artist_id: String,
        album_id: String,
        name: String,
        duration: Option<f64>,
        times_played: i64,
        link_root: &str,
    ) -> Track {
        Track {
            artist: format!("{}/artists/{}", link_root, artist_id),
            album: format!("{}/albums/{}", link_root, album_id),
            self_link: format!("{}/tracks/{}", link_root, id),
            id,
            artist_id,
            album_id,
            name,
            duration,
            times_played,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_track_starts_unplayed() {
        let track = Track::new("artist", "album", "Dancing Queen", Some(231.0), "?");
        assert_eq!(track.times_played, 0);
        assert_eq!(track.id, derive_id("Dancing Queen", Some("album")));
    }

    #[test]
    fn serializes_both_foreign_keys() {
        let track = Track::new("artist", "album", "SOS", None, "?");
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["artist_id"], "artist");
        assert_eq!(json["album_id"], "album");
        assert_eq!(json["duration"], serde_json::Value::Null);
    }
}
