use crate::derived_id::derive_id;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Album {
    pub id: String,
    pub artist_id: String,
    pub name: String,
    pub genre: String,
    pub artist: String,
    pub tracks: String,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl Album {
    /// Build an album under an existing artist. The id is derived from the
    /// album name joined with the artist id, so the same name under two
    /// different artists yields two distinct albums.
    pub fn new(artist_id: &str, name: &str, genre: &str, link_root: &str) -> Album {
        let id = derive_id(name, Some(artist_id));
        Album {
            artist: format!("{}/artists/{}", link_root, artist_id),
            tracks: format!("{}/albums/{}/tracks", link_root, id),
            self_link: format!("{}/albums/{}", link_root, id),
            artist_id: artist_id.to_owned(),
            name: name.to_owned(),
            genre: genre.to_owned(),
            id,
        }
    }

    pub fn from_stored(
        id: String,
        artist_id: String,
        name: String,
        genre: String,
        link_root: &str,
    ) -> Album {
        Album {
            artist: format!("{}/artists/{}", link_root, artist_id),
            tracks: format!("{}/albums/{}/tracks", link_root, id),
            self_link: format!("{}/albums/{}", link_root, id),
            id,
            artist_id,
            name,
            genre,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_binds_name_to_artist() {
        let under_abba = Album::new("QWJiYQ==", "Arrival", "Pop", "?");
        let under_other = Album::new("T3RoZXI=", "Arrival", "Pop", "?");
        assert_ne!(under_abba.id, under_other.id);
        assert_eq!(under_abba.id, derive_id("Arrival", Some("QWJiYQ==")));
    }

    #[test]
    fn links_point_at_artist_and_own_tracks() {
        let album = Album::new("QWJiYQ==", "Arrival", "Pop", "?");
        assert_eq!(album.artist, "?/artists/QWJiYQ==");
        assert_eq!(album.tracks, format!("?/albums/{}/tracks", album.id));
        assert_eq!(album.self_link, format!("?/albums/{}", album.id));
    }
}
