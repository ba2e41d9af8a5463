use crate::derived_id::derive_id;
use serde::{Deserialize, Serialize};

#[derive(Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub age: Option<i64>,
    pub albums: String,
    pub tracks: String,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl Artist {
    /// Build an artist, deriving its id from the name and computing the
    /// hyperlink strings against the given link root.
    pub fn new(name: &str, age: Option<i64>, link_root: &str) -> Artist {
        let id = derive_id(name, None);
        Artist {
            albums: format!("{}/artists/{}/albums", link_root, id),
            tracks: format!("{}/artists/{}/tracks", link_root, id),
            self_link: format!("{}/artists/{}", link_root, id),
            name: name.to_owned(),
            age,
            id,
        }
    }

    /// Rebuild an artist from its persisted fields.
    pub fn from_stored(id: String, name: String, age: Option<i64>, link_root: &str) -> Artist {
        Artist {
            albums: format!("{}/artists/{}/albums", link_root, id),
            tracks: format!("{}/artists/{}/tracks", link_root, id),
            self_link: format!("{}/artists/{}", link_root, id),
            id,
            name,
            age,
        }
    }
}
