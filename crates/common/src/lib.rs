mod normalize;
mod song;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use normalize::{normalize, song_key, KEY_FIELDS};
pub use song::{LocalTags, RemoteSong, Schema, SongFields};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Mp3,
    Flac,
    Ogg,
    M4a,
}

impl Codec {
    pub fn from_path(path: &Path) -> Option<Codec> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "mp3" => Some(Codec::Mp3),
            "flac" => Some(Codec::Flac),
            "ogg" => Some(Codec::Ogg),
            "m4a" => Some(Codec::M4a),
            _ => None,
        }
    }
}

/// Canonical filter field names and their spelling in each schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    Artist,
    Title,
    Album,
    AlbumArtist,
}

impl FilterField {
    pub fn parse(name: &str) -> Option<FilterField> {
        match name.trim().to_ascii_lowercase().as_str() {
            "artist" => Some(FilterField::Artist),
            "title" => Some(FilterField::Title),
            "album" => Some(FilterField::Album),
            "album_artist" | "albumartist" => Some(FilterField::AlbumArtist),
            _ => None,
        }
    }

    pub fn name_in(self, schema: Schema) -> &'static str {
        match (self, schema) {
            (FilterField::Artist, _) => "artist",
            (FilterField::Title, _) => "title",
            (FilterField::Album, _) => "album",
            (FilterField::AlbumArtist, Schema::Local) => "albumartist",
            (FilterField::AlbumArtist, Schema::Remote) => "album_artist",
        }
    }
}
