use once_cell::sync::Lazy;
use regex::Regex;

use crate::song::SongFields;

/// Fields that make up a song key, in order. The track field is schema-specific.
pub const KEY_FIELDS: [&str; 3] = ["artist", "album", "title"];

const KEY_SEP: &str = "|";

static TRACK_TOTAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\s*\d+").unwrap());
static LEADING_ZEROS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0+([0-9]+)").unwrap());
static TRACK_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.+").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ARTICLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^the\s+").unwrap());

fn normalize_once(value: &str) -> String {
    let text = value.to_lowercase();
    let text = TRACK_TOTAL.replace_all(&text, "");
    let text = LEADING_ZEROS.replace(&text, "$1");
    let text = TRACK_DOTS.replace(&text, "");
    let text = NON_WORD.replace_all(&text, "");
    let text = SPACES.replace_all(&text, " ");
    let text = text.trim();
    ARTICLE.replace(text, "").into_owned()
}

/// Canonical comparable form of a tag value.
///
/// The rewrite chain is repeated until it stops changing the value, so the
/// result is always a fixed point: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(value: &str) -> String {
    let mut current = normalize_once(value);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Builds the reconciliation key of a song.
///
/// A missing or empty track number is first set to `"0"` on the song itself.
pub fn song_key<S: SongFields + ?Sized>(song: &mut S) -> String {
    let track_field = song.schema().track_field();
    let track_missing = song
        .field(track_field)
        .map(|value| value.is_empty())
        .unwrap_or(true);
    if track_missing {
        song.set_field(track_field, "0".to_string());
    }

    let mut parts = Vec::with_capacity(KEY_FIELDS.len() + 1);
    for name in KEY_FIELDS.iter().copied().chain(std::iter::once(track_field)) {
        if let Some(value) = song.field(name) {
            if !value.is_empty() {
                parts.push(normalize(&value));
            }
        }
    }
    parts.join(KEY_SEP)
}
