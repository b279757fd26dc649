use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use common::{Schema, SongFields};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const SUGGESTED: &str = "%suggested%";
const EXTENSION: &str = ".mp3";
const EMPTY_NAME: &str = "untitled";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([a-z0-9]+)%").unwrap());

/// Characters that are unsafe in file names and what replaces them.
const REPLACEMENTS: [(char, &str); 9] = [
    ('\\', "-"),
    ('/', ","),
    (':', "-"),
    ('*', "x"),
    ('<', "["),
    ('>', "]"),
    ('|', "!"),
    ('?', ""),
    ('"', "''"),
];

pub fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => out.push_str(to),
            None => out.push(ch),
        }
    }
    out
}

/// An output path template such as `%artist%/%album%/%track2% - %title%`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    prefix: PathBuf,
    segments: Vec<String>,
}

impl Template {
    pub fn parse(template: &str) -> Self {
        let mut prefix = PathBuf::new();
        let mut segments = Vec::new();
        for component in Path::new(template).components() {
            match component {
                Component::Prefix(_) | Component::RootDir => prefix.push(component.as_os_str()),
                Component::CurDir => {}
                Component::ParentDir => segments.push("..".to_string()),
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            }
        }
        Self { prefix, segments }
    }

    /// Whether rendering pads the track number, which is also written back
    /// into the downloaded file.
    pub fn uses_padded_track(&self) -> bool {
        self.segments.iter().any(|segment| segment.contains("%track2%"))
    }

    pub fn render<S: SongFields + ?Sized>(&self, song: &S, suggested: Option<&str>) -> PathBuf {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let has_suggested = segment.contains(SUGGESTED);
            let mut text = segment.clone();
            if has_suggested {
                if let Some(name) = suggested {
                    text = text.replace(SUGGESTED, &suggested_stem(name));
                }
            }
            let text = sanitize_segment(&fill_placeholders(&text, song));
            if !text.is_empty() {
                parts.push(text);
            }
            if has_suggested {
                break;
            }
        }

        let mut path = self.prefix.clone();
        let file_name = parts.pop().unwrap_or_else(|| EMPTY_NAME.to_string());
        for part in parts {
            path.push(part);
        }
        let mut file_name = OsString::from(file_name);
        file_name.push(EXTENSION);
        path.push(file_name);
        path
    }

    /// Deepest directory shared by the rendered paths of every song.
    ///
    /// Comparison is per path component. Returns `None` for an empty batch
    /// and `.` when relative paths have nothing in common.
    pub fn common_base<S: SongFields>(&self, songs: &[S]) -> Option<PathBuf> {
        let rendered: Vec<PathBuf> = songs
            .iter()
            .map(|song| {
                let path = self.render(song, None);
                path.parent().map(Path::to_path_buf).unwrap_or_default()
            })
            .collect();

        let mut base: Option<Vec<Component<'_>>> = None;
        for dir in &rendered {
            let components: Vec<Component<'_>> = dir.components().collect();
            base = Some(match base {
                None => components,
                Some(current) => current
                    .into_iter()
                    .zip(components)
                    .take_while(|(left, right)| left == right)
                    .map(|(left, _)| left)
                    .collect(),
            });
        }

        let components = base?;
        if components.is_empty() {
            return Some(PathBuf::from("."));
        }
        Some(components.iter().collect())
    }
}

fn suggested_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn placeholder_field(token: &str, schema: Schema) -> Option<&'static str> {
    match token {
        "artist" => Some("artist"),
        "title" => Some("title"),
        "album" => Some("album"),
        "date" => Some("date"),
        "genre" => Some("genre"),
        "track" | "track2" => Some(schema.track_field()),
        "albumartist" => Some(schema.album_artist_field()),
        "disc" => Some(schema.disc_field()),
        _ => None,
    }
}

fn fill_placeholders<S: SongFields + ?Sized>(segment: &str, song: &S) -> String {
    PLACEHOLDER
        .replace_all(segment, |caps: &Captures<'_>| {
            let token = &caps[1];
            let value = placeholder_field(token, song.schema()).and_then(|name| song.field(name));
            match value {
                Some(value) => match token {
                    "track" => track_head(&value).to_string(),
                    "track2" => pad_track(track_head(&value)),
                    _ => value,
                },
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn track_head(value: &str) -> &str {
    value.split('/').next().unwrap_or(value).trim()
}

/// Zero-pads a track number to two digits.
pub fn pad_track(value: &str) -> String {
    format!("{:0>2}", value)
}
