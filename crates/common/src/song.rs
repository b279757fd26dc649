use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schema {
    Local,
    Remote,
}

impl Schema {
    pub fn track_field(self) -> &'static str {
        match self {
            Schema::Local => "tracknumber",
            Schema::Remote => "track_number",
        }
    }

    pub fn album_artist_field(self) -> &'static str {
        match self {
            Schema::Local => "albumartist",
            Schema::Remote => "album_artist",
        }
    }

    pub fn disc_field(self) -> &'static str {
        match self {
            Schema::Local => "discnumber",
            Schema::Remote => "disc_number",
        }
    }
}

/// Read/write access to the raw metadata of a song, whatever its origin.
pub trait SongFields {
    fn schema(&self) -> Schema;

    /// Raw value of `name`, or `None` when the field is absent.
    fn field(&self, name: &str) -> Option<String>;

    fn set_field(&mut self, name: &str, value: String);
}

/// A song record as listed by the remote library.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSong {
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl RemoteSong {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Track number as an integer, ignoring any `/total` suffix.
    pub fn track_no(&self) -> u32 {
        self.field(Schema::Remote.track_field())
            .and_then(|value| {
                let head = value.split('/').next().unwrap_or(&value).trim().to_string();
                head.parse().ok()
            })
            .unwrap_or(0)
    }

    /// Ordering used for listings: artist, album, track number.
    pub fn sort_key(&self) -> (String, String, u32) {
        (
            self.field("artist").unwrap_or_default().to_lowercase(),
            self.field("album").unwrap_or_default().to_lowercase(),
            self.track_no(),
        )
    }
}

impl SongFields for RemoteSong {
    fn schema(&self) -> Schema {
        Schema::Remote
    }

    fn field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            Value::Array(values) => values.first().and_then(|value| match value {
                Value::String(text) => Some(text.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            }),
            Value::Object(_) => None,
        }
    }

    fn set_field(&mut self, name: &str, value: String) {
        self.fields.insert(name.to_string(), Value::String(value));
    }
}

/// Tags read from a local audio file. Every tag may carry several values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalTags {
    values: BTreeMap<String, Vec<String>>,
}

impl LocalTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SongFields for LocalTags {
    fn schema(&self) -> Schema {
        Schema::Local
    }

    fn field(&self, name: &str) -> Option<String> {
        self.values.get(name)?.first().cloned()
    }

    fn set_field(&mut self, name: &str, value: String) {
        self.values.insert(name.to_string(), vec![value]);
    }
}
