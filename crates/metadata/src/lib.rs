use std::path::Path;

use common::LocalTags;
use lofty::config::WriteOptions;
use lofty::error::LoftyError;
use lofty::prelude::{ItemKey, TaggedFileExt};
use lofty::tag::{Tag, TagExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tag error: {0}")]
    Lofty(#[from] LoftyError),
}

/// Tag keys exposed under their plain names.
const TEXT_KEYS: [(&str, ItemKey); 7] = [
    ("artist", ItemKey::TrackArtist),
    ("album", ItemKey::AlbumTitle),
    ("title", ItemKey::TrackTitle),
    ("albumartist", ItemKey::AlbumArtist),
    ("date", ItemKey::RecordingDate),
    ("genre", ItemKey::Genre),
    ("composer", ItemKey::Composer),
];

pub fn read_tags(path: &Path) -> Result<LocalTags, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let mut tags = LocalTags::new();

    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => return Ok(tags),
    };

    for (name, key) in TEXT_KEYS.iter() {
        for value in tag.get_strings(key) {
            tags.push(name, value);
        }
    }
    if tags.values("date").is_empty() {
        if let Some(year) = tag.get_string(&ItemKey::Year) {
            tags.push("date", year);
        }
    }
    if let Some(track) = numbered(tag, ItemKey::TrackNumber, ItemKey::TrackTotal) {
        tags.push("tracknumber", track);
    }
    if let Some(disc) = numbered(tag, ItemKey::DiscNumber, ItemKey::DiscTotal) {
        tags.push("discnumber", disc);
    }

    Ok(tags)
}

/// Replaces the track number stored in `path`. A `n/total` value also sets
/// the track total. Returns `false` when the file carries no tag to update.
pub fn rewrite_track_number(path: &Path, value: &str) -> Result<bool, MetadataError> {
    let mut tagged_file = lofty::read_from_path(path)?;
    let tag: &mut Tag = match tagged_file.primary_tag_mut() {
        Some(tag) => tag,
        None => return Ok(false),
    };
    let (number, total) = match value.split_once('/') {
        Some((number, total)) => (number.trim(), Some(total.trim())),
        None => (value.trim(), None),
    };
    if !tag.insert_text(ItemKey::TrackNumber, number.to_string()) {
        return Ok(false);
    }
    if let Some(total) = total.filter(|total| !total.is_empty()) {
        tag.insert_text(ItemKey::TrackTotal, total.to_string());
    }
    tag.save_to_path(path, WriteOptions::default())?;
    Ok(true)
}

fn numbered(tag: &Tag, number: ItemKey, total: ItemKey) -> Option<String> {
    let number = tag.get_string(&number)?.trim();
    if number.is_empty() {
        return None;
    }
    match tag.get_string(&total).map(str::trim) {
        Some(total) if !total.is_empty() && !number.contains('/') => {
            Some(format!("{}/{}", number, total))
        }
        _ => Some(number.to_string()),
    }
}
