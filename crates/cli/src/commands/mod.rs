pub mod delete;
pub mod download;
pub mod search;
pub mod sync;
pub mod upload;

use std::path::PathBuf;

use common::RemoteSong;
use library::{LocalLoad, RemoteLoad};

use crate::console::{describe, Console};

pub(crate) fn sort_songs(songs: &mut [RemoteSong]) {
    songs.sort_by_key(|song| song.sort_key());
}

pub(crate) fn report_local(console: &Console, load: &LocalLoad) {
    console.say(format!("Excluded {} local songs.", load.excluded.len()));
    console.say(format!("Filtered {} local songs.", load.filtered.len()));
    console.say(format!("Loaded {} local songs.\n", load.included.len()));
}

pub(crate) fn report_remote(console: &Console, load: &RemoteLoad) {
    console.say(format!("Filtered {} remote songs.", load.filtered.len()));
    console.say(format!("Loaded {} remote songs.\n", load.included.len()));
}

/// Dry-run listing; printed even with `--quiet`.
pub(crate) fn list_songs(console: &Console, heading: &str, songs: &[RemoteSong]) {
    console.say(format!("\n{}:\n", heading));
    for song in songs {
        console.always(describe(song));
    }
}

pub(crate) fn list_paths(console: &Console, heading: &str, paths: &[PathBuf]) {
    console.say(format!("\n{}:\n", heading));
    for path in paths {
        console.always(path.display());
    }
}

/// Dry-run report of an upload: what would go up and what the path
/// excludes skipped.
pub(crate) fn list_upload_plan(console: &Console, files: &[PathBuf], excluded: &[PathBuf]) {
    if files.is_empty() {
        console.say("\nNo songs to upload");
    } else {
        list_paths(console, "Songs to upload", files);
    }
    if excluded.is_empty() {
        console.say("\nNo songs to exclude");
    } else {
        list_paths(console, "Songs to exclude", excluded);
    }
}
