//! Local/remote song reconciliation: loading, filtering, keying, diffing and
//! output path templating.

pub mod catalog;
pub mod filter;
pub mod reconcile;
pub mod scan;
pub mod template;

pub use catalog::{load_remote, RemoteLoad};
pub use filter::{FilterError, FilterPredicate, FilterSet, SongFilter};
pub use reconcile::{missing, KeyedCollection};
pub use scan::{
    collect_audio_files, exclude_regex, load_local, FileTagReader, LocalLoad, LocalSong,
    ScanOptions, TagReader,
};
pub use template::{pad_track, sanitize_segment, Template};
