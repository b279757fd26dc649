use std::path::{Path, PathBuf};

use common::{song_key, Codec, LocalTags};
use metadata::{read_tags, MetadataError};
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::filter::SongFilter;
use crate::reconcile::KeyedCollection;

/// Source of tags for local files.
pub trait TagReader {
    fn read(&self, path: &Path) -> Result<LocalTags, MetadataError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FileTagReader;

impl TagReader for FileTagReader {
    fn read(&self, path: &Path) -> Result<LocalTags, MetadataError> {
        read_tags(path)
    }
}

/// Joins path exclusion patterns into a single alternation.
pub fn exclude_regex<T: AsRef<str>>(patterns: &[T]) -> Result<Option<Regex>, regex::Error> {
    let parts: Vec<&str> = patterns
        .iter()
        .map(|pattern| pattern.as_ref())
        .filter(|pattern| !pattern.is_empty())
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }
    Regex::new(&parts.join("|")).map(Some)
}

#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    pub exclude: Option<Regex>,
    /// Directory levels to descend below each root; `None` is unbounded and
    /// `Some(0)` keeps only files directly inside the root.
    pub max_depth: Option<usize>,
    pub filter: SongFilter,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalSong {
    pub path: PathBuf,
    pub key: String,
}

#[derive(Clone, Debug, Default)]
pub struct LocalLoad {
    pub included: Vec<LocalSong>,
    pub excluded: Vec<PathBuf>,
    pub filtered: Vec<PathBuf>,
}

impl LocalLoad {
    pub fn keyed(&self) -> KeyedCollection<PathBuf> {
        self.included
            .iter()
            .map(|song| (song.key.clone(), song.path.clone()))
            .collect()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.included.iter().map(|song| song.path.clone()).collect()
    }
}

/// Audio files under `roots`, in walk order. A root may be a single file.
pub fn collect_audio_files(roots: &[PathBuf], max_depth: Option<usize>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            if Codec::from_path(root).is_some() {
                files.push(root.clone());
            }
            continue;
        }
        if !root.is_dir() {
            warn!("Skipping missing input {:?}", root);
            continue;
        }

        let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth.saturating_add(1));
        }
        for entry in walker.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            if Codec::from_path(entry.path()).is_some() {
                files.push(entry.into_path());
            }
        }
    }
    files
}

pub fn load_local<R: TagReader + ?Sized>(
    roots: &[PathBuf],
    options: &ScanOptions,
    reader: &R,
) -> LocalLoad {
    let mut load = LocalLoad::default();

    for path in collect_audio_files(roots, options.max_depth) {
        if let Some(exclude) = &options.exclude {
            if exclude.is_match(&path.to_string_lossy()) {
                load.excluded.push(path);
                continue;
            }
        }

        let mut tags = match reader.read(&path) {
            Ok(tags) => tags,
            Err(err) => {
                warn!("Failed to read tags for {:?}: {}", path, err);
                continue;
            }
        };

        if !options.filter.matches(&tags) {
            load.filtered.push(path);
            continue;
        }

        let key = song_key(&mut tags);
        debug!("Keyed {:?} as {:?}", path, key);
        load.included.push(LocalSong { path, key });
    }

    load
}

#[cfg(test)]
mod tests {
    use super::{collect_audio_files, exclude_regex, load_local, ScanOptions, TagReader};
    use crate::filter::{FilterSet, SongFilter};
    use common::LocalTags;
    use metadata::MetadataError;
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Serves tags from memory; unknown paths fail like a corrupt file.
    #[derive(Default)]
    struct FakeReader {
        tags: HashMap<PathBuf, LocalTags>,
    }

    impl TagReader for FakeReader {
        fn read(&self, path: &Path) -> Result<LocalTags, MetadataError> {
            self.tags.get(path).cloned().ok_or_else(|| {
                MetadataError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "unreadable",
                ))
            })
        }
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn tags(artist: &str, title: &str) -> LocalTags {
        LocalTags::new()
            .with("artist", artist)
            .with("album", "Album")
            .with("title", title)
            .with("tracknumber", "1")
    }

    #[test]
    fn walks_supported_files_with_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        touch(&root.join("top.MP3"));
        touch(&root.join("notes.txt"));
        touch(&root.join("a/one.flac"));
        touch(&root.join("a/b/two.ogg"));

        let all = collect_audio_files(&[root.clone()], None);
        assert_eq!(all.len(), 3);

        let flat = collect_audio_files(&[root.clone()], Some(0));
        assert_eq!(flat, vec![root.join("top.MP3")]);

        let one = collect_audio_files(&[root.clone()], Some(1));
        assert_eq!(one.len(), 2);

        let file_root = collect_audio_files(&[root.join("a/one.flac")], Some(0));
        assert_eq!(file_root, vec![root.join("a/one.flac")]);
    }

    #[test]
    fn splits_excluded_filtered_and_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let keep = root.join("keep.mp3");
        let live = root.join("live/show.mp3");
        let other = root.join("other.m4a");
        let broken = root.join("broken.mp3");
        for path in [&keep, &live, &other, &broken] {
            touch(path);
        }

        let mut reader = FakeReader::default();
        reader.tags.insert(keep.clone(), tags("Muse", "Bliss"));
        reader.tags.insert(live.clone(), tags("Muse", "Live"));
        reader.tags.insert(other.clone(), tags("Blur", "Song 2"));

        let options = ScanOptions {
            exclude: exclude_regex(&["/live/", "bootleg"]).unwrap(),
            max_depth: None,
            filter: SongFilter::new(
                FilterSet::parse(["artist:muse"], false).unwrap(),
                FilterSet::default(),
            ),
        };
        let load = load_local(&[root.clone()], &options, &reader);

        assert_eq!(load.excluded, vec![live]);
        assert_eq!(load.filtered, vec![other]);
        assert_eq!(load.paths(), vec![keep.clone()]);
        assert_eq!(load.included[0].key, "muse|album|bliss|1");
        assert_eq!(load.keyed().get("muse|album|bliss|1"), Some(&keep));
    }

    #[test]
    fn empty_exclude_list_has_no_regex() {
        let none: [&str; 0] = [];
        assert!(exclude_regex(&none).unwrap().is_none());
        assert!(exclude_regex(&["("]).is_err());
    }
}
