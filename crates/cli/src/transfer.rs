use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use common::{LocalTags, RemoteSong, SongFields};
use library::{pad_track, sanitize_segment, TagReader, Template};
use remote::{Download, RemoteLibrary};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::console::{progress, Console};

const TEMP_PREFIX: &str = ".tunesync-";

/// Per-item failures collected over a batch.
#[derive(Debug, Default)]
pub struct TransferReport {
    pub completed: usize,
    pub errors: Vec<(String, String)>,
}

impl TransferReport {
    fn record_error(&mut self, item: impl Into<String>, err: impl Display) {
        self.errors.push((item.into(), err.to_string()));
    }

    pub fn print_summary(&self, console: &Console) {
        if self.errors.is_empty() {
            return;
        }
        console.always("\n\nThe following errors occurred:\n");
        for (item, err) in &self.errors {
            console.always(format!("{} | {}", item, err));
        }
        console.always("\nThese files may need to be synced again.\n");
    }
}

#[derive(Clone, Debug)]
pub struct UploadOptions {
    pub quality: String,
    pub enable_matching: bool,
    pub delete_on_success: bool,
}

pub async fn upload_files<R: RemoteLibrary + ?Sized>(
    remote: &R,
    files: &[PathBuf],
    options: &UploadOptions,
    console: &Console,
) -> TransferReport {
    let mut report = TransferReport::default();
    let total = files.len();

    for (index, file) in files.iter().enumerate() {
        let counter = progress(index + 1, total);
        let result = remote
            .upload(file, &options.quality, options.enable_matching)
            .await;
        match result {
            Ok(result) if result.succeeded() => {
                report.completed += 1;
                let verb = if result.uploaded {
                    "Successfully uploaded"
                } else {
                    "Successfully scanned and matched"
                };
                console.say(format!("{} {}  {}", counter, verb, file.display()));
                if options.delete_on_success {
                    remove_local(file);
                }
            }
            Ok(result) => {
                let duplicate = result.already_exists();
                let reason = if duplicate {
                    "ALREADY EXISTS".to_string()
                } else {
                    result.reason.unwrap_or_else(|| "rejected".to_string())
                };
                console.say(format!(
                    "{} Failed to upload  {} | {}",
                    counter,
                    file.display(),
                    reason
                ));
                if !duplicate {
                    report.record_error(file.display().to_string(), reason);
                }
            }
            Err(err) => {
                console.say(format!(
                    "{} Failed to upload  {} | {}",
                    counter,
                    file.display(),
                    err
                ));
                report.record_error(file.display().to_string(), err);
            }
        }
    }

    report
}

pub fn remove_local(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {:?}", path),
        Err(err) => warn!("Failed to remove {:?} after successful upload: {}", path, err),
    }
}

/// Where downloaded songs end up.
#[derive(Clone, Debug)]
pub enum DownloadTarget {
    /// Keep the server's suggested file name inside this directory.
    Directory(PathBuf),
    /// Render each song's path from its tags; temp files are staged in
    /// `staging` before being moved into place.
    Template { template: Template, staging: PathBuf },
}

impl DownloadTarget {
    /// Directory every download lands under.
    pub fn base_dir(&self) -> &Path {
        match self {
            DownloadTarget::Directory(dir) => dir,
            DownloadTarget::Template { staging, .. } => staging,
        }
    }
}

pub async fn download_songs<R, T>(
    remote: &R,
    songs: &[RemoteSong],
    target: &DownloadTarget,
    reader: &T,
    console: &Console,
) -> TransferReport
where
    R: RemoteLibrary + ?Sized,
    T: TagReader + ?Sized,
{
    let mut report = TransferReport::default();
    let total = songs.len();

    for (index, song) in songs.iter().enumerate() {
        let counter = progress(index + 1, total);
        let download = match remote.download(&song.id).await {
            Ok(download) => download,
            Err(err) => {
                console.say(format!("{} Failed to download  {} | {}", counter, song.id, err));
                report.record_error(song.id.clone(), err);
                continue;
            }
        };
        let name = download.suggested_filename.clone();
        match store_download(song, download, target, reader) {
            Ok(path) => {
                report.completed += 1;
                console.say(format!("{} Successfully downloaded  {}", counter, path.display()));
            }
            Err(err) => {
                console.say(format!("{} Failed to download  {} | {}", counter, name, err));
                report.record_error(name, err);
            }
        }
    }

    report
}

/// Writes a download to a temp file, works out its final path and moves it
/// there. The temp file is removed if anything fails.
fn store_download<T: TagReader + ?Sized>(
    song: &RemoteSong,
    download: Download,
    target: &DownloadTarget,
    reader: &T,
) -> std::io::Result<PathBuf> {
    let staging = target.base_dir();
    fs::create_dir_all(staging)?;
    let suffix = Path::new(&download.suggested_filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&suffix)
        .tempfile_in(staging)?;
    temp.write_all(&download.audio)?;
    temp.flush()?;

    let destination = match target {
        DownloadTarget::Directory(dir) => dir.join(sanitize_segment(&download.suggested_filename)),
        DownloadTarget::Template { template, .. } => {
            template_destination(template, song, &download.suggested_filename, temp.path(), reader)
        }
    };

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    persist(temp, &destination)?;
    Ok(destination)
}

fn template_destination<T: TagReader + ?Sized>(
    template: &Template,
    song: &RemoteSong,
    suggested: &str,
    audio_path: &Path,
    reader: &T,
) -> PathBuf {
    let tags = match reader.read(audio_path) {
        Ok(tags) if !tags.is_empty() => tags,
        Ok(_) => {
            debug!("No tags in download of {}; using remote metadata", song.id);
            return template.render(song, Some(suggested));
        }
        Err(err) => {
            warn!("Failed to read tags of {}: {}; using remote metadata", song.id, err);
            return template.render(song, Some(suggested));
        }
    };
    if template.uses_padded_track() {
        pad_track_tag(&tags, audio_path);
    }
    template.render(&tags, Some(suggested))
}

/// Stores the zero-padded track number in the file itself.
fn pad_track_tag(tags: &LocalTags, audio_path: &Path) {
    let padded = match tags.field("tracknumber").and_then(|track| padded_track(&track)) {
        Some(padded) => padded,
        None => return,
    };
    if let Err(err) = metadata::rewrite_track_number(audio_path, &padded) {
        warn!("Failed to update track number in {:?}: {}", audio_path, err);
    }
}

/// Pads the number in `n` or `n/total`, keeping the total. `None` when the
/// value is already padded.
fn padded_track(track: &str) -> Option<String> {
    let (head, total) = match track.split_once('/') {
        Some((head, total)) => (head.trim(), Some(total.trim())),
        None => (track.trim(), None),
    };
    let padded = match total {
        Some(total) => format!("{}/{}", pad_track(head), total),
        None => pad_track(head),
    };
    (padded != track).then_some(padded)
}

/// Moves a finished temp file into place, copying when a rename is not possible.
fn persist(temp: NamedTempFile, destination: &Path) -> std::io::Result<()> {
    match temp.persist(destination) {
        Ok(_) => Ok(()),
        Err(err) => {
            debug!("Rename into {:?} failed ({}); copying", destination, err.error);
            fs::copy(err.file.path(), destination)?;
            Ok(())
        }
    }
}

pub async fn delete_songs<R: RemoteLibrary + ?Sized>(
    remote: &R,
    songs: &[RemoteSong],
    console: &Console,
) -> TransferReport {
    let mut report = TransferReport::default();
    let total = songs.len();

    for (index, song) in songs.iter().enumerate() {
        let counter = progress(index + 1, total);
        let label = format!(
            "{} by {}",
            song.field("title").unwrap_or_default(),
            song.field("artist").unwrap_or_default()
        );
        match remote.delete(&song.id).await {
            Ok(()) => {
                report.completed += 1;
                console.say(format!("{} Deleted  {}", counter, label));
            }
            Err(err) => {
                console.say(format!("{} Failed to delete  {} | {}", counter, label, err));
                report.record_error(song.id.clone(), err);
            }
        }
    }

    report
}
