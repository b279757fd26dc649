use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use common::RemoteSong;
use library::{
    load_local, load_remote, missing, FileTagReader, LocalLoad, RemoteLoad, SongFilter, TagReader,
};

use crate::args::{inputs_or_cwd, CommandArgs, FilterArgs, OutputArgs, ScanArgs, SessionArgs};
use crate::commands::download::resolve_target;
use crate::commands::{list_songs, list_upload_plan, report_local, report_remote, sort_songs};
use crate::console::Console;
use crate::session::{connect, finish};
use crate::transfer::{download_songs, remove_local, upload_files, UploadOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Upload local songs missing from the remote library
    Up,
    /// Download remote songs missing locally
    Down,
}

/// Sync songs between local folders and the remote library.
#[derive(Parser, Debug)]
#[command(name = "tssync", version)]
pub struct Args {
    #[arg(value_enum)]
    pub direction: Direction,

    /// Inputs when syncing up; a single output directory or template when
    /// syncing down [default: .]
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Let the server match songs against its catalog instead of uploading them
    #[arg(short = 'm', long = "match")]
    pub enable_matching: bool,

    /// Delete local files that are uploaded, matched or already present remotely
    #[arg(long)]
    pub delete_on_success: bool,

    /// List what would be transferred without transferring
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    #[command(flatten)]
    pub session: SessionArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub scan: ScanArgs,
}

impl CommandArgs for Args {
    fn output(&self) -> &OutputArgs {
        &self.output
    }
}

/// Local files whose songs the remote library lacks, in path order.
pub fn plan_upload(local: &LocalLoad, remote: &mut RemoteLoad) -> Vec<PathBuf> {
    let mut files = missing(&local.keyed(), &remote.keyed());
    files.sort();
    files
}

/// Songs already under the download base. Path excludes and depth limits
/// apply; tag filters only narrow the remote side.
pub fn scan_download_base<R: TagReader + ?Sized>(
    scan: &ScanArgs,
    base: PathBuf,
    reader: &R,
) -> anyhow::Result<LocalLoad> {
    let options = scan
        .scan_options(SongFilter::default())
        .context("invalid exclude pattern")?;
    Ok(load_local(&[base], &options, reader))
}

/// Remote songs with no local counterpart, by artist, album and track.
pub fn plan_download(remote: &mut RemoteLoad, local: &LocalLoad) -> Vec<RemoteSong> {
    let mut songs = missing(&remote.keyed(), &local.keyed());
    sort_songs(&mut songs);
    songs
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    match args.direction {
        Direction::Up => sync_up(args).await,
        Direction::Down => sync_down(args).await,
    }
}

async fn sync_up(args: Args) -> anyhow::Result<()> {
    let console = Console::new(args.output.quiet);
    let filter = args.filters.song_filter()?;
    let options = args
        .scan
        .scan_options(filter)
        .context("invalid exclude pattern")?;
    let (mut session, config) = connect(&args.session, &console).await?;

    console.say("Loading remote songs...");
    let mut remote = load_remote(&session, &SongFilter::default()).await?;
    report_remote(&console, &remote);

    console.say("Loading local songs...");
    let local = load_local(&inputs_or_cwd(&args.paths), &options, &FileTagReader);
    report_local(&console, &local);

    console.say("\nScanning for missing songs...");
    let files = plan_upload(&local, &mut remote);
    console.say(format!("\nFound {} song(s) to upload", files.len()));

    if args.dry_run {
        let mut excluded = local.excluded.clone();
        excluded.sort();
        list_upload_plan(&console, &files, &excluded);
    } else if files.is_empty() {
        console.say("\nNo songs to upload");
        if args.delete_on_success {
            for path in local.paths() {
                remove_local(&path);
            }
        }
    } else {
        console.say(format!("\nUploading {} song(s)\n", files.len()));
        let upload_options = UploadOptions {
            quality: config.transcode_quality.clone(),
            enable_matching: args.enable_matching,
            delete_on_success: args.delete_on_success,
        };
        let report = upload_files(&session, &files, &upload_options, &console).await;
        report.print_summary(&console);
    }

    finish(&mut session).await;
    console.say("\nAll done!");
    Ok(())
}

async fn sync_down(args: Args) -> anyhow::Result<()> {
    let console = Console::new(args.output.quiet);
    if args.paths.len() > 1 {
        bail!("sync down takes at most one output path");
    }
    let output = args
        .paths
        .first()
        .map(|path| path.to_string_lossy().into_owned());
    let filter = args.filters.song_filter()?;
    let (mut session, _) = connect(&args.session, &console).await?;

    console.say("Loading remote songs...");
    let mut remote = load_remote(&session, &filter).await?;
    report_remote(&console, &remote);

    let target = resolve_target(output.as_deref(), &remote.included);
    let base = target.base_dir().to_path_buf();
    console.say(format!("Loading local songs under {}...", base.display()));
    let local = scan_download_base(&args.scan, base, &FileTagReader)?;
    report_local(&console, &local);

    console.say("\nScanning for missing songs...");
    let songs = plan_download(&mut remote, &local);
    console.say(format!("\nFound {} song(s) to download", songs.len()));

    if songs.is_empty() {
        console.say("\nNo songs to download");
    } else if args.dry_run {
        list_songs(&console, "Songs to download", &songs);
    } else {
        console.say(format!("\nDownloading {} song(s)\n", songs.len()));
        let report = download_songs(&session, &songs, &target, &FileTagReader, &console).await;
        report.print_summary(&console);
    }

    finish(&mut session).await;
    console.say("\nAll done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{plan_download, plan_upload, scan_download_base, Args, Direction};
    use clap::Parser;
    use common::{LocalTags, RemoteSong};
    use library::{LocalLoad, LocalSong, RemoteLoad, TagReader};
    use metadata::MetadataError;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Tags every file as a song titled after its file stem.
    struct StemTags;

    impl TagReader for StemTags {
        fn read(&self, path: &Path) -> Result<LocalTags, MetadataError> {
            let title = path.file_stem().unwrap().to_string_lossy().into_owned();
            Ok(LocalTags::new()
                .with("artist", "Muse")
                .with("album", "Origin")
                .with("title", title)
                .with("tracknumber", "1"))
        }
    }

    fn remote_song(id: &str, title: &str, track: u32) -> RemoteSong {
        RemoteSong::new(id)
            .with("artist", "Muse")
            .with("album", "Origin")
            .with("title", title)
            .with("track_number", track)
    }

    fn local_song(path: &str, key: &str) -> LocalSong {
        LocalSong {
            path: PathBuf::from(path),
            key: key.to_string(),
        }
    }

    fn fixtures() -> (LocalLoad, RemoteLoad) {
        let local = LocalLoad {
            included: vec![
                local_song("b/one.mp3", "muse|origin|one|1"),
                local_song("a/two.mp3", "muse|origin|two|2"),
            ],
            ..LocalLoad::default()
        };
        let remote = RemoteLoad {
            included: vec![remote_song("r2", "Two", 2), remote_song("r3", "Three", 3)],
            filtered: Vec::new(),
        };
        (local, remote)
    }

    #[test]
    fn sync_up_uploads_only_local_extras() {
        let (local, mut remote) = fixtures();
        assert_eq!(plan_upload(&local, &mut remote), vec![PathBuf::from("b/one.mp3")]);
    }

    #[test]
    fn sync_down_downloads_only_remote_extras() {
        let (local, mut remote) = fixtures();
        let songs = plan_download(&mut remote, &local);
        let ids: Vec<&str> = songs.iter().map(|song| song.id.as_str()).collect();
        assert_eq!(ids, vec!["r3"]);
    }

    #[test]
    fn download_plan_is_sorted_by_track() {
        let local = LocalLoad::default();
        let mut remote = RemoteLoad {
            included: vec![
                remote_song("c", "Three", 3),
                remote_song("a", "One", 1),
                remote_song("b", "Two", 2),
            ],
            filtered: Vec::new(),
        };
        let ids: Vec<String> = plan_download(&mut remote, &local)
            .into_iter()
            .map(|song| song.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_direction_and_paths() {
        let args = Args::try_parse_from(["tssync", "up", "-R", "music", "more"]).unwrap();
        assert_eq!(args.direction, Direction::Up);
        assert_eq!(args.paths.len(), 2);
        assert_eq!(args.scan.max_depth(), Some(0));

        let args = Args::try_parse_from(["tssync", "down", "%artist%/%title%", "-d"]).unwrap();
        assert_eq!(args.direction, Direction::Down);
        assert!(args.dry_run);
        assert!(Args::try_parse_from(["tssync", "sideways"]).is_err());
    }

    #[test]
    fn sync_down_ignores_excluded_local_copies() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["Muse/live/bliss.mp3", "Muse/studio/one.mp3"] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"x").unwrap();
        }
        let args = Args::try_parse_from(["tssync", "down", "-e", "live"]).unwrap();

        let local = scan_download_base(&args.scan, dir.path().to_path_buf(), &StemTags).unwrap();
        assert_eq!(local.excluded.len(), 1);
        assert_eq!(local.included.len(), 1);

        let mut remote = RemoteLoad {
            included: vec![remote_song("r1", "Bliss", 1), remote_song("r2", "One", 1)],
            filtered: Vec::new(),
        };
        let ids: Vec<String> = plan_download(&mut remote, &local)
            .into_iter()
            .map(|song| song.id)
            .collect();
        assert_eq!(ids, vec!["r1"]);
    }
}
