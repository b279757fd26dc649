use std::path::{Path, PathBuf};

use clap::Parser;
use common::RemoteSong;
use library::{load_remote, FileTagReader, Template};

use crate::args::{CommandArgs, FilterArgs, OutputArgs, SessionArgs};
use crate::commands::{list_songs, report_remote, sort_songs};
use crate::console::Console;
use crate::session::{connect, finish};
use crate::transfer::{download_songs, DownloadTarget};

/// Download songs from the remote library.
#[derive(Parser, Debug)]
#[command(name = "tsdownload", version)]
pub struct Args {
    /// Output directory, or a path template using %artist%, %album%,
    /// %albumartist%, %title%, %track%, %track2%, %disc%, %date%, %genre%
    /// and %suggested% [default: .]
    #[arg(value_name = "OUTPUT")]
    pub output_path: Option<String>,

    /// List what would be downloaded without downloading
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    #[command(flatten)]
    pub session: SessionArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub filters: FilterArgs,
}

impl CommandArgs for Args {
    fn output(&self) -> &OutputArgs {
        &self.output
    }
}

/// Turns the output argument into a download target for `songs`.
///
/// Existing directories and paths without placeholders keep the server's
/// file names; anything else is a template whose common base across the
/// batch is where files are staged.
pub fn resolve_target(output: Option<&str>, songs: &[RemoteSong]) -> DownloadTarget {
    let output = match output.map(str::trim).filter(|value| !value.is_empty()) {
        Some(output) => output,
        None => return DownloadTarget::Directory(PathBuf::from(".")),
    };
    if Path::new(output).is_dir() || !output.contains('%') {
        return DownloadTarget::Directory(PathBuf::from(output));
    }
    let template = Template::parse(output);
    let staging = template
        .common_base(songs)
        .unwrap_or_else(|| PathBuf::from("."));
    DownloadTarget::Template { template, staging }
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let console = Console::new(args.output.quiet);
    let filter = args.filters.song_filter()?;
    let (mut session, _) = connect(&args.session, &console).await?;

    console.say("Loading remote songs...");
    let load = load_remote(&session, &filter).await?;
    report_remote(&console, &load);
    let mut songs = load.included;
    sort_songs(&mut songs);

    console.say(format!("Found {} song(s) to download", songs.len()));
    if songs.is_empty() {
        console.say("\nNo songs to download");
    } else if args.dry_run {
        list_songs(&console, "Songs to download", &songs);
    } else {
        let target = resolve_target(args.output_path.as_deref(), &songs);
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
    use super::resolve_target;
    use crate::transfer::DownloadTarget;
    use common::RemoteSong;
    use std::path::{Path, PathBuf};

    #[test]
    fn plain_paths_are_directories() {
        let songs = vec![RemoteSong::new("a")];
        match resolve_target(None, &songs) {
            DownloadTarget::Directory(dir) => assert_eq!(dir, PathBuf::from(".")),
            other => panic!("unexpected target {:?}", other),
        }
        match resolve_target(Some("downloads"), &songs) {
            DownloadTarget::Directory(dir) => assert_eq!(dir, PathBuf::from("downloads")),
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn templates_stage_in_common_base() {
        let songs = vec![
            RemoteSong::new("a").with("artist", "Muse").with("title", "x"),
            RemoteSong::new("b").with("artist", "Muse").with("title", "y"),
        ];
        let target = resolve_target(Some("Music/%artist%/%title%"), &songs);
        assert!(matches!(target, DownloadTarget::Template { .. }));
        assert_eq!(target.base_dir(), Path::new("Music/Muse"));
    }
}
