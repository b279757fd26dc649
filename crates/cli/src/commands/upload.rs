use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use library::{load_local, FileTagReader, LocalLoad};

use crate::args::{inputs_or_cwd, CommandArgs, FilterArgs, OutputArgs, ScanArgs, SessionArgs};
use crate::commands::{list_upload_plan, report_local};
use crate::console::Console;
use crate::session::{connect, finish};
use crate::transfer::{upload_files, UploadOptions};

/// Upload local songs to the remote library.
#[derive(Parser, Debug)]
#[command(name = "tsupload", version)]
pub struct Args {
    /// Files or directories to upload [default: .]
    #[arg(value_name = "INPUT")]
    pub input: Vec<PathBuf>,

    /// Let the server match songs against its catalog instead of uploading them
    #[arg(short = 'm', long = "match")]
    pub enable_matching: bool,

    /// Delete local files once they are uploaded or matched
    #[arg(long)]
    pub delete_on_success: bool,

    /// List what would be uploaded without uploading
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

/// Files to upload and files skipped by path excludes, both in path order.
pub fn upload_plan(local: &LocalLoad) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut files = local.paths();
    files.sort();
    let mut excluded = local.excluded.clone();
    excluded.sort();
    (files, excluded)
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let console = Console::new(args.output.quiet);
    let filter = args.filters.song_filter()?;
    let options = args
        .scan
        .scan_options(filter)
        .context("invalid exclude pattern")?;

    console.say("Loading local songs...");
    let local = load_local(&inputs_or_cwd(&args.input), &options, &FileTagReader);
    report_local(&console, &local);
    let (files, excluded) = upload_plan(&local);
    console.say(format!("Found {} song(s) to upload", files.len()));

    if args.dry_run {
        list_upload_plan(&console, &files, &excluded);
        return Ok(());
    }
    if files.is_empty() {
        console.say("No songs to upload");
        console.say("\nAll done!");
        return Ok(());
    }

    let (mut session, config) = connect(&args.session, &console).await?;
    console.say(format!("Uploading {} song(s)\n", files.len()));
    let upload_options = UploadOptions {
        quality: config.transcode_quality.clone(),
        enable_matching: args.enable_matching,
        delete_on_success: args.delete_on_success,
    };
    let report = upload_files(&session, &files, &upload_options, &console).await;
    report.print_summary(&console);
    finish(&mut session).await;

    console.say("\nAll done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{upload_plan, Args};
    use clap::Parser;
    use library::{LocalLoad, LocalSong};
    use std::path::PathBuf;

    #[test]
    fn parses_upload_flags() {
        let args = Args::try_parse_from([
            "tsupload", "-m", "--delete-on-success", "-c", "work", "-e", "live", "-q", "music",
            "extra.mp3",
        ])
        .unwrap();
        assert!(args.enable_matching);
        assert!(args.delete_on_success);
        assert!(args.output.quiet);
        assert_eq!(args.session.cred, "work");
        assert_eq!(args.scan.exclude, vec!["live".to_string()]);
        assert_eq!(
            args.input,
            vec![PathBuf::from("music"), PathBuf::from("extra.mp3")]
        );
    }

    #[test]
    fn credential_name_defaults_to_oauth() {
        let args = Args::try_parse_from(["tsupload"]).unwrap();
        assert_eq!(args.session.cred, "oauth");
        assert!(args.input.is_empty());
    }

    #[test]
    fn upload_plan_sorts_uploads_and_excludes() {
        let song = |path: &str| LocalSong {
            path: PathBuf::from(path),
            key: path.to_string(),
        };
        let local = LocalLoad {
            included: vec![song("b/two.mp3"), song("a/one.mp3")],
            excluded: vec![PathBuf::from("z/live.mp3"), PathBuf::from("c/demo.mp3")],
            filtered: vec![PathBuf::from("x/skip.mp3")],
        };

        let (files, excluded) = upload_plan(&local);
        assert_eq!(files, vec![PathBuf::from("a/one.mp3"), PathBuf::from("b/two.mp3")]);
        assert_eq!(
            excluded,
            vec![PathBuf::from("c/demo.mp3"), PathBuf::from("z/live.mp3")]
        );
    }
}
