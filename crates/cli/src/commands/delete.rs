use clap::Parser;
use library::load_remote;

use crate::args::{CommandArgs, FilterArgs, OutputArgs, SessionArgs};
use crate::commands::{list_songs, report_remote, sort_songs};
use crate::console::Console;
use crate::session::{connect, finish};
use crate::transfer::delete_songs;

/// Delete songs from the remote library.
#[derive(Parser, Debug)]
#[command(name = "tsdelete", version)]
pub struct Args {
    /// List what would be deleted without deleting
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Delete without asking for confirmation
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

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

pub async fn run(args: Args) -> anyhow::Result<()> {
    let console = Console::new(args.output.quiet);
    let filter = args.filters.song_filter()?;
    let (mut session, _) = connect(&args.session, &console).await?;

    console.say("Loading remote songs...");
    let load = load_remote(&session, &filter).await?;
    report_remote(&console, &load);
    let mut songs = load.included;
    sort_songs(&mut songs);

    if songs.is_empty() {
        console.say("No songs to delete");
    } else if args.dry_run {
        console.say(format!("Found {} songs to delete", songs.len()));
        list_songs(&console, "Songs to delete", &songs);
    } else {
        let prompt = format!(
            "Are you sure you want to delete {} song(s) from the remote library?",
            songs.len()
        );
        if args.yes || console.confirm(&prompt).await? {
            console.say(format!("\nDeleting {} song(s)\n", songs.len()));
            let report = delete_songs(&session, &songs, &console).await;
            report.print_summary(&console);
        } else {
            console.say("\nNo songs deleted.");
        }
    }

    finish(&mut session).await;
    console.say("\nAll done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn parses_filters_and_confirmation() {
        let args =
            Args::try_parse_from(["tsdelete", "-y", "-f", "artist:nickelback", "-d"]).unwrap();
        assert!(args.yes);
        assert!(args.dry_run);
        assert_eq!(args.filters.include, vec!["artist:nickelback".to_string()]);
        assert!(args.filters.song_filter().is_ok());
    }
}
