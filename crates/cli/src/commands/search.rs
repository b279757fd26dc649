use clap::Parser;
use library::load_remote;

use crate::args::{CommandArgs, FilterArgs, OutputArgs, SessionArgs};
use crate::commands::{report_remote, sort_songs};
use crate::console::{describe_match, Console};
use crate::session::{connect, finish};

/// Search the remote library with include/exclude filters.
#[derive(Parser, Debug)]
#[command(name = "tssearch", version)]
pub struct Args {
    /// Show results without asking first
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

    console.say("Scanning for songs...\n");
    let load = load_remote(&session, &filter).await?;
    report_remote(&console, &load);
    let mut songs = load.included;
    sort_songs(&mut songs);

    if songs.is_empty() {
        console.say("No songs found matching query\n");
    } else {
        let prompt = format!("Display {} results?", songs.len());
        if args.yes || console.confirm(&prompt).await? {
            console.always("");
            for song in &songs {
                console.always(describe_match(song));
            }
        }
    }

    finish(&mut session).await;
    console.say("\nAll done!");
    Ok(())
}
