use std::path::PathBuf;

use clap::{Args, Parser};
use library::{exclude_regex, FilterError, FilterSet, ScanOptions, SongFilter};

/// Implemented by every tool's argument struct so the launcher can set up
/// output before running it.
pub trait CommandArgs: Parser {
    fn output(&self) -> &OutputArgs;
}

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Name of the stored credential file, without extension
    #[arg(short = 'c', long = "cred", value_name = "NAME", default_value = "oauth")]
    pub cred: String,

    /// Uploader id reported to the server
    #[arg(short = 'U', long = "uploader-id", value_name = "ID", env = "TUNESYNC_UPLOADER_ID")]
    pub uploader_id: Option<String>,

    /// Configuration file (defaults to $TUNESYNC_CONFIG or the user config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Log debug output to stderr
    #[arg(short = 'l', long = "log")]
    pub log: bool,

    /// Don't print progress; dry-run listings still print
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep only songs matching field:pattern (artist, title, album, album_artist)
    #[arg(short = 'f', long = "include-filter", value_name = "FILTER")]
    pub include: Vec<String>,

    /// Drop songs matching field:pattern
    #[arg(id = "exclude_filter", short = 'F', long = "exclude-filter", value_name = "FILTER")]
    pub exclude: Vec<String>,

    /// Require every include filter to match
    #[arg(short = 'a', long = "all-includes")]
    pub all_includes: bool,

    /// Require every exclude filter to match
    #[arg(short = 'A', long = "all-excludes")]
    pub all_excludes: bool,
}

impl FilterArgs {
    pub fn song_filter(&self) -> Result<SongFilter, FilterError> {
        Ok(SongFilter::new(
            FilterSet::parse(&self.include, self.all_includes)?,
            FilterSet::parse(&self.exclude, self.all_excludes)?,
        ))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Skip local paths matching this regex
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Descend at most this many directory levels below each input
    #[arg(long = "max-depth", value_name = "DEPTH", conflicts_with = "no_recursion")]
    pub max_depth: Option<usize>,

    /// Only look at files directly inside each input
    #[arg(short = 'R', long = "no-recursion")]
    pub no_recursion: bool,
}

impl ScanArgs {
    pub fn max_depth(&self) -> Option<usize> {
        if self.no_recursion {
            Some(0)
        } else {
            self.max_depth
        }
    }

    pub fn scan_options(&self, filter: SongFilter) -> Result<ScanOptions, regex::Error> {
        Ok(ScanOptions {
            exclude: exclude_regex(&self.exclude)?,
            max_depth: self.max_depth(),
            filter,
        })
    }
}

/// Inputs default to the current directory.
pub fn inputs_or_cwd(inputs: &[PathBuf]) -> Vec<PathBuf> {
    if inputs.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        inputs.to_vec()
    }
}
