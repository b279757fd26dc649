use std::fmt::Display;
use std::io::{self, Write};

use common::{RemoteSong, SongFields};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

const EMPTY: &str = "<empty>";

/// User-facing output on stdout. Progress is muted by `--quiet`; listings
/// the user asked for are not.
#[derive(Clone, Copy, Debug, Default)]
pub struct Console {
    quiet: bool,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn say(&self, line: impl Display) {
        if !self.quiet {
            println!("{}", line);
        }
    }

    pub fn always(&self, line: impl Display) {
        println!("{}", line);
    }

    /// Prints `text` without a newline and waits for one line of input.
    pub async fn ask<R: AsyncBufRead + Unpin>(
        &self,
        input: &mut R,
        text: &str,
    ) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", text)?;
        stdout.flush()?;
        read_answer(input).await
    }

    pub async fn ask_stdin(&self, text: &str) -> io::Result<Option<String>> {
        let mut input = BufReader::new(tokio::io::stdin());
        self.ask(&mut input, text).await
    }

    pub async fn confirm(&self, text: &str) -> io::Result<bool> {
        Ok(self
            .ask_stdin(&format!("{} (y/n) ", text))
            .await?
            .map(|answer| is_yes(&answer))
            .unwrap_or(false))
    }
}

/// Next line of `input` without its line ending, or `None` at end of input.
pub async fn read_answer<R: AsyncBufRead + Unpin>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

pub fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// `( 7/12)` style counter, padded to the width of `total`.
pub fn progress(num: usize, total: usize) -> String {
    let pad = total.to_string().len();
    format!("({:>pad$}/{})", num, total, pad = pad)
}

fn field_or_empty(song: &RemoteSong, name: &str) -> String {
    song.field(name)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| EMPTY.to_string())
}

/// `title -- artist -- album (id)`
pub fn describe(song: &RemoteSong) -> String {
    format!(
        "{} -- {} -- {} ({})",
        field_or_empty(song, "title"),
        field_or_empty(song, "artist"),
        field_or_empty(song, "album"),
        song.id
    )
}

/// `title _by_ artist _from_ album (id)`
pub fn describe_match(song: &RemoteSong) -> String {
    format!(
        "{} _by_ {} _from_ {} ({})",
        field_or_empty(song, "title"),
        field_or_empty(song, "artist"),
        field_or_empty(song, "album"),
        song.id
    )
}

#[cfg(test)]
mod tests {
    use super::{describe, describe_match, is_yes, progress, read_answer};
    use common::RemoteSong;

    #[test]
    fn pads_progress_to_total_width() {
        assert_eq!(progress(7, 12), "( 7/12)");
        assert_eq!(progress(12, 12), "(12/12)");
        assert_eq!(progress(1, 1), "(1/1)");
    }

    #[test]
    fn describes_songs_with_placeholders() {
        let song = RemoteSong::new("abc")
            .with("title", "Bliss")
            .with("artist", "Muse")
            .with("album", "");
        assert_eq!(describe(&song), "Bliss -- Muse -- <empty> (abc)");
        assert_eq!(describe_match(&song), "Bliss _by_ Muse _from_ <empty> (abc)");
    }

    #[test]
    fn accepts_yes_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" Y\n"));
        assert!(is_yes("yes"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }

    #[tokio::test]
    async fn reads_lines_until_eof() {
        let mut input: &[u8] = b"first\r\nsecond";
        assert_eq!(read_answer(&mut input).await.unwrap().as_deref(), Some("first"));
        assert_eq!(read_answer(&mut input).await.unwrap().as_deref(), Some("second"));
        assert_eq!(read_answer(&mut input).await.unwrap(), None);
    }
}
