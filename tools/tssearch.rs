use std::process::ExitCode;

use cli::commands::search::{run, Args};

fn main() -> ExitCode {
    cli::launch::<Args, _, _>(run)
}
