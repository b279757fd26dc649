use std::process::ExitCode;

use cli::commands::upload::{run, Args};

fn main() -> ExitCode {
    cli::launch::<Args, _, _>(run)
}
