use std::process::ExitCode;

use cli::commands::sync::{run, Args};

fn main() -> ExitCode {
    cli::launch::<Args, _, _>(run)
}
