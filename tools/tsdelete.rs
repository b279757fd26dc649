use std::process::ExitCode;

use cli::commands::delete::{run, Args};

fn main() -> ExitCode {
    cli::launch::<Args, _, _>(run)
}
