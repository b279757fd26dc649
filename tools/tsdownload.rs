use std::process::ExitCode;

use cli::commands::download::{run, Args};

fn main() -> ExitCode {
    cli::launch::<Args, _, _>(run)
}
