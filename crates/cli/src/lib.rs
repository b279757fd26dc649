pub mod args;
pub mod commands;
pub mod config;
pub mod console;
pub mod logging;
pub mod session;
pub mod transfer;

#[cfg(test)]
mod testing;

use std::future::Future;
use std::process::ExitCode;

use tracing::error;

use crate::args::CommandArgs;

const INTERRUPTED: u8 = 130;

/// Parses arguments, sets up logging and drives `run` to completion on a
/// single-threaded runtime. Ctrl-C abandons the remaining work.
pub fn launch<A, F, Fut>(run: F) -> ExitCode
where
    A: CommandArgs,
    F: FnOnce(A) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let args = A::parse();
    logging::init(args.output());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(async move {
        tokio::select! {
            result = run(args) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    });
    // Pending stdin reads would otherwise hold up shutdown.
    runtime.shutdown_background();

    match outcome {
        Some(Ok(())) => ExitCode::SUCCESS,
        Some(Err(err)) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
        None => {
            eprintln!("\nExiting");
            ExitCode::from(INTERRUPTED)
        }
    }
}
