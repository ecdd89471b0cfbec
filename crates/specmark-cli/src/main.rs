//! Command line front end for specification tooling.
//!
//! `specmark` classifies documents, lists runnable test cases, executes them
//! through an engine command, and resolves individual steps against a
//! running engine process.

use tracing::debug;

mod cli;
mod logging;
mod output;

fn main() -> eyre::Result<()> {
    logging::init();
    debug!(version = env!("CARGO_PKG_VERSION"), "starting specmark");
    cli::run()
}
