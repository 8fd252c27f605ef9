#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use clap::Parser;
use missive::{Cli, Missive, prompt::Prompter};
use missive_common::logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());
    missive_smtp::base64::init();

    let missive = Missive::from_cli(&cli)?;

    let message = Prompter::new(std::io::stdin().lock(), std::io::stdout())
        .collect(cli.draft(), missive.limits())?;

    // One connection, one task: no need for more than the current thread.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(missive.run(message))
}
