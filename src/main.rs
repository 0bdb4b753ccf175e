use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use stock_watcher::cli::Cli;
use stock_watcher::scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        if err.use_stderr() {
            let _ = err.print();
            std::process::exit(1);
        }
        err.exit()
    });

    let config = cli.into_config().unwrap_or_else(|err| {
        eprintln!("error: {err}\n");
        eprintln!("{}", Cli::command().render_usage());
        std::process::exit(1)
    });

    scheduler::run(config)
        .await
        .context("stock watcher stopped with an error")?;
    Ok(())
}
