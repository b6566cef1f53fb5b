use clap::Parser;
use env_logger::Env;

use blogx_comments::cli::{self, Cli, run_command};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Err(err) = run_command(cli).await {
        eprintln!("{}", cli::error_message(&format!("{:#}", err)));
        std::process::exit(1);
    }
}
