#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use changes_app::Cli;
use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = changes_app::run(cli).await {
        let code = e.exit_code().code();
        log::error!("{e}");
        log::error!("Terminating with an exit code {code}.");
        std::process::exit(code);
    }
}
