mod cli;
mod commands;
mod menu;

use clap::Parser;
use cli::{Cli, Command};
use env_logger::Builder;
use gmgnwatch::config::AppConfig;
use log::{info, LevelFilter};
use std::error::Error;
use std::io::Write;

fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("gmgnwatch", LevelFilter::Debug)
        .parse_default_env() // RUST_LOG wins over the defaults above
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr) // stdout is for tables and the menu
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_logger();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    info!("Data directory: {}", config.data_dir.display());

    match cli.command.clone().unwrap_or(Command::Menu) {
        Command::Collect => {
            commands::collect(&config);
        }
        Command::Serve { .. } => commands::serve(&config).await?,
        Command::Monitor { .. } => commands::monitor(&config).await,
        Command::Files => commands::list_files(&config)?,
        Command::Menu => menu::run(&config).await?,
    }

    Ok(())
}
