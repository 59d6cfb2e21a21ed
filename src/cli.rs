use clap::{Parser, Subcommand};
use gmgnwatch::config::AppConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "gmgnwatch", version, about = "GMGN trending token tracker")]
pub struct Cli {
    /// Directory for latest.json and the gmgn_data_*.json history
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Alert when the 24h change is above this percentage
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub alert_threshold: Option<f64>,

    /// Dashboard "pumping" count uses this percentage
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub pumping_threshold: Option<f64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Collect once, save the snapshot and print alerts
    Collect,
    /// Start the web dashboard on the first free port
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port_start: Option<u16>,
        #[arg(long)]
        port_end: Option<u16>,
    },
    /// Collect now and then on a fixed interval until Ctrl+C
    Monitor {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// List saved snapshot files
    Files,
    /// Interactive menu (default)
    Menu,
}

impl Cli {
    /// Layers command-line flags over `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(threshold) = self.alert_threshold {
            config.alert_threshold = threshold;
        }
        if let Some(threshold) = self.pumping_threshold {
            config.pumping_threshold = threshold;
        }
        match &self.command {
            Some(Command::Serve {
                bind,
                port_start,
                port_end,
            }) => {
                if let Some(bind) = bind {
                    config.bind = bind.clone();
                }
                if let Some(start) = port_start {
                    config.port_start = *start;
                }
                if let Some(end) = port_end {
                    config.port_end = *end;
                }
            }
            Some(Command::Monitor {
                interval_secs: Some(secs),
            }) => config.interval = Duration::from_secs(*secs),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "gmgnwatch",
            "--data-dir",
            "/tmp/gmgn",
            "--alert-threshold",
            "12.5",
            "monitor",
            "--interval-secs",
            "60",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.data_dir, PathBuf::from("/tmp/gmgn"));
        assert_eq!(config.alert_threshold, 12.5);
        assert_eq!(config.pumping_threshold, 20.0);
        assert_eq!(config.interval, Duration::from_secs(60));
    }

    #[test]
    fn no_subcommand_means_menu() {
        let cli = Cli::parse_from(["gmgnwatch"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_flags_set_port_range() {
        let cli = Cli::parse_from(["gmgnwatch", "serve", "--port-start", "8000", "--port-end", "8010"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.port_range(), 8000..=8010);
    }
}
