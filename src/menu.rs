use gmgnwatch::config::AppConfig;
use gmgnwatch::WatchError;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Collect,
    Dashboard,
    Monitor,
    Files,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Collect),
            "2" => Some(Self::Dashboard),
            "3" => Some(Self::Monitor),
            "4" => Some(Self::Files),
            "5" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Human wording for the monitor interval, e.g. "every 10 minutes".
fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    let (count, unit) = if secs > 0 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs > 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    match count {
        1 => format!("every {}", unit),
        n => format!("every {} {}s", n, unit),
    }
}

fn show_menu(config: &AppConfig) {
    println!("{}", "=".repeat(50));
    println!("GMGN Tracker");
    println!("{}", "=".repeat(50));
    println!("1. Collect once");
    println!("2. Start web dashboard");
    println!(
        "3. Start monitoring ({})",
        describe_interval(config.interval)
    );
    println!("4. List data files");
    println!("5. Exit");
    println!("{}", "=".repeat(50));
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

/// Next input line; `None` on end of input or Ctrl+C.
async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>, WatchError> {
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        _ = tokio::signal::ctrl_c() => {
            println!();
            Ok(None)
        }
    }
}

pub async fn run(config: &AppConfig) -> Result<(), WatchError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        show_menu(config);
        prompt("Select (1-5): ");
        let Some(input) = read_line(&mut lines).await? else {
            break;
        };

        let outcome = match MenuChoice::parse(&input) {
            Some(MenuChoice::Collect) => {
                commands::collect(config);
                Ok(())
            }
            Some(MenuChoice::Dashboard) => commands::serve(config).await,
            Some(MenuChoice::Monitor) => {
                commands::monitor(config).await;
                Ok(())
            }
            Some(MenuChoice::Files) => commands::list_files(config),
            Some(MenuChoice::Exit) => break,
            None => {
                println!("Invalid choice '{}'. Enter a number from 1 to 5.", input.trim());
                Ok(())
            }
        };
        if let Err(e) = outcome {
            println!("Error: {}", e);
        }

        prompt("\nPress Enter to continue...");
        if read_line(&mut lines).await?.is_none() {
            break;
        }
    }

    println!("Bye.");
    Ok(())
}
