use gmgnwatch::api::gmgn::MockCollector;
use gmgnwatch::config::AppConfig;
use gmgnwatch::core::pipeline::{Pipeline, PipelineReport};
use gmgnwatch::core::store::{PersistResult, SnapshotStore};
use gmgnwatch::scheduler::Scheduler;
use gmgnwatch::ui::server::{self, bind_free_port, DashboardState, UpdateCommand};
use gmgnwatch::WatchError;
use log::{error, info};
use std::sync::Arc;

fn pipeline(config: &AppConfig) -> Pipeline<MockCollector> {
    Pipeline::new(
        MockCollector::new(),
        SnapshotStore::new(&config.data_dir),
        config.alert_threshold,
    )
}

/// One collection. A failed save is printed and logged, and alerts are still shown.
pub fn collect(config: &AppConfig) -> PipelineReport {
    println!("{}", "=".repeat(50));
    println!("GMGN Tracker - single collection");
    println!("{}", "=".repeat(50));

    let report = pipeline(config).run();
    print_report(&report);
    report
}

fn print_report(report: &PipelineReport) {
    if report.is_empty() {
        println!("No data collected this cycle.");
        return;
    }

    println!(
        "{:<10} {:<18} {:>14} {:>9} {:>16} {:>16}",
        "Symbol", "Name", "Price(USD)", "24h%", "MktCap(USD)", "Volume(USD)"
    );
    println!("{}", "-".repeat(88));
    for token in report.snapshot.tokens() {
        println!(
            "{:<10} {:<18} {:>14.6} {:>9} {:>16.0} {:>16.0}",
            token.symbol,
            token.name,
            token.price,
            format!("{:+.1}", token.change_24h),
            token.market_cap,
            token.volume_24h,
        );
    }

    match &report.persisted {
        Some(PersistResult::Saved { history, .. }) => println!("\nSaved: {}", history.display()),
        Some(PersistResult::Failed(e)) => println!("\nSave failed: {}", e),
        None => {}
    }

    println!("\nPump alerts:");
    if report.alerts.is_empty() {
        println!("  No tokens are pumping right now.");
    }
    for alert in &report.alerts {
        println!("  {}", alert);
    }

    println!("\nCollected tokens: {}", report.snapshot.len());
    println!("Alerts: {}", report.alerts.len());
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn serve(config: &AppConfig) -> Result<(), WatchError> {
    let (listener, port) = bind_free_port(&config.bind, config.port_range()).await?;
    let state = Arc::new(DashboardState::new(
        SnapshotStore::new(&config.data_dir),
        config.alert_threshold,
        config.pumping_threshold,
        UpdateCommand::current_exe(&config.data_dir, config.alert_threshold)?,
    ));

    info!("Dashboard listening on {}:{}", config.bind, port);
    println!("Dashboard: http://localhost:{}", port);
    println!("Press Ctrl+C to stop.");
    server::serve(listener, state, shutdown_signal()).await
}

pub async fn monitor(config: &AppConfig) {
    println!(
        "Monitoring every {} seconds. Press Ctrl+C to stop.",
        config.interval.as_secs()
    );
    Scheduler::new(Arc::new(pipeline(config)), config.interval)
        .run()
        .await;
}

pub fn list_files(config: &AppConfig) -> Result<(), WatchError> {
    let files = SnapshotStore::new(&config.data_dir).list_files()?;
    println!("\nSnapshot files in {}:", config.data_dir.display());
    if files.is_empty() {
        println!("  No data files yet. Run a collection first.");
    }
    for file in &files {
        println!("  {} ({} bytes)", file.name, file.size);
    }
    println!();
    Ok(())
}
