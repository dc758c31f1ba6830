// In app/src/main.rs

use anyhow::Result;
use app_config::Settings;
use clap::{Parser, Subcommand};
use device::{DeviceSink, SerialSink};
use engine::{Shutdown, ShutdownTrigger, Tracker};
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Relays a short-term crypto price trend to a serial status lamp.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Polls the price and drives the lamp until interrupted.
    Run {
        /// Serial port of the lamp (e.g., "/dev/ttyUSB0", "COM3").
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate of the serial link.
        #[arg(short, long)]
        baud: Option<u32>,

        /// Seconds between price checks.
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Lists the serial ports found on this machine.
    Ports,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let mut settings = app_config::load_settings()?;
    init_tracing(&settings.app.log_level);

    match cli.command {
        Commands::Run { port, baud, interval } => {
            apply_overrides(&mut settings, port, baud, interval);
            settings.validate()?;
            run_tracker(settings).await?;
        }
        Commands::Ports => {
            handle_ports()?;
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    let level = log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new()
            .with_target("hyper", tracing::Level::WARN)
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();
}

fn apply_overrides(settings: &mut Settings, port: Option<String>, baud: Option<u32>, interval: Option<u64>) {
    if let Some(port) = port {
        settings.device.port = port;
    }
    if let Some(baud) = baud {
        settings.device.baud_rate = baud;
    }
    if let Some(interval) = interval {
        settings.tracker.poll_interval_secs = interval;
    }
}

// --- "Run" Subcommand Logic ---

/// Connects to the lamp and runs the tracker until Ctrl+C.
///
/// A device that cannot be opened is fatal and surfaces as an error (non-zero
/// exit). A user interrupt is a clean exit.
async fn run_tracker(settings: Settings) -> Result<()> {
    tracing::info!("=== Moonlamp Price Tracker ===");

    let (trigger, mut shutdown) = Shutdown::new();
    tokio::spawn(listen_for_shutdown(trigger));

    // --- 1. Connecting ---
    tracing::info!(port = %settings.device.port, "Connecting to lamp...");
    let mut sink = match SerialSink::connect(&settings.device) {
        Ok(sink) => sink,
        Err(e) => {
            report_connection_error(&e, &settings.device.port);
            return Err(e.into());
        }
    };

    // The board resets when the port opens; give it a moment before the first write.
    tokio::select! {
        _ = tokio::time::sleep(settings.device.settle_delay()) => {}
        _ = shutdown.wait() => {
            if let Err(e) = sink.close().await {
                tracing::warn!(error = %e, "Failed to release device cleanly.");
            }
            tracing::info!("Goodbye!");
            return Ok(());
        }
    }
    tracing::info!(port = %sink.port(), "Connected to lamp!");

    // --- 2. Running ---
    let source = api_client::new(&settings.price_source)?;
    let mut tracker = Tracker::new(source, sink, &settings.tracker);
    tracker.run(shutdown).await;

    tracing::info!("Goodbye!");
    Ok(())
}

async fn listen_for_shutdown(trigger: ShutdownTrigger) {
    shutdown_signal().await;
    tracing::info!("Shutting down...");
    trigger.trigger();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn report_connection_error(error: &device::Error, port: &str) {
    if !error.is_not_found() {
        tracing::error!(port, error = %error, "Error opening serial device.");
        return;
    }

    tracing::error!(port, error = %error, "Serial connection error.");
    eprintln!("\nTips:");
    eprintln!("1. Make sure the lamp's board is connected via USB");
    eprintln!("2. Run `moonlamp ports` to list serial ports (or check Device Manager on Windows)");
    eprintln!("3. Close any serial monitor that is holding the port open");
    eprintln!("4. Pass --port, or set device.port / APP__DEVICE__PORT, to match the board's port");
}

// --- "Ports" Subcommand Logic ---

fn handle_ports() -> Result<()> {
    let ports = device::list_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    println!("\n--- Serial Ports ---");
    for port in &ports {
        println!("  {:<24} {}", port.name, port.description);
    }
    println!("--------------------");

    Ok(())
}
