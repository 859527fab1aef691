//! MCU Bridge
//!
//! Connects to a Mackie Control surface, keeps the mixer state model in sync
//! with it, echoes mode changes back to the surface and logs what it reports.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcu_bridge::config::AppConfig;
use mcu_bridge::mcu::{self, MidiInputPort, MidiOutputPort};
use mcu_bridge::mixer::{ChangeCoalescer, ChangeKind};
use mcu_bridge::paths::AppPaths;
use mcu_bridge::settings::{ColorRole, SettingsEngine};
use mcu_bridge::{BridgeContext, McuDecoder, McuEncoder, SurfaceEvent};

/// MCU Bridge - Mackie Control surface to DAW mixer bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// Print the resolved parameter settings of a device as JSON
    #[arg(long, value_name = "DEVICE")]
    dump_settings: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    if args.list_ports {
        list_ports_formatted();
        return Ok(());
    }

    let paths = AppPaths::detect();
    let config_path = args.config.clone().unwrap_or_else(|| paths.config.clone());
    let config = if config_path.exists() {
        info!("Configuration file: {}", config_path.display());
        AppConfig::load(&config_path).await?
    } else {
        info!(
            "No configuration at {}, using defaults",
            config_path.display()
        );
        AppConfig::default()
    };

    let settings_path = config
        .settings
        .path
        .clone()
        .unwrap_or_else(|| paths.settings.clone());
    let settings = Arc::new(
        SettingsEngine::load(&settings_path).context("Failed to load parameter settings")?,
    );

    if let Some(device) = &args.dump_settings {
        dump_settings(&settings, device)?;
        return Ok(());
    }

    info!("Starting MCU Bridge v{}...", env!("CARGO_PKG_VERSION"));
    run(config, settings, shutdown_signal()).await?;

    info!("MCU Bridge shutdown complete");
    Ok(())
}

async fn run(
    config: AppConfig,
    settings: Arc<SettingsEngine>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let coalescer = Arc::new(ChangeCoalescer::new(
        config.notify.data_window(),
        config.notify.value_window(),
    ));
    let ctx = Arc::new(BridgeContext::new(
        config.protocol,
        Arc::clone(&coalescer),
        settings,
    ));

    {
        let ctx = Arc::clone(&ctx);
        coalescer.subscribe(move |kind| {
            let channels = ctx.registry().snapshot_all();
            match kind {
                ChangeKind::Data => debug!(
                    "Data changed: {}",
                    channels
                        .iter()
                        .map(|c| c.label.as_str())
                        .collect::<Vec<_>>()
                        .join(" | ")
                ),
                ChangeKind::Value => debug!(
                    "Values changed: {}",
                    channels
                        .iter()
                        .map(|c| format!("{:.3}", c.value))
                        .collect::<Vec<_>>()
                        .join(" ")
                ),
            }
        });
    }
    let ticker = coalescer.spawn_ticker(config.notify.tick_period());

    let mut output = MidiOutputPort::new();
    if !config.midi.output_port.is_empty() {
        output.set_device(&config.midi.output_port);
    }

    let (tx, mut rx) = mpsc::channel(1000);
    let _input = if config.midi.input_port.is_empty() {
        warn!("No MIDI input port configured; waiting for shutdown");
        None
    } else {
        Some(MidiInputPort::connect(&config.midi.input_port, tx)?)
    };

    let encoder = McuEncoder::new(config.protocol);
    let decoder = McuDecoder::new(Arc::clone(&ctx));
    tokio::pin!(shutdown);

    info!("Bridge running. Press Ctrl+C to exit.");
    loop {
        tokio::select! {
            Some(message) = rx.recv() => {
                for event in decoder.handle(&message) {
                    if let SurfaceEvent::FocusDeviceChanged { text } = &event {
                        let device = ctx.set_focus(text);
                        let manufacturer = ctx.settings().manufacturer_name(&device);
                        info!("Focused device '{}' ({})", device, manufacturer);
                    }
                    if let Some(feedback) = encoder.feedback(&event) {
                        output.send(&feedback);
                    }
                    info!("{}", event);
                }
            }
            _ = &mut shutdown => break,
        }
    }

    ticker.abort();
    Ok(())
}

fn dump_settings(settings: &SettingsEngine, device_name: &str) -> Result<()> {
    let device = settings.resolve_device(device_name);

    let params: Vec<serde_json::Value> = device
        .params()
        .map(|setting| {
            let resolved = settings.resolve(device_name, &setting.name, false, 0, 0);
            serde_json::json!({
                "name": setting.name,
                "source": format!("{:?}", resolved.source()),
                "label": resolved.label(),
                "display_label": resolved.display_label(false),
                "label_on": resolved.label_on(),
                "mode": resolved.mode(),
                "on_color": resolved.color(ColorRole::On),
                "off_color": resolved.color(ColorRole::Off),
                "text_on_color": resolved.color(ColorRole::TextOn),
                "text_off_color": resolved.color(ColorRole::TextOff),
                "bar_on_color": resolved.color(ColorRole::BarOn),
                "dial_steps": resolved.dial_steps(),
                "max_value_precision": resolved.max_value_precision(),
                "user_menu_items": resolved.user_menu_items(),
                "hide_value_bar": resolved.hide_value_bar(),
                "linked_parameter": resolved.linked_parameter(),
            })
        })
        .collect();

    let dump = serde_json::json!({
        "device": device.name,
        "manufacturer": device.manufacturer_name,
        "user_pages": device.user_page_names,
        "params": params,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&dump).context("Failed to format settings")?
    );
    Ok(())
}

fn list_ports_formatted() {
    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    for (title, ports) in [
        ("Input Ports:", mcu::list_input_ports()),
        ("Output Ports:", mcu::list_output_ports()),
    ] {
        println!("\n{}", title.bold());
        match ports {
            Ok(names) if names.is_empty() => println!("  {}", "No ports found".dimmed()),
            Ok(names) => {
                for name in names {
                    println!("  {}", name.green());
                }
            }
            Err(e) => println!("  {} {}", "Error:".red(), e),
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
