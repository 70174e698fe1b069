//! # ibtesterd — iButton presence tester daemon
//!
//! Composition root that wires the one-wire source and the MQTT transport
//! to the tester core.
//!
//! ## Responsibilities
//! - Parse the command line and load configuration (file, env vars)
//! - Initialize logging
//! - Construct the sysfs device source and the device registry
//! - Connect to the MQTT broker and hand its halves to the dispatcher
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod cli;
mod config;
mod logging;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use ibtester_adapter_w1::SysfsDeviceSource;
use ibtester_app::dispatcher::Dispatcher;
use ibtester_app::publisher::EventPublisher;
use ibtester_app::registry::DeviceRegistry;

use crate::cli::Cli;
use crate::config::Config;

/// How long the MQTT loop gets to flush the DISCONNECT on shutdown.
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config_path()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ibtesterd: {err}");
            if let Some(source) = std::error::Error::source(&err) {
                eprintln!("  caused by: {source}");
            }
            return ExitCode::from(1);
        }
    };

    let directive = cli
        .log_directive()
        .unwrap_or_else(|| config.logging.filter.clone());
    if !logging::init(&directive) {
        tracing::warn!(%directive, fallback = logging::FALLBACK_FILTER, "invalid log filter");
    }
    if cli.config.is_none() && cli.legacy_config.is_some() {
        tracing::warn!("passing the config path as a bare argument is deprecated, use --config");
    }

    let source = SysfsDeviceSource::new(config.w1.devices_dir.clone());
    let registry = DeviceRegistry::new(source, config.w1.filter());

    if cli.dry_run {
        return dry_run(&registry).await;
    }

    serve(config, registry).await
}

async fn dry_run(registry: &DeviceRegistry<SysfsDeviceSource>) -> ExitCode {
    match registry.enumerate().await {
        Ok(devices) => {
            if devices.is_empty() {
                tracing::info!("no devices on the bus");
            }
            for device in &devices {
                tracing::info!(%device, "device present");
            }
            tracing::info!(count = devices.len(), "dry run complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "dry run failed to read the one-wire bus");
            ExitCode::from(1)
        }
    }
}

async fn serve(config: Config, registry: DeviceRegistry<SysfsDeviceSource>) -> ExitCode {
    let (mut link, transport) = match ibtester_adapter_mqtt::build(&config.mqtt) {
        Ok(halves) => halves,
        Err(err) => {
            tracing::error!(%err, "invalid MQTT configuration");
            return ExitCode::from(1);
        }
    };

    if let Err(err) = link.wait_connected().await {
        tracing::error!(
            %err,
            host = %config.mqtt.broker_host,
            port = config.mqtt.broker_port,
            "could not connect to MQTT broker"
        );
        return ExitCode::from(2);
    }

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let mut mqtt_task = tokio::spawn(link.run(commands_tx));

    let dispatcher = Dispatcher::new(
        registry,
        config.test_settings(),
        EventPublisher::new(transport.clone()),
    );
    dispatcher.announce().await;
    tracing::info!(
        command = %config.mqtt.topic_cmd,
        state = %config.mqtt.topic_state,
        "ibtesterd ready"
    );

    tokio::select! {
        () = dispatcher.run(commands_rx) => tracing::warn!("command loop ended"),
        () = shutdown_signal() => tracing::info!("shutdown requested"),
    }

    if let Err(err) = transport.disconnect().await {
        tracing::debug!(%err, "MQTT disconnect failed");
    }
    if tokio::time::timeout(DISCONNECT_GRACE, &mut mqtt_task).await.is_err() {
        mqtt_task.abort();
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
