//! Byzantium node configuration daemon.
//!
//! Run once at boot. Settings come from the TOML file named by
//! `BYZANTIUM_CONFIG` (default `/etc/byzantium/configd.toml`); a missing
//! file means built-in defaults. The process always exits successfully so
//! the init system carries on booting; failures are in the log.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use byzantium_common::settings::DEFAULT_SETTINGS_PATH;
use byzantium_common::Settings;
use byzantium_configd::addr::{AddressAllocator, ArpingProbe};
use byzantium_configd::fs::HostFiles;
use byzantium_configd::link::{IwconfigDriver, LinkConfigurator};
use byzantium_configd::net::SysfsDevices;
use byzantium_configd::shell::SystemShell;
use byzantium_configd::{NodeOrchestrator, NodeReport};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match std::panic::catch_unwind(run) {
        Ok(Ok(report)) if !report.is_complete() => {
            tracing::warn!(failed = ?report.failed_steps(), "bring-up incomplete");
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::error!(error = %format!("{e:#}"), "node bring-up failed"),
        Err(_) => tracing::error!("node bring-up panicked"),
    }

    ExitCode::SUCCESS
}

fn run() -> anyhow::Result<NodeReport> {
    let path = std::env::var_os("BYZANTIUM_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = Settings::load(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;

    tracing::info!(
        settings = %path.display(),
        essid = %settings.mesh.essid,
        channel = settings.mesh.channel,
        spectrum = %settings.mesh.spectrum,
        "byzantium-configd starting"
    );

    let shell = SystemShell;
    let devices = SysfsDevices::default();
    let configurator = LinkConfigurator::new(IwconfigDriver::new(shell, &settings));
    let mut allocator = AddressAllocator::new(
        ArpingProbe::new(shell, &settings),
        rand::rng(),
        settings.configd.max_probe_attempts,
    );

    let report = NodeOrchestrator::new(
        &settings,
        &devices,
        &configurator,
        &mut allocator,
        &shell,
        &HostFiles,
    )
    .run()?;

    tracing::info!(
        mesh = %report.mesh.device,
        mesh_address = ?report.mesh.assigned_address,
        client = %report.client.device,
        client_address = ?report.client.assigned_address,
        "bring-up finished"
    );
    Ok(report)
}
