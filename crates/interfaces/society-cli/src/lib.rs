pub mod commands;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use society_app_core::{ConsoleApp, ConsoleSettings, SettingsFile};
use society_core::{BuildingId, Tenant};
use tokio::runtime::Handle;

/// Settings from `settings.json`, then command-line overrides.
pub fn resolve_settings(
    api_url: Option<String>,
    store: Option<Utf8PathBuf>,
) -> Result<ConsoleSettings> {
    let mut settings = SettingsFile::platform()?.load()?;
    if let Some(url) = api_url {
        settings.api_base_url = url;
    }
    if let Some(path) = store {
        settings.storage_path = Some(path);
    }
    Ok(settings)
}

/// Opens the console and restores whatever the last run left behind.
pub fn open_console(settings: &ConsoleSettings) -> Result<ConsoleApp> {
    let mut app = ConsoleApp::from_settings(settings, Handle::current())?;
    app.boot().context("Failed to restore console state")?;
    Ok(app)
}

pub fn tenant_arg(building: Option<&str>) -> Result<Tenant> {
    Ok(match building {
        Some(raw) => Tenant::Building(BuildingId::parse(raw)?),
        None => Tenant::Global,
    })
}
