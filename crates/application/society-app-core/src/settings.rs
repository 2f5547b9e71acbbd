use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use society_config::{API_URL_ENV, DEFAULT_API_BASE_URL, STORE_FILENAME};

const QUALIFIER: &str = "com";
const ORG: &str = "society";
const APP: &str = "admin-console";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub api_base_url: String,
    /// Overrides the platform data dir location of the session store.
    pub storage_path: Option<Utf8PathBuf>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_path: None,
        }
    }
}

impl ConsoleSettings {
    /// `SOCIETY_API_URL` wins over the file when set and non-empty.
    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    pub fn store_path(&self) -> Result<Utf8PathBuf> {
        if let Some(path) = &self.storage_path {
            return Ok(path.clone());
        }
        let dirs = project_dirs()?;
        let dir = Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf())
            .map_err(|p| anyhow::anyhow!("Data directory is not UTF-8: {}", p.display()))?;
        Ok(dir.join(STORE_FILENAME))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORG, APP)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// `settings.json` in the platform config dir.
pub struct SettingsFile {
    dir: PathBuf,
}

impl SettingsFile {
    pub fn platform() -> Result<Self> {
        Ok(Self::at(project_dirs()?.config_dir()))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("settings.json")
    }

    /// What the file says, without the env override. Missing file means
    /// defaults.
    pub fn read(&self) -> Result<ConsoleSettings> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConsoleSettings::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Effective settings: the file, then `SOCIETY_API_URL`.
    pub fn load(&self) -> Result<ConsoleSettings> {
        Ok(self
            .read()?
            .with_env_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Replaces `settings.json`. Readers see the old or the new file, never a
    /// partial one.
    pub fn save(&self, settings: &ConsoleSettings) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let mut json = serde_json::to_vec_pretty(settings)?;
        json.push(b'\n');

        let path = self.path();
        let staged = self.dir.join("settings.json.partial");
        write_synced(&staged, &json)
            .with_context(|| format!("Failed to stage {}", staged.display()))?;
        if let Err(e) = fs::rename(&staged, &path) {
            let _ = fs::remove_file(&staged);
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::at(dir.path().join("nested"));
        assert_eq!(file.read().unwrap(), ConsoleSettings::default());
        assert_eq!(file.load().unwrap().storage_path, None);
        assert!(!file.path().exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::at(dir.path());
        fs::write(file.path(), "{ nope").unwrap();
        let err = file.read().unwrap_err();
        assert!(err.to_string().contains("Invalid settings file"));
    }

    #[test]
    fn save_then_read_back_without_tmp_leftover() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::at(dir.path().join("cfg"));
        let settings = ConsoleSettings {
            api_base_url: "https://api.example.test".into(),
            storage_path: Some(Utf8PathBuf::from("/tmp/console.redb")),
        };
        file.save(&settings).unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        let parsed: ConsoleSettings = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, settings);
        assert!(!dir.path().join("cfg/settings.json.partial").exists());

        let mut changed = settings.clone();
        changed.storage_path = None;
        file.save(&changed).unwrap();
        assert_eq!(file.read().unwrap(), changed);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: ConsoleSettings =
            serde_json::from_str(r#"{"storage_path":"/data/s.redb"}"#).unwrap();
        assert_eq!(parsed.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(parsed.store_path().unwrap(), "/data/s.redb");
    }

    #[test]
    fn env_override_replaces_base_url() {
        let settings = ConsoleSettings::default()
            .with_env_override(Some(" https://prod.example/api ".into()));
        assert_eq!(settings.api_base_url, "https://prod.example/api");
        let settings = ConsoleSettings::default().with_env_override(Some("  ".into()));
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }
}
