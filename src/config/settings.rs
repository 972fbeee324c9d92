use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Daemon wiring read from TOML at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceSettings {
    /// Unix socket the IPC server listens on
    pub socket_path: PathBuf,

    /// Location of the persisted user configuration (JSON)
    pub config_path: PathBuf,

    /// Display whose foreground task "current to window" converts
    pub primary_display: i32,

    /// Package of the system launcher; its tasks are never turned into windows
    pub launcher_package: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/floatd.sock"),
            config_path: PathBuf::from("/data/system/floatd.json"),
            primary_display: 0,
            launcher_package: "com.android.launcher3".to_string(),
        }
    }
}

/// Expand a leading `~` to `$HOME`
pub(crate) fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Ok(Path::new(&home).join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

impl ServiceSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_home(path.as_ref())?;

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let mut settings: ServiceSettings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        settings.socket_path = expand_home(&settings.socket_path)?;
        settings.config_path = expand_home(&settings.config_path)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            anyhow::bail!("Invalid socket_path: must not be empty");
        }
        if self.launcher_package.trim().is_empty() {
            anyhow::bail!("Invalid launcher_package: must not be empty");
        }
        Ok(())
    }

    /// Save settings to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, contents).context("Failed to write settings file")?;
        Ok(())
    }
}
