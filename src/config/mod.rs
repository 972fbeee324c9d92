//! Configuration management for floatd
//!
//! Two documents live here:
//! - [`Config`]: the user-facing record (density, window flags, launcher hooks)
//!   persisted as JSON and replaced wholesale over IPC.
//! - [`ServiceSettings`]: daemon wiring (socket, config path, launcher package)
//!   read from TOML at startup.
//!
//! [`ConfigStore`] keeps the current `Config` as an immutable snapshot behind a
//! lock that is only held for the pointer swap, so readers on any thread never
//! wait on disk I/O.

mod settings;

pub use settings::ServiceSettings;

use crate::error::ConfigError;
use crate::host::WindowParams;
use crate::runtime::IoContext;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Completion of a background persist started by [`ConfigStore::replace`]
pub type PersistTask = JoinHandle<()>;

/// User configuration record.
///
/// Field names are camelCase on the wire, matching the settings app. Unknown
/// fields are rejected rather than silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Schema version of the persisted document
    pub version: u32,

    /// Density of the virtual display backing each window
    pub density_dpi: u32,

    /// Window chrome flag bits, passed through to the window host
    pub flags: u32,

    /// Which launcher surfaces get the "open in window" entry points
    pub hook_launcher: HookLauncherConfig,

    /// Press HOME after opening a window from recents
    pub recents_back_home: bool,
}

/// Per-surface launcher hook toggles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct HookLauncherConfig {
    pub hook_recents: bool,
    pub hook_taskbar: bool,
    pub hook_popup: bool,
    pub hook_transient_taskbar: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: Config::VERSION,
            density_dpi: 200,
            flags: 0,
            hook_launcher: HookLauncherConfig::default(),
            recents_back_home: false,
        }
    }
}

impl Default for HookLauncherConfig {
    fn default() -> Self {
        Self {
            hook_recents: true,
            hook_taskbar: true,
            hook_popup: true,
            hook_transient_taskbar: true,
        }
    }
}

impl Config {
    /// Current schema version
    pub const VERSION: u32 = 1;

    /// Parse a JSON document.
    ///
    /// Anything but an object, unknown fields and other schema versions are
    /// rejected.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        let config: Config = serde_json::from_value(value)?;
        if config.version != Self::VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                expected: Self::VERSION,
            });
        }
        Ok(config)
    }

    /// Load the persisted configuration
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Load the persisted configuration, falling back to defaults on any failure.
    ///
    /// A corrupt file is left in place; the next save overwrites it.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("✅ Configuration loaded from: {}", path.display());
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                info!("📝 No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("⚠️ Ignoring configuration at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Window appearance parameters for a new session
    pub fn window_params(&self) -> WindowParams {
        WindowParams {
            density_dpi: self.density_dpi,
            flags: self.flags,
        }
    }

    /// Atomically write the configuration as JSON (temp file + rename)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

struct Snapshot {
    generation: u64,
    config: Arc<Config>,
}

/// Process-wide holder of the current [`Config`]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Snapshot>,
    /// Generation of the newest snapshot already on disk
    written: Arc<Mutex<u64>>,
    io: IoContext,
}

impl ConfigStore {
    /// Load from `path` (defaults on missing or corrupt file)
    pub fn open<P: Into<PathBuf>>(path: P, io: IoContext) -> Self {
        let path = path.into();
        let config = Config::load_or_default(&path);
        debug!("📋 config: {:?}", config);
        Self {
            path,
            current: RwLock::new(Snapshot {
                generation: 0,
                config: Arc::new(config),
            }),
            written: Arc::new(Mutex::new(0)),
            io,
        }
    }

    /// Path of the persisted document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot; cheap, never blocks on I/O
    pub fn current(&self) -> Arc<Config> {
        self.current.read().config.clone()
    }

    /// Serialize the current snapshot
    pub fn current_json(&self) -> String {
        let config = self.current();
        serde_json::to_string(&*config).unwrap_or_else(|e| {
            warn!("⚠️ Failed to serialize configuration: {}", e);
            String::from("{}")
        })
    }

    /// Install `json` as the current configuration and persist it in the background.
    ///
    /// Invalid JSON, a non-object document, unknown fields or a foreign schema
    /// version are rejected and the current configuration stays untouched. When several replaces race, the last one
    /// installed wins both in memory and on disk.
    pub fn replace(&self, json: &str) -> Result<PersistTask, ConfigError> {
        let config = Arc::new(Config::from_json(json)?);

        let generation = {
            let mut current = self.current.write();
            current.generation += 1;
            current.config = config.clone();
            current.generation
        };
        debug!("📝 updateConfig: {:?}", config);

        let path = self.path.clone();
        let written = self.written.clone();
        Ok(self.io.spawn_blocking(move || {
            if let Err(e) = persist(&path, &written, generation, &config) {
                warn!("⚠️ Failed to persist configuration: {}", e);
            }
        }))
    }

    /// Write the current snapshot now unless it is already on disk.
    ///
    /// Blocks the caller. Used at shutdown so a replace whose background
    /// write never got to run is not lost.
    pub fn sync(&self) -> Result<(), ConfigError> {
        let (generation, config) = {
            let current = self.current.read();
            (current.generation, current.config.clone())
        };
        persist(&self.path, &self.written, generation, &config)
    }
}

/// Save `config` unless a snapshot at least as new is already on disk
fn persist(
    path: &Path,
    written: &Mutex<u64>,
    generation: u64,
    config: &Config,
) -> Result<(), ConfigError> {
    let mut written = written.lock();
    if *written >= generation {
        debug!("⏭️ Skipping stale config write (generation {})", generation);
        return Ok(());
    }
    config.save(path)?;
    *written = generation;
    debug!("💾 Configuration persisted to {}", path.display());
    Ok(())
}
