//! Configuration management for the aurad daemon.
//!
//! Handles loading, parsing, and validation of the YAML configuration file
//! that describes where the lighting chip lives and how the daemon is
//! published on D-Bus. Every field has a default, so the file is optional.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

/// Main configuration structure for the aurad daemon.
///
/// # Example
///
/// ```yaml
/// version: 1
/// device:
///   adapter_prefix: "NVIDIA i2c adapter 1"
///   chip_address: 0x29
///   registers: { red: 0x04, green: 0x05, blue: 0x06, mode: 0x07 }
/// dbus:
///   bus: system
///   name: NeuroticTumbleweed.Aura
///   path: /Aura
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for compatibility checking.
    pub version: u8,

    /// Location of the lighting chip.
    #[serde(default)]
    pub device: DeviceConfig,

    /// D-Bus publication settings.
    #[serde(default)]
    pub dbus: DbusConfig,
}

/// Immutable description of the lighting chip and how to discover its bus.
///
/// Injected into [`LightingController`](crate::lighting::LightingController)
/// at construction; nothing reads these values from globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Prefix of the I2C adapter name that carries the chip.
    pub adapter_prefix: String,

    /// 7-bit address of the lighting controller.
    pub chip_address: u8,

    /// Data registers of the chip.
    pub registers: RegisterMap,

    /// Live mount table used to find sysfs.
    pub mounts_path: PathBuf,

    /// Sysfs mount point used when the mount table has no sysfs entry.
    pub sysfs_default: PathBuf,

    /// Directory holding the `i2c-<N>` character devices.
    pub dev_dir: PathBuf,
}

/// Register addresses of the four data registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMap {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub mode: u8,
}

/// Which message bus the daemon is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

/// D-Bus publication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbusConfig {
    /// Bus to connect to.
    pub bus: BusKind,

    /// Well-known name requested on the bus.
    pub name: String,

    /// Object path the interface is served at.
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            device: DeviceConfig::default(),
            dbus: DbusConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adapter_prefix: defaults::ADAPTER_PREFIX.to_string(),
            chip_address: defaults::CHIP_ADDRESS,
            registers: RegisterMap::default(),
            mounts_path: PathBuf::from(defaults::MOUNTS_PATH),
            sysfs_default: PathBuf::from(defaults::SYSFS_DEFAULT),
            dev_dir: PathBuf::from(defaults::DEV_DIR),
        }
    }
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            red: 0x04,
            green: 0x05,
            blue: 0x06,
            mode: 0x07,
        }
    }
}

impl Default for DbusConfig {
    fn default() -> Self {
        Self {
            bus: BusKind::default(),
            name: defaults::DBUS_NAME.to_string(),
            path: defaults::DBUS_PATH.to_string(),
        }
    }
}

impl Config {
    /// Validates the configuration for consistency.
    ///
    /// ```no_run
    /// use aurad::config::Config;
    ///
    /// let config = Config::default();
    /// config.validate()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            anyhow::bail!("Unsupported config version {}", self.version);
        }
        self.device.validate()?;

        if self.dbus.name.is_empty() {
            anyhow::bail!("D-Bus name cannot be empty");
        }
        if !self.dbus.path.starts_with('/') {
            anyhow::bail!("D-Bus object path '{}' must be absolute", self.dbus.path);
        }
        Ok(())
    }
}

impl DeviceConfig {
    fn validate(&self) -> Result<()> {
        if self.adapter_prefix.is_empty() {
            anyhow::bail!("Adapter prefix cannot be empty");
        }
        if self.chip_address > 0x7F {
            anyhow::bail!(
                "Chip address {:#04x} does not fit in 7 bits",
                self.chip_address
            );
        }

        let regs = self.registers;
        let distinct: HashSet<u8> = [regs.red, regs.green, regs.blue, regs.mode]
            .into_iter()
            .collect();
        if distinct.len() != 4 {
            anyhow::bail!("Registers must be distinct, got {regs:?}");
        }
        Ok(())
    }
}

mod defaults {
    pub const ADAPTER_PREFIX: &str = "NVIDIA i2c adapter 1";
    pub const CHIP_ADDRESS: u8 = 0x29;
    pub const MOUNTS_PATH: &str = "/proc/mounts";
    pub const SYSFS_DEFAULT: &str = "/sys";
    pub const DEV_DIR: &str = "/dev";
    pub const DBUS_NAME: &str = "NeuroticTumbleweed.Aura";
    pub const DBUS_PATH: &str = "/Aura";
}

fn locate_config() -> Option<PathBuf> {
    if let Ok(env_path) = env::var("AURAD_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    if let Some(mut cfg_dir) = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| Path::new(&h).join(".config")))
    {
        cfg_dir.push("aurad/config.yml");
        if cfg_dir.exists() {
            return Some(cfg_dir);
        }
    }

    let etc = Path::new("/etc/aurad/config.yml");
    etc.exists().then(|| etc.to_path_buf())
}

/// Holds the loaded configuration together with the file it came from.
///
/// # Example
///
/// ```no_run
/// use aurad::config::ConfigManager;
///
/// let manager = ConfigManager::load(None)?;
/// println!("chip at {:#04x}", manager.get().device.chip_address);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Config,
    path: Option<PathBuf>,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the given config and origin.
    pub fn new(config: Config, path: Option<PathBuf>) -> Self {
        Self { config, path }
    }

    /// Loads configuration from file or standard locations.
    ///
    /// Searches for configuration in the following order:
    /// 1. Provided path parameter
    /// 2. AURAD_CONFIG environment variable
    /// 3. XDG_CONFIG_HOME/aurad/config.yml or ~/.config/aurad/config.yml
    /// 4. /etc/aurad/config.yml
    ///
    /// Falls back to built-in defaults when no file is found.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let Some(config_path) = path.or_else(locate_config) else {
            info!("No config file found, using built-in defaults");
            return Ok(Self::new(Config::default(), None));
        };

        info!("Loading config from: {}", config_path.display());
        let config = Self::load_config_from_path(&config_path)?;

        Ok(Self::new(config, Some(config_path)))
    }

    /// Gets the loaded configuration.
    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Gets a mutable reference for command-line overrides.
    pub fn get_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Returns the file the configuration was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load_config_from_path(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Configuration validation failed for: {}", path.display()))?;

        Ok(config)
    }
}
