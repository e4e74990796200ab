//! outletctl configuration management

use crate::usb::transfers::DEFAULT_TIMEOUT;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutletConfig {
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Which device to talk to and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// USB Vendor ID, `0x`-prefixed hex
    #[serde(default = "DeviceSettings::default_vendor_id")]
    pub vendor_id: String,
    /// USB Product ID, `0x`-prefixed hex
    #[serde(default = "DeviceSettings::default_product_id")]
    pub product_id: String,
    /// Control transfer timeout in milliseconds
    #[serde(default = "DeviceSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: Self::default_vendor_id(),
            product_id: Self::default_product_id(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl DeviceSettings {
    fn default_vendor_id() -> String {
        format!("{:#06x}", protocol::VENDOR_ID)
    }

    fn default_product_id() -> String {
        format!("{:#06x}", protocol::PRODUCT_ID)
    }

    fn default_timeout_ms() -> u64 {
        DEFAULT_TIMEOUT.as_millis() as u64
    }

    pub fn vendor_id(&self) -> Result<u16> {
        parse_hex_id(&self.vendor_id, "VID")
    }

    pub fn product_id(&self) -> Result<u16> {
        parse_hex_id(&self.product_id, "PID")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level used when no -v flag is given
    #[serde(default = "LoggingSettings::default_log_level")]
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl LoggingSettings {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

impl OutletConfig {
    /// Load configuration from the specified path
    ///
    /// Without a path the standard locations are searched and built-in
    /// defaults are used only when none of them exists. A file that exists
    /// but cannot be read, parsed or validated is always an error.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path.or_else(Self::find_config_file) {
            Some(p) => p,
            None => {
                tracing::debug!("No configuration file found, using defaults");
                return Ok(Self::default());
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// First existing file among the standard locations
    fn find_config_file() -> Option<PathBuf> {
        [
            Self::default_path(),
            PathBuf::from("/etc/outletctl/config.toml"),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: OutletConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("outletctl").join("config.toml")
        } else {
            PathBuf::from(".config/outletctl/config.toml")
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.log_level,
                valid_levels.join(", ")
            ));
        }

        self.device.vendor_id()?;
        self.device.product_id()?;

        if self.device.timeout_ms == 0 {
            return Err(anyhow!("timeout_ms must be greater than 0"));
        }

        Ok(())
    }
}

/// Parse a `0x`-prefixed hex ID (VID or PID)
fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
    let hex_part = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| {
            anyhow!(
                "Invalid {} '{}', must start with '0x' (e.g., '0x1234')",
                name,
                id
            )
        })?;

    if hex_part.is_empty() || hex_part.len() > 4 {
        return Err(anyhow!(
            "Invalid {} '{}', hex part must be 1-4 digits",
            name,
            id
        ));
    }

    u16::from_str_radix(hex_part, 16)
        .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
}
