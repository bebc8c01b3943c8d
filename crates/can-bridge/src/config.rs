use crate::adapter::{CanAdapter, ControllerKind};
use crate::baud::DEFAULT_BITRATE;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which controller to drive and how fast, as read from YAML.
///
/// ```yaml
/// kind: external_spi
/// chip_select: 10
/// baud: 500000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    #[serde(default)]
    pub kind: ControllerKind,
    #[serde(default)]
    pub chip_select: Option<u8>,
    /// Bit rate in bits/s, or a baud code when `<= 13`.
    #[serde(default = "default_baud")]
    pub baud: u32,
}

fn default_baud() -> u32 {
    DEFAULT_BITRATE
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            kind: ControllerKind::default(),
            chip_select: None,
            baud: DEFAULT_BITRATE,
        }
    }
}

impl AdapterConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.kind == ControllerKind::ExternalSpi && self.chip_select.is_none() {
            anyhow::bail!("external_spi controller requires a chip_select line");
        }
        Ok(())
    }
}

impl<P, S> CanAdapter<P, S> {
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(config.kind, config.chip_select)
    }
}

pub fn parse_adapter_config(raw: &str) -> anyhow::Result<AdapterConfig> {
    let config: AdapterConfig = serde_yaml::from_str(raw).context("decoding adapter config")?;
    config.validate()?;
    Ok(config)
}

pub fn load_adapter_config(path: impl AsRef<Path>) -> anyhow::Result<AdapterConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading adapter config: {}", path.display()))?;
    parse_adapter_config(&raw).with_context(|| format!("loading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spi_config() {
        let config = parse_adapter_config("kind: external_spi\nchip_select: 10\nbaud: 500000\n")
            .unwrap();
        assert_eq!(config.kind, ControllerKind::ExternalSpi);
        assert_eq!(config.chip_select, Some(10));
        assert_eq!(config.baud, 500_000);
    }

    #[test]
    fn test_defaults() {
        let config = parse_adapter_config("{}").unwrap();
        assert_eq!(config, AdapterConfig::default());
        assert_eq!(config.kind, ControllerKind::Peripheral);
        assert_eq!(config.baud, 250_000);
    }

    #[test]
    fn test_spi_without_chip_select_rejected() {
        let err = parse_adapter_config("kind: external_spi\n").unwrap_err();
        assert!(err.to_string().contains("chip_select"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(parse_adapter_config("kind: usb\n").is_err());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_adapter_config("/nonexistent/can.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/can.yaml"));
    }
}
