//! Simulator configuration and option parsing

use mspiflash_core::RegisterMap;
use thiserror::Error;

/// Errors from parsing simulator options
#[derive(Debug, Error)]
pub enum SimConfigError {
    /// Value could not be parsed
    #[error("Invalid {key} value: {value}")]
    InvalidValue { key: String, value: String },

    /// Flash size unusable
    #[error("Invalid flash size {0}: must be a non-zero multiple of 4096 up to 16 MiB")]
    InvalidSize(usize),
}

/// Result type for simulator configuration
pub type Result<T> = std::result::Result<T, SimConfigError>;

/// Behaviour of the simulated chip and flash part
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Flash size in bytes, non-zero (checked by [`parse_options`])
    pub flash_size: usize,
    /// Status reads that report WIP after each erase or program
    pub busy_polls: u32,
    /// SPICTL reads after a transfer before the done flag rises
    pub done_latency: u32,
    /// Never raise the done flag
    pub stuck_done: bool,
    /// Never clear WIP once set
    pub stuck_busy: bool,
    /// Register offsets the chip answers on
    pub registers: RegisterMap,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            flash_size: 16 * 1024 * 1024,
            busy_polls: 3,
            done_latency: 0,
            stuck_done: false,
            stuck_busy: false,
            registers: RegisterMap::default(),
        }
    }
}

fn parse_number<T: TryFrom<u64>>(key: &str, value: &str) -> Result<T> {
    let invalid = || SimConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };
    let n = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| invalid())?
    } else if let Some(kib) = value.strip_suffix('K').or_else(|| value.strip_suffix('k')) {
        kib.parse::<u64>()
            .map_err(|_| invalid())?
            .checked_mul(1024)
            .ok_or_else(invalid)?
    } else if let Some(mib) = value.strip_suffix('M').or_else(|| value.strip_suffix('m')) {
        mib.parse::<u64>()
            .map_err(|_| invalid())?
            .checked_mul(1024 * 1024)
            .ok_or_else(invalid)?
    } else {
        value.parse::<u64>().map_err(|_| invalid())?
    };
    T::try_from(n).map_err(|_| invalid())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(SimConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parse `key=value` options
///
/// Supported keys:
/// - `size` - flash size (`16M`, `512K`, `0x100000`)
/// - `busy` - status reads reporting WIP after erase/program
/// - `latency` - SPICTL reads before done rises
/// - `stuck` - `done` or `busy` to simulate a hung device
///
/// # Example
///
/// ```ignore
/// let options = [("size", "1M"), ("busy", "5")];
/// let config = parse_options(&options)?;
/// ```
pub fn parse_options(options: &[(&str, &str)]) -> Result<SimConfig> {
    let mut config = SimConfig::default();

    for (key, value) in options {
        match *key {
            "size" => {
                let size: usize = parse_number(key, value)?;
                if size == 0 || size % 4096 != 0 || size > 16 * 1024 * 1024 {
                    return Err(SimConfigError::InvalidSize(size));
                }
                config.flash_size = size;
            }
            "busy" => config.busy_polls = parse_number(key, value)?,
            "latency" => config.done_latency = parse_number(key, value)?,
            "stuck" => match *value {
                "done" => config.stuck_done = true,
                "busy" => config.stuck_busy = true,
                other => {
                    config.stuck_done = parse_bool(key, other)?;
                }
            },
            _ => {
                log::warn!("Unknown simulator option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config =
            parse_options(&[("size", "1M"), ("busy", "7"), ("latency", "0x2")]).unwrap();
        assert_eq!(config.flash_size, 1024 * 1024);
        assert_eq!(config.busy_polls, 7);
        assert_eq!(config.done_latency, 2);
        assert!(!config.stuck_done);
    }

    #[test]
    fn test_parse_stuck() {
        assert!(parse_options(&[("stuck", "done")]).unwrap().stuck_done);
        assert!(parse_options(&[("stuck", "busy")]).unwrap().stuck_busy);
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(
            parse_options(&[("busy", "lots")]),
            Err(SimConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_options(&[("size", "1000")]),
            Err(SimConfigError::InvalidSize(1000))
        ));
    }

    #[test]
    fn test_parse_rejects_overflowing_suffix() {
        assert!(matches!(
            parse_options(&[("size", "18014398509481985K")]),
            Err(SimConfigError::InvalidValue { key, .. }) if key == "size"
        ));
        assert!(matches!(
            parse_options(&[("latency", "17592186044416M")]),
            Err(SimConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_option_ignored() {
        let config = parse_options(&[("colour", "blue")]).unwrap();
        assert_eq!(config.busy_polls, SimConfig::default().busy_polls);
    }
}
