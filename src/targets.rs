//! Target registration and dispatch
//!
//! A target string names the transport behind the driver plus optional
//! `key=value` parameters, e.g. `sim:size=1M,busy=5`. Only the simulator
//! ships with this crate; boards provide their own transport through the
//! library.

use crate::cli::{DriverArgs, TailArg};
use crate::error::{CliError, Result};
use mspiflash_core::{DriverConfig, PollPolicy, TailPolicy};
use mspiflash_sim::SimChip;

/// Information about a target
pub struct TargetInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// All available targets
pub fn available_targets() -> Vec<TargetInfo> {
    vec![TargetInfo {
        name: "sim",
        aliases: &["dummy"],
        description: "Simulated master SPI block with 16 MiB SPI NOR \
                      (size=<bytes>,busy=<polls>,latency=<polls>,stuck=<done|busy>)",
    }]
}

/// Parsed target specification
#[derive(Debug, PartialEq, Eq)]
pub struct TargetParams {
    /// Target name
    pub name: String,
    /// Parameters in the order given
    pub params: Vec<(String, String)>,
}

/// Split `name:key=value,key=value`
pub fn parse_target(s: &str) -> Result<TargetParams> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.push((key.to_string(), value.to_string()));
            } else {
                return Err(CliError::InvalidParameter(opt.to_string()));
            }
        }
    }

    Ok(TargetParams {
        name: name.to_string(),
        params,
    })
}

/// Open the simulated chip described by `target`
pub fn open_target(target: &str) -> Result<SimChip> {
    let params = parse_target(target)?;

    match params.name.as_str() {
        "sim" | "dummy" => {
            let options: Vec<(&str, &str)> = params
                .params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let config = mspiflash_sim::parse_options(&options)?;
            log::info!(
                "Opening simulator ({} KiB flash, {} busy polls)",
                config.flash_size / 1024,
                config.busy_polls
            );
            Ok(SimChip::new(config))
        }
        _ => Err(CliError::UnknownTarget(params.name)),
    }
}

/// Build the driver configuration from command line options
pub fn driver_config(args: &DriverArgs) -> DriverConfig {
    let poll = match args.max_polls {
        Some(max) => PollPolicy::bounded(args.poll_interval_us, max),
        None => PollPolicy {
            interval_us: args.poll_interval_us,
            max_attempts: None,
        },
    };
    let tail = match args.tail {
        TailArg::Pad => TailPolicy::PadErased,
        TailArg::Reject => TailPolicy::Reject,
    };
    DriverConfig::default()
        .with_poll(poll)
        .with_tail(tail)
        .with_chunk_size(args.chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_with_params() {
        let params = parse_target("sim:size=1M,busy=2").unwrap();
        assert_eq!(params.name, "sim");
        assert_eq!(
            params.params,
            vec![
                ("size".to_string(), "1M".to_string()),
                ("busy".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_target_bare_name() {
        let params = parse_target("sim").unwrap();
        assert!(params.params.is_empty());
    }

    #[test]
    fn test_parse_target_rejects_flag() {
        assert!(matches!(
            parse_target("sim:verbose"),
            Err(CliError::InvalidParameter(p)) if p == "verbose"
        ));
    }

    #[test]
    fn test_open_unknown_target() {
        assert!(matches!(
            open_target("ch341a"),
            Err(CliError::UnknownTarget(name)) if name == "ch341a"
        ));
    }

    #[test]
    fn test_open_sim_applies_options() {
        let chip = open_target("sim:size=64K,busy=9").unwrap();
        assert_eq!(chip.data().len(), 64 * 1024);
        assert_eq!(chip.config().busy_polls, 9);
    }

    #[test]
    fn test_driver_config_from_args() {
        let args = DriverArgs {
            max_polls: Some(100),
            poll_interval_us: 10,
            tail: TailArg::Reject,
            chunk_size: 256,
        };
        let config = driver_config(&args);
        assert_eq!(config.status_poll, PollPolicy::bounded(10, 100));
        assert_eq!(config.done_poll, PollPolicy::bounded(10, 100));
        assert_eq!(config.tail, TailPolicy::Reject);
        assert_eq!(config.chunk_size, 256);
    }
}
