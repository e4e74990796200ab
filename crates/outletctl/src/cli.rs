//! Command-line surface of outletctl

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use common::{OutletControl, Transport};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "outletctl")]
#[command(author, version, about = "Manage outlets")]
#[command(long_about = "
Control a multi-outlet USB power switch.

Outlets that share a group share one status: switching or toggling any
outlet of a group switches the whole group.

EXAMPLES:
    # Show status and group of every outlet
    outletctl

    # Turn outlet 2 on
    outletctl --on 2

    # Put outlet 3 in group 1
    outletctl --group 3 1

    # List connected devices
    outletctl --list-devices
")]
pub struct Args {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log level (trace, debug, info, warn, error), overrides -v
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    pub save_config: bool,

    /// List matching USB devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Print the outlet table as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub action: Action,
}

#[derive(clap::Args, Debug, Default)]
#[group(multiple = false)]
pub struct Action {
    /// Display the status of the specified outlet.
    /// When no option is specified, show the status of all outlets.
    #[arg(short, long, value_name = "OUTLET")]
    pub status: Option<u16>,

    /// Display the number of outlets.
    #[arg(short, long)]
    pub count: bool,

    /// Turn the specified outlet ON.
    #[arg(short = '1', long, value_name = "OUTLET")]
    pub on: Option<u16>,

    /// Turn the specified outlet OFF.
    #[arg(short = '0', long, value_name = "OUTLET")]
    pub off: Option<u16>,

    /// Toggle the specified outlet.
    #[arg(short, long, value_name = "OUTLET")]
    pub toggle: Option<u16>,

    /// Change the group of the specified outlet.
    #[arg(short, long, num_args = 2, value_names = ["OUTLET", "GROUP"])]
    pub group: Option<Vec<u16>>,
}

impl Args {
    /// Log level from --log-level, -v count, or the configured default
    pub fn log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        if let Some(level) = self.log_level.as_deref() {
            return level;
        }
        match self.verbose {
            0 => configured,
            1 => "info",
            _ => "debug",
        }
    }

    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    }
}

/// Run the selected action against `ctl`, writing results to `out`
pub fn execute<T: Transport, W: Write>(
    ctl: &mut OutletControl<T>,
    action: &Action,
    json: bool,
    out: &mut W,
) -> Result<()> {
    if let Some(outlet) = action.on {
        ctl.turn_on(outlet)?;
    } else if let Some(outlet) = action.off {
        ctl.turn_off(outlet)?;
    } else if let Some(outlet) = action.toggle {
        ctl.toggle(outlet)?;
    } else if let Some(pair) = &action.group {
        let (outlet, group) = match pair.as_slice() {
            [outlet, group] => (*outlet, *group),
            _ => return Err(anyhow!("--group takes OUTLET and GROUP")),
        };
        let group = u8::try_from(group)
            .map_err(|_| anyhow!("invalid group {}: must be between 0 and 255", group))?;
        ctl.set_group(outlet, group)?;
    } else if action.count {
        writeln!(out, "{}", ctl.get_count()?)?;
    } else if let Some(outlet) = action.status {
        let status = if ctl.is_on(outlet)? { "on" } else { "off" };
        writeln!(out, "{}", status)?;
    } else {
        let outlets = ctl.outlets()?;
        if json {
            serde_json::to_writer_pretty(&mut *out, &outlets)
                .context("Failed to serialize outlet table")?;
            writeln!(out)?;
        } else {
            for state in outlets {
                writeln!(out, "{}", state)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::test_utils::SimulatedOutlets;

    fn run(argv: &[&str], sim: &mut SimulatedOutlets) -> Result<String> {
        let args = Args::try_parse_from(std::iter::once("outletctl").chain(argv.iter().copied()))?;
        let mut ctl = OutletControl::new(sim);
        let mut out = Vec::new();
        execute(&mut ctl, &args.action, args.json, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_default_prints_table() {
        let mut sim = SimulatedOutlets::default();
        run(&["--on", "1"], &mut sim).unwrap();
        let table = run(&[], &mut sim).unwrap();
        assert_eq!(
            table,
            "0: off (group: 0)\n1: on  (group: 1)\n2: off (group: 2)\n3: off (group: 3)\n"
        );
    }

    #[test]
    fn test_count_and_status() {
        let mut sim = SimulatedOutlets::default();
        assert_eq!(run(&["-c"], &mut sim).unwrap(), "4\n");
        assert_eq!(run(&["-s", "2"], &mut sim).unwrap(), "off\n");
        run(&["-t", "2"], &mut sim).unwrap();
        assert_eq!(run(&["--status", "2"], &mut sim).unwrap(), "on\n");
        run(&["--off", "2"], &mut sim).unwrap();
        assert_eq!(run(&["-s", "2"], &mut sim).unwrap(), "off\n");
    }

    #[test]
    fn test_group_flag() {
        let mut sim = SimulatedOutlets::default();
        run(&["-g", "3", "0"], &mut sim).unwrap();
        assert_eq!(sim.relay_groups(), &[0, 1, 2, 0]);
        assert!(run(&["-g", "3", "256"], &mut sim).is_err());
        assert!(run(&["-g", "3"], &mut sim).is_err());
    }

    #[test]
    fn test_actions_are_mutually_exclusive() {
        assert!(Args::try_parse_from(["outletctl", "--on", "1", "--off", "1"]).is_err());
        assert!(Args::try_parse_from(["outletctl", "-c", "-s", "0"]).is_err());
    }

    #[test]
    fn test_device_error_surfaces() {
        let mut sim = SimulatedOutlets::default();
        let err = run(&["--on", "9"], &mut sim).unwrap_err();
        assert_eq!(err.to_string(), "invalid relay number");
    }

    #[test]
    fn test_json_table() {
        let mut sim = SimulatedOutlets::new(2);
        let out = run(&["--json"], &mut sim).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[1]["outlet"], 1);
        assert_eq!(value[1]["on"], false);
        assert_eq!(value[1]["group"], 1);
    }

    #[test]
    fn test_log_level_selection() {
        let args = Args::try_parse_from(["outletctl"]).unwrap();
        assert_eq!(args.log_level("warn"), "warn");
        let args = Args::try_parse_from(["outletctl", "-v"]).unwrap();
        assert_eq!(args.log_level("warn"), "info");
        let args = Args::try_parse_from(["outletctl", "-vvv"]).unwrap();
        assert_eq!(args.log_level("warn"), "debug");
        let args = Args::try_parse_from(["outletctl", "-v", "--log-level", "trace"]).unwrap();
        assert_eq!(args.log_level("warn"), "trace");
    }
}
