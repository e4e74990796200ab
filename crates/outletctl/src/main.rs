//! outletctl
//!
//! Command-line tool for a multi-outlet USB power switch. Talks to the
//! device over vendor control transfers and prints results on stdout.

mod cli;
mod config;
mod usb;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use common::{OutletControl, setup_logging};
use config::OutletConfig;
use std::process::ExitCode;
use tracing::{debug, info};
use usb::UsbOutlet;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = OutletConfig::default();
        let path = OutletConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config =
        OutletConfig::load(args.config_path()).context("Failed to load configuration")?;

    let log_level = args.log_level(&config.logging.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;
    debug!("outletctl v{}, log level {}", env!("CARGO_PKG_VERSION"), log_level);

    let vendor_id = config.device.vendor_id()?;
    let product_id = config.device.product_id()?;

    if args.list_devices {
        return list_devices_mode(vendor_id, product_id, args.json);
    }

    let transport = UsbOutlet::open_with_timeout(vendor_id, product_id, config.device.timeout())?;
    info!(
        "Using device on bus {:03} address {:03}",
        transport.bus_number(),
        transport.device_address()
    );

    let mut ctl = OutletControl::new(transport);
    let stdout = std::io::stdout();
    cli::execute(&mut ctl, &args.action, args.json, &mut stdout.lock())
}

/// List matching USB devices and exit
fn list_devices_mode(vendor_id: u16, product_id: u16, json: bool) -> Result<()> {
    let devices = usb::list_devices(vendor_id, product_id)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&devices).context("Failed to serialize device list")?
        );
    } else if devices.is_empty() {
        println!("No outlet devices found.");
    } else {
        println!("Found {} outlet device(s):\n", devices.len());
        for device in devices {
            println!(
                "  {:04x}:{:04x} - {} {}",
                device.vendor_id,
                device.product_id,
                device
                    .manufacturer
                    .as_deref()
                    .unwrap_or("Unknown Manufacturer"),
                device.product.as_deref().unwrap_or("Unknown Product")
            );
            println!(
                "      Bus {:03} Device {:03}",
                device.bus_number, device.device_address
            );
            if let Some(serial) = &device.serial_number {
                println!("      Serial: {}", serial);
            }
            println!();
        }
    }

    Ok(())
}
