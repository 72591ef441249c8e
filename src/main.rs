use anyhow::{Context, Result};
use clap::Parser;
use nusb::DeviceInfo;
use nusb::transfer::EndpointType;
use tracing::{info, warn};

use wt3000_lib::constants::{ENDPOINT_IN, ENDPOINT_OUT, PID, VID};

/// List attached USB devices and dump the endpoint layout of any WT3000.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// List every USB device, not only Yokogawa ones.
    #[arg(short, long)]
    all: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_target(false).init();

    info!("Listing connected USB devices...");
    let mut count = 0;
    for device_info in nusb::list_devices().context("Failed to list USB devices")? {
        if !cli.all && device_info.vendor_id() != VID {
            continue;
        }
        count += 1;
        info!(
            "Device #{}: VID: {:#06x}, PID: {:#06x}, Bus: {:03}, Address: {:03}",
            count,
            device_info.vendor_id(),
            device_info.product_id(),
            device_info.bus_number(),
            device_info.device_address()
        );
        info!("  Manufacturer: {}", device_info.manufacturer_string().unwrap_or("<Not available>"));
        info!("  Product: {}", device_info.product_string().unwrap_or("<Not available>"));
        info!("  Serial: {}", device_info.serial_number().unwrap_or("<Not available>"));

        if device_info.vendor_id() == VID && device_info.product_id() == PID {
            if let Err(e) = inspect_endpoints(&device_info) {
                warn!("  Could not inspect WT3000 endpoints: {:?}", e);
            }
        }
    }

    if count == 0 {
        info!("No matching USB devices found.");
    }
    Ok(())
}

/// Prints each interface's endpoints and checks the expected bulk pair is present.
fn inspect_endpoints(device_info: &DeviceInfo) -> Result<()> {
    let device = device_info.open().context("Failed to open USB device")?;
    let config = device
        .active_configuration()
        .context("Failed to read active configuration")?;

    let mut found_out = false;
    let mut found_in = false;
    for group in config.interfaces() {
        for setting in group.alt_settings() {
            info!(
                "  Interface {} alt {}: class {:#04x}/{:#04x}/{:#04x}",
                setting.interface_number(),
                setting.alternate_setting(),
                setting.class(),
                setting.subclass(),
                setting.protocol()
            );
            for endpoint in setting.endpoints() {
                // Bit 7 of the address is set for IN
                let direction = if endpoint.address() & 0x80 != 0 { "IN" } else { "OUT" };
                let transfer_type = match endpoint.transfer_type() {
                    EndpointType::Control => "Control",
                    EndpointType::Isochronous => "Isochronous",
                    EndpointType::Bulk => "Bulk",
                    EndpointType::Interrupt => "Interrupt",
                };
                info!(
                    "    Endpoint {:#04x} {} {} (max packet {})",
                    endpoint.address(),
                    direction,
                    transfer_type,
                    endpoint.max_packet_size()
                );
                let bulk = endpoint.transfer_type() == EndpointType::Bulk;
                found_out |= bulk && endpoint.address() == ENDPOINT_OUT;
                found_in |= bulk && endpoint.address() == ENDPOINT_IN;
            }
        }
    }

    if found_out && found_in {
        info!("  Bulk endpoints {:#04x}/{:#04x} present", ENDPOINT_OUT, ENDPOINT_IN);
    } else {
        warn!(
            "  Expected bulk endpoints {:#04x} (OUT) and {:#04x} (IN) not both found",
            ENDPOINT_OUT, ENDPOINT_IN
        );
    }
    Ok(())
}
