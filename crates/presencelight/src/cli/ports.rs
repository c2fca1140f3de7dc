//! `ports` subcommand: list serial ports.

use std::path::Path;

use super::{PortsOutput, Result, link};

pub(super) fn cmd_ports(json: bool, config_path: Option<&Path>) -> Result<()> {
    let ports = link::list_ports()?;
    let configured = super::load_config(config_path).port_name();

    if json {
        return super::print_json(&PortsOutput {
            count: ports.len(),
            configured,
            ports,
        });
    }

    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    println!(
        "Found {} serial port{}:",
        ports.len(),
        if ports.len() == 1 { "" } else { "s" }
    );
    println!();

    for port in &ports {
        let marker = if configured.as_deref() == Some(port.name.as_str()) {
            "  (configured)"
        } else {
            ""
        };
        println!("  {} [{}]{marker}", port.name, port.kind);
        if let Some(ref product) = port.product {
            println!("      {product}");
        }
    }

    Ok(())
}
