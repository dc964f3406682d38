use tokio_serial::SerialPortType;

/// One serial port as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Enumerate the serial ports visible on this host, sorted by name.
pub fn list_ports() -> Result<Vec<PortInfo>, tokio_serial::Error> {
    let mut ports: Vec<PortInfo> = tokio_serial::available_ports()?
        .into_iter()
        .map(|p| {
            let description = describe(&p.port_type);
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ports)
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => {
            let mut parts = Vec::new();
            if let Some(manufacturer) = &info.manufacturer {
                parts.push(manufacturer.clone());
            }
            if let Some(product) = &info.product {
                parts.push(product.clone());
            }
            if parts.is_empty() {
                "USB Serial".to_string()
            } else {
                parts.join(" ")
            }
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => String::new(),
    }
}
