//! Send command implementation.

use lightseq_device::{DeviceClient, DeviceConfig};
use std::net::SocketAddr;
use tracing::info;

/// Parses `RRGGBB` (an optional leading `#` is accepted).
pub fn parse_color(hex: &str) -> Result<[u8; 3], String> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(format!("Invalid colour {hex:?}: expected RRGGBB"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| format!("Invalid colour {hex:?}: expected RRGGBB"))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Runs the send command.
pub fn run(
    addr: SocketAddr,
    color: [u8; 3],
    pixels: usize,
    output_id: u8,
    brightness: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = DeviceClient::new(DeviceConfig::from(addr).with_output_id(output_id));
        client.connect().await?;

        if let Some(level) = brightness {
            let sent = client.set_brightness(level).await?;
            info!(%addr, brightness = sent, "brightness set");
        }
        let bytes = client.send_color(color, pixels).await?;
        client.close();

        println!(
            "Sent #{:02x}{:02x}{:02x} to {} pixel(s) on {} ({} bytes)",
            color[0], color[1], color[2], pixels, addr, bytes
        );
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
