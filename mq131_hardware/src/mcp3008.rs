//! MCP3008 10-bit SPI ADC, the usual companion of an MQ131 on a Raspberry Pi.
//!
//! Frame helpers are target-independent; the SPI-backed reader needs the
//! `hardware` feature.

use crate::error::{HwError, Result};

/// Largest count a 10-bit conversion can produce.
pub const MAX_COUNT: u16 = 1023;

/// Build the 3-byte single-ended conversion request for `channel`.
pub fn command_frame(channel: u8) -> Result<[u8; 3]> {
    if channel > 7 {
        return Err(HwError::Channel(channel));
    }
    Ok([0x01, 0x80 | (channel << 4), 0x00])
}

/// Extract the 10-bit result from the response frame.
#[inline]
pub fn decode_frame(rx: [u8; 3]) -> u16 {
    (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2])
}

#[cfg(feature = "hardware")]
pub struct Mcp3008 {
    spi: rppal::spi::Spi,
    tx: [u8; 3],
    channel: u8,
}

#[cfg(feature = "hardware")]
impl Mcp3008 {
    pub fn new(bus: u8, slave_select: u8, channel: u8, clock_hz: u32) -> Result<Self> {
        use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(HwError::Spi(format!("unsupported spi bus {other}"))),
        };
        let ss = match slave_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported chip select {other}"))),
        };
        let tx = command_frame(channel)?;
        let spi = Spi::new(bus, ss, clock_hz, Mode::Mode0).map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi, tx, channel })
    }

    pub fn read_counts(&mut self) -> Result<u16> {
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &self.tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let counts = decode_frame(rx);
        tracing::trace!(counts, channel = self.channel, "mcp3008 raw read");
        Ok(counts)
    }
}
