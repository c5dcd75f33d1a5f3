/// I2C bus transport interface
use thiserror::Error;

/// Standard-mode bus clock used by the handheld target
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// Per-transaction timeout in microseconds, long enough for slow sensors to stretch the clock
pub const I2C_TIMEOUT_US: u32 = 8_000;

/// Bus settings a platform transport applies when it brings the peripheral up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cConfig {
    /// Bus frequency in Hz
    pub frequency: u32,
    /// Timeout in microseconds
    pub timeout_us: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: I2C_FREQUENCY_HZ,
            timeout_us: I2C_TIMEOUT_US,
        }
    }
}

/// Transport-level failure of a single bus transaction
///
/// Every transport maps its native error into one of these variants.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The addressed device did not acknowledge
    #[error("no acknowledge from device")]
    Nack,

    /// The transaction did not complete within the transport timeout
    #[error("bus transaction timed out")]
    Timeout,

    /// Another controller won arbitration
    #[error("bus arbitration lost")]
    ArbitrationLost,

    /// Misplaced start/stop condition or similar electrical fault
    #[error("bus error")]
    Bus,

    /// Receive buffer overrun
    #[error("bus overrun")]
    Overrun,

    /// Anything the transport could not classify
    #[error("unclassified bus failure")]
    Other,
}

/// Common interface for I2C device operations with async support
///
/// Addresses are 7-bit. Implementations are owned by exactly one driver;
/// callers that share a bus must serialise access themselves.
#[allow(async_fn_in_trait)]
pub trait I2cDevice {
    /// Write data to a device at the specified address
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError>;

    /// Read data from a device at the specified address
    async fn read(&mut self, addr: u8, data: &mut [u8]) -> Result<(), BusError>;

    /// Write data to a device and then read from it (combined operation)
    async fn write_read(
        &mut self,
        addr: u8,
        write_data: &[u8],
        read_data: &mut [u8],
    ) -> Result<(), BusError>;

    /// Read a single register from a device
    async fn read_reg(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
        let mut buffer = [0u8; 1];
        self.write_read(addr, &[reg], &mut buffer).await?;
        Ok(buffer[0])
    }

    /// Write to a single register on a device
    async fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.write(addr, &[reg, value]).await
    }

    /// Read multiple consecutive registers from a device
    async fn read_regs(&mut self, addr: u8, reg: u8, data: &mut [u8]) -> Result<(), BusError> {
        self.write_read(addr, &[reg], data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    /// Records the last write and answers reads from a fixed register file
    struct RegisterFile {
        regs: [u8; 4],
        last_write: Option<(u8, [u8; 2])>,
    }

    impl I2cDevice for RegisterFile {
        async fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError> {
            if data.len() != 2 {
                return Err(BusError::Other);
            }
            self.last_write = Some((addr, [data[0], data[1]]));
            self.regs[data[0] as usize] = data[1];
            Ok(())
        }

        async fn read(&mut self, _addr: u8, _data: &mut [u8]) -> Result<(), BusError> {
            Err(BusError::Nack)
        }

        async fn write_read(
            &mut self,
            _addr: u8,
            write_data: &[u8],
            read_data: &mut [u8],
        ) -> Result<(), BusError> {
            let start = write_data[0] as usize;
            read_data.copy_from_slice(&self.regs[start..start + read_data.len()]);
            Ok(())
        }
    }

    #[test]
    fn test_register_helpers() {
        let mut dev = RegisterFile {
            regs: [0x10, 0x20, 0x30, 0x40],
            last_write: None,
        };

        assert_eq!(block_on(dev.read_reg(0x68, 2)), Ok(0x30));

        block_on(dev.write_reg(0x68, 1, 0xAB)).unwrap();
        assert_eq!(dev.last_write, Some((0x68, [1, 0xAB])));

        let mut buf = [0u8; 3];
        block_on(dev.read_regs(0x68, 1, &mut buf)).unwrap();
        assert_eq!(buf, [0xAB, 0x30, 0x40]);
    }

    #[test]
    fn test_default_config_matches_constants() {
        let config = I2cConfig::default();
        assert_eq!(config.frequency, 100_000);
        assert_eq!(config.timeout_us, 8_000);
    }
}
