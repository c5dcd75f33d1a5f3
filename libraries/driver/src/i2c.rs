// Bus transport over any embedded-hal-async I2C peripheral
//
// embassy-stm32, esp-hal and rp-hal all implement `embedded_hal_async::i2c::I2c`,
// so this one adapter is the platform transport for every board.

use embedded_hal_async::i2c::{Error, ErrorKind, I2c};
use hal::{BusError, I2cConfig, I2cDevice};

/// Adapter from an embedded-hal-async I2C bus to [`I2cDevice`]
///
/// The peripheral must already be configured with the frequency and timeout in
/// `config`; this type only records them.
pub struct HalI2c<T> {
    bus: T,
    config: I2cConfig,
}

impl<T: I2c> HalI2c<T> {
    pub fn new(bus: T) -> Self {
        Self::with_config(bus, I2cConfig::default())
    }

    pub fn with_config(bus: T, config: I2cConfig) -> Self {
        Self { bus, config }
    }

    pub fn config(&self) -> I2cConfig {
        self.config
    }

    pub fn into_inner(self) -> T {
        self.bus
    }
}

/// Map an embedded-hal error kind into the transport error set
pub fn map_error_kind(kind: ErrorKind) -> BusError {
    match kind {
        ErrorKind::NoAcknowledge(_) => BusError::Nack,
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLost,
        ErrorKind::Bus => BusError::Bus,
        ErrorKind::Overrun => BusError::Overrun,
        _ => BusError::Other,
    }
}

impl<T: I2c> I2cDevice for HalI2c<T> {
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError> {
        self.bus
            .write(addr, data)
            .await
            .map_err(|e| map_error_kind(e.kind()))
    }

    async fn read(&mut self, addr: u8, data: &mut [u8]) -> Result<(), BusError> {
        self.bus
            .read(addr, data)
            .await
            .map_err(|e| map_error_kind(e.kind()))
    }

    async fn write_read(
        &mut self,
        addr: u8,
        write_data: &[u8],
        read_data: &mut [u8],
    ) -> Result<(), BusError> {
        self.bus
            .write_read(addr, write_data, read_data)
            .await
            .map_err(|e| map_error_kind(e.kind()))
    }
}
