use embedded_hal_async::delay::DelayNs;
use hal::{to_physical, BusError, I2cDevice, PhysicalSample, RawSample};
use log::{debug, info};

use super::{DriverError, MpuModel};

// MPU I2C addresses (depends on AD0 pin state)
pub const MPU_I2C_ADDR_PRIMARY: u8 = 0x68;
pub const MPU_I2C_ADDR_SECONDARY: u8 = 0x69;

// Register addresses, common to the MPU6050/MPU6500 family
pub const MPU_REG_GYRO_CONFIG: u8 = 0x1B;
pub const MPU_REG_ACCEL_CONFIG: u8 = 0x1C;
pub const MPU_REG_ACCEL_XOUT_H: u8 = 0x3B;
pub const MPU_REG_TEMP_OUT_H: u8 = 0x41;
pub const MPU_REG_GYRO_XOUT_H: u8 = 0x43;
pub const MPU_REG_PWR_MGMT_1: u8 = 0x6B;
pub const MPU_REG_WHO_AM_I: u8 = 0x75;

// ACCEL_XOUT_H..GYRO_ZOUT_L, temperature pair included
pub const MPU_DATA_BLOCK_LEN: usize = 14;

// PWR_MGMT_1 bits
pub const MPU_PWR_SLEEP: u8 = 0x40;
pub const MPU_PWR_WAKE: u8 = 0x00;

// FS_SEL / AFS_SEL live in bits 4:3 of the config registers
pub const MPU_FS_SEL_SHIFT: u8 = 3;
pub const MPU_FS_SEL_MASK: u8 = 0x18;

// Time the device needs after leaving sleep before samples are valid
pub const MPU_WAKE_DELAY_MS: u32 = 100;

/// Operating point selected by `init`
pub const ACCEL_RANGE: AccelRange = AccelRange::G2;
pub const GYRO_RANGE: GyroRange = GyroRange::Dps250;

/// Accelerometer full-scale selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    /// AFS_SEL field value
    pub fn fs_sel(self) -> u8 {
        match self {
            AccelRange::G2 => 0,
            AccelRange::G4 => 1,
            AccelRange::G8 => 2,
            AccelRange::G16 => 3,
        }
    }

    /// Value written to ACCEL_CONFIG
    pub fn config_bits(self) -> u8 {
        self.fs_sel() << MPU_FS_SEL_SHIFT
    }

    /// Decode ACCEL_CONFIG; self-test bits are ignored
    pub fn from_config(value: u8) -> Self {
        match (value & MPU_FS_SEL_MASK) >> MPU_FS_SEL_SHIFT {
            0 => AccelRange::G2,
            1 => AccelRange::G4,
            2 => AccelRange::G8,
            _ => AccelRange::G16,
        }
    }

    /// Full-scale range in g
    pub fn full_scale(self) -> f32 {
        match self {
            AccelRange::G2 => 2.0,
            AccelRange::G4 => 4.0,
            AccelRange::G8 => 8.0,
            AccelRange::G16 => 16.0,
        }
    }
}

/// Gyroscope full-scale selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// FS_SEL field value
    pub fn fs_sel(self) -> u8 {
        match self {
            GyroRange::Dps250 => 0,
            GyroRange::Dps500 => 1,
            GyroRange::Dps1000 => 2,
            GyroRange::Dps2000 => 3,
        }
    }

    /// Value written to GYRO_CONFIG
    pub fn config_bits(self) -> u8 {
        self.fs_sel() << MPU_FS_SEL_SHIFT
    }

    /// Decode GYRO_CONFIG; self-test bits are ignored
    pub fn from_config(value: u8) -> Self {
        match (value & MPU_FS_SEL_MASK) >> MPU_FS_SEL_SHIFT {
            0 => GyroRange::Dps250,
            1 => GyroRange::Dps500,
            2 => GyroRange::Dps1000,
            _ => GyroRange::Dps2000,
        }
    }

    /// Full-scale range in degrees per second
    pub fn full_scale(self) -> f32 {
        match self {
            GyroRange::Dps250 => 250.0,
            GyroRange::Dps500 => 500.0,
            GyroRange::Dps1000 => 1000.0,
            GyroRange::Dps2000 => 2000.0,
        }
    }
}

/// Proof of a successful `init` on one device
///
/// Only [`Mpu::init`] creates a handle, so holding one means the device
/// at `address` was woken and configured to `accel_range`/`gyro_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorHandle {
    address: u8,
    model: MpuModel,
    accel_range: AccelRange,
    gyro_range: GyroRange,
}

impl SensorHandle {
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn model(&self) -> MpuModel {
        self.model
    }

    pub fn accel_range(&self) -> AccelRange {
        self.accel_range
    }

    pub fn gyro_range(&self) -> GyroRange {
        self.gyro_range
    }

    /// Convert a raw sample using this device's full-scale ranges
    pub fn to_physical(&self, raw: &RawSample) -> PhysicalSample {
        to_physical(
            raw,
            self.accel_range.full_scale(),
            self.gyro_range.full_scale(),
        )
    }
}

/// Decode the 14-byte data block into a raw sample, skipping the temperature pair
pub fn decode_block(block: &[u8; MPU_DATA_BLOCK_LEN]) -> RawSample {
    RawSample {
        ax: i16::from_be_bytes([block[0], block[1]]),
        ay: i16::from_be_bytes([block[2], block[3]]),
        az: i16::from_be_bytes([block[4], block[5]]),
        gx: i16::from_be_bytes([block[8], block[9]]),
        gy: i16::from_be_bytes([block[10], block[11]]),
        gz: i16::from_be_bytes([block[12], block[13]]),
    }
}

/// MPU-family accelerometer/gyroscope driver
///
/// Owns the bus for the lifetime of the session. No retries are performed
/// here: a failed transaction is reported and the caller decides when to
/// try again.
pub struct Mpu<I: I2cDevice> {
    /// I2C device for communication
    i2c: I,
}

impl<I: I2cDevice> Mpu<I> {
    /// Create a new driver owning the given bus
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give the bus back, e.g. to re-run detection
    pub fn release(self) -> I {
        self.i2c
    }

    /// Mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut I {
        &mut self.i2c
    }

    /// Wake the device and select the fixed full-scale ranges
    ///
    /// Every configuration register is written explicitly, so calling this
    /// twice on the same address leaves the device in the same state.
    pub async fn init<D: DelayNs>(
        &mut self,
        address: u8,
        model: MpuModel,
        delay: &mut D,
    ) -> Result<SensorHandle, DriverError> {
        self.write_register(address, MPU_REG_PWR_MGMT_1, MPU_PWR_WAKE)
            .await?;
        self.write_register(address, MPU_REG_GYRO_CONFIG, GYRO_RANGE.config_bits())
            .await?;
        self.write_register(address, MPU_REG_ACCEL_CONFIG, ACCEL_RANGE.config_bits())
            .await?;

        delay.delay_ms(MPU_WAKE_DELAY_MS).await;

        info!(
            "{} at {:#04x} initialised (±{}g, ±{}°/s)",
            model.name(),
            address,
            ACCEL_RANGE.full_scale(),
            GYRO_RANGE.full_scale()
        );

        Ok(SensorHandle {
            address,
            model,
            accel_range: ACCEL_RANGE,
            gyro_range: GYRO_RANGE,
        })
    }

    /// Burst-read accel, temperature and gyro registers and decode them
    pub async fn read_raw(&mut self, handle: &SensorHandle) -> Result<RawSample, DriverError> {
        let mut block = [0u8; MPU_DATA_BLOCK_LEN];
        self.i2c
            .read_regs(handle.address, MPU_REG_ACCEL_XOUT_H, &mut block)
            .await
            .map_err(|err| bus_failure(handle.address, err))?;
        Ok(decode_block(&block))
    }

    /// Read and convert one sample
    pub async fn read_physical(
        &mut self,
        handle: &SensorHandle,
    ) -> Result<PhysicalSample, DriverError> {
        let raw = self.read_raw(handle).await?;
        Ok(handle.to_physical(&raw))
    }

    /// Write to a register
    async fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), DriverError> {
        self.i2c
            .write_reg(address, reg, value)
            .await
            .map_err(|err| bus_failure(address, err))
    }
}

fn bus_failure(address: u8, err: BusError) -> DriverError {
    debug!("bus failure talking to {:#04x}: {}", address, err);
    DriverError::BusFailure(err)
}
