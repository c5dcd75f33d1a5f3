//! Simulated I2C bus with an MPU-family register file
//!
//! Used by the unit tests and by the host simulation board. Addresses that
//! host nothing NACK every transaction, like a real bus.

use std::collections::BTreeSet;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use hal::{to_raw, BusError, I2cDevice, Vector3d};

use crate::imu::mpu::{
    AccelRange, GyroRange, MPU_REG_ACCEL_CONFIG, MPU_REG_ACCEL_XOUT_H, MPU_REG_GYRO_CONFIG,
    MPU_REG_GYRO_XOUT_H, MPU_REG_PWR_MGMT_1, MPU_REG_TEMP_OUT_H, MPU_REG_WHO_AM_I,
    MPU_DATA_BLOCK_LEN, MPU_PWR_SLEEP,
};

const REGISTER_COUNT: usize = 128;

// Value a bystander device returns for any read
const BYSTANDER_BYTE: u8 = 0xFF;

/// Bus transaction, recorded for test verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write { addr: u8, data: Vec<u8> },
    Read { addr: u8, len: usize },
    WriteRead {
        addr: u8,
        write_data: Vec<u8>,
        read_len: usize,
    },
}

/// Register-level model of an MPU-family sensor
///
/// Powers up asleep, as the real part does after reset. While asleep the
/// data registers read as zero.
#[derive(Debug, Clone)]
pub struct SimMpu {
    registers: [u8; REGISTER_COUNT],
    data: [u8; MPU_DATA_BLOCK_LEN],
}

impl SimMpu {
    /// A freshly reset device reporting `who_am_i`
    pub fn new(who_am_i: u8) -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[MPU_REG_PWR_MGMT_1 as usize] = MPU_PWR_SLEEP;
        registers[MPU_REG_WHO_AM_I as usize] = who_am_i;
        Self {
            registers,
            data: [0u8; MPU_DATA_BLOCK_LEN],
        }
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.registers[reg as usize % REGISTER_COUNT]
    }

    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.registers[reg as usize % REGISTER_COUNT] = value;
    }

    /// Snapshot of the configuration registers
    pub fn registers(&self) -> [u8; REGISTER_COUNT] {
        self.registers
    }

    pub fn is_asleep(&self) -> bool {
        self.register(MPU_REG_PWR_MGMT_1) & MPU_PWR_SLEEP != 0
    }

    /// Raw contents of ACCEL_XOUT_H..GYRO_ZOUT_L
    pub fn set_data_block(&mut self, block: [u8; MPU_DATA_BLOCK_LEN]) {
        self.data = block;
    }

    /// Encode an acceleration in g with the currently configured range
    pub fn set_accel(&mut self, accel: Vector3d) {
        let fs = AccelRange::from_config(self.register(MPU_REG_ACCEL_CONFIG)).full_scale();
        self.write_axes(MPU_REG_ACCEL_XOUT_H, accel, fs);
    }

    /// Encode an angular rate in degrees per second with the currently configured range
    pub fn set_gyro(&mut self, gyro: Vector3d) {
        let fs = GyroRange::from_config(self.register(MPU_REG_GYRO_CONFIG)).full_scale();
        self.write_axes(MPU_REG_GYRO_XOUT_H, gyro, fs);
    }

    /// Raw temperature word
    pub fn set_temperature_raw(&mut self, raw: i16) {
        let offset = (MPU_REG_TEMP_OUT_H - MPU_REG_ACCEL_XOUT_H) as usize;
        self.data[offset..offset + 2].copy_from_slice(&raw.to_be_bytes());
    }

    fn write_axes(&mut self, first_reg: u8, value: Vector3d, full_scale: f32) {
        let offset = (first_reg - MPU_REG_ACCEL_XOUT_H) as usize;
        for (axis, component) in value.iter().enumerate() {
            let raw = to_raw(*component, full_scale);
            let at = offset + axis * 2;
            self.data[at..at + 2].copy_from_slice(&raw.to_be_bytes());
        }
    }

    fn read_byte(&self, reg: u8) -> u8 {
        let block = MPU_REG_ACCEL_XOUT_H as usize..MPU_REG_ACCEL_XOUT_H as usize + MPU_DATA_BLOCK_LEN;
        let reg = reg as usize % REGISTER_COUNT;
        if block.contains(&reg) {
            if self.is_asleep() {
                0
            } else {
                self.data[reg - block.start]
            }
        } else {
            self.registers[reg]
        }
    }

    fn write(&mut self, data: &[u8]) {
        // first byte selects the register, the rest auto-increment
        if let Some((&reg, values)) = data.split_first() {
            for (i, value) in values.iter().enumerate() {
                self.set_register(reg.wrapping_add(i as u8), *value);
            }
        }
    }

    fn write_read(&self, write_data: &[u8], read_data: &mut [u8]) {
        let start = write_data.first().copied().unwrap_or(0);
        for (i, byte) in read_data.iter_mut().enumerate() {
            *byte = self.read_byte(start.wrapping_add(i as u8));
        }
    }
}

/// In-memory I2C bus
#[derive(Debug, Default)]
pub struct SimBus {
    mpu: Option<(u8, SimMpu)>,
    bystanders: BTreeSet<u8>,
    skip: u32,
    failures: u32,
    failure: Option<BusError>,
    transactions: Vec<Transaction>,
}

impl SimBus {
    /// An empty bus: every address NACKs
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the sensor at `addr`, replacing any previous one
    pub fn with_mpu(mut self, addr: u8, mpu: SimMpu) -> Self {
        self.mpu = Some((addr, mpu));
        self
    }

    /// Attach a non-MPU device that acknowledges everything
    pub fn with_device(mut self, addr: u8) -> Self {
        self.bystanders.insert(addr);
        self
    }

    /// Detach the sensor, as if it was unplugged
    pub fn remove_mpu(&mut self) -> Option<SimMpu> {
        self.mpu.take().map(|(_, mpu)| mpu)
    }

    pub fn mpu(&self) -> Option<&SimMpu> {
        self.mpu.as_ref().map(|(_, mpu)| mpu)
    }

    pub fn mpu_mut(&mut self) -> Option<&mut SimMpu> {
        self.mpu.as_mut().map(|(_, mpu)| mpu)
    }

    /// Make the next `count` transactions fail with `error`
    pub fn fail_next(&mut self, count: u32, error: BusError) {
        self.fail_after(0, count, error);
    }

    /// Let `skip` transactions through, then fail the following `count`
    pub fn fail_after(&mut self, skip: u32, count: u32, error: BusError) {
        self.skip = skip;
        self.failures = count;
        self.failure = Some(error);
    }

    /// Get transaction log
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Clear transaction log
    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    fn injected_failure(&mut self) -> Option<BusError> {
        if self.failures == 0 {
            return None;
        }
        if self.skip > 0 {
            self.skip -= 1;
            return None;
        }
        self.failures -= 1;
        self.failure
    }

    fn device_at(&mut self, addr: u8) -> Result<Option<&mut SimMpu>, BusError> {
        if let Some(error) = self.injected_failure() {
            return Err(error);
        }
        let bystander = self.bystanders.contains(&addr);
        match &mut self.mpu {
            Some((mpu_addr, mpu)) if *mpu_addr == addr => Ok(Some(mpu)),
            _ if bystander => Ok(None),
            _ => Err(BusError::Nack),
        }
    }
}

impl I2cDevice for SimBus {
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError> {
        self.transactions.push(Transaction::Write {
            addr,
            data: data.to_vec(),
        });
        if let Some(mpu) = self.device_at(addr)? {
            mpu.write(data);
        }
        Ok(())
    }

    async fn read(&mut self, addr: u8, data: &mut [u8]) -> Result<(), BusError> {
        self.transactions.push(Transaction::Read {
            addr,
            len: data.len(),
        });
        match self.device_at(addr)? {
            // a bare read continues from register 0 on this model
            Some(mpu) => mpu.write_read(&[], data),
            None => data.fill(BYSTANDER_BYTE),
        }
        Ok(())
    }

    async fn write_read(
        &mut self,
        addr: u8,
        write_data: &[u8],
        read_data: &mut [u8],
    ) -> Result<(), BusError> {
        self.transactions.push(Transaction::WriteRead {
            addr,
            write_data: write_data.to_vec(),
            read_len: read_data.len(),
        });
        match self.device_at(addr)? {
            Some(mpu) => mpu.write_read(write_data, read_data),
            None => read_data.fill(BYSTANDER_BYTE),
        }
        Ok(())
    }
}

/// Delay that returns immediately and remembers how long it was asked to wait
#[derive(Debug, Default)]
pub struct NoopDelay {
    total_ns: u64,
}

impl NoopDelay {
    pub fn total_ms(&self) -> u32 {
        (self.total_ns / 1_000_000) as u32
    }
}

impl DelayNs for NoopDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}
