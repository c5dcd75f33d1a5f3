// IMU driver module: MPU-family detection, bus scan and the register-level driver
//
// Detection walks a fixed candidate list and treats any transport failure as
// "nothing there". The driver itself never retries; the periodic caller does.

use hal::{BusError, I2cDevice};
use heapless::Vec;
use log::{debug, info};
use thiserror::Error;

pub mod mpu;

pub use self::mpu::{
    AccelRange, GyroRange, Mpu, SensorHandle, ACCEL_RANGE, GYRO_RANGE, MPU_I2C_ADDR_PRIMARY,
    MPU_I2C_ADDR_SECONDARY, MPU_REG_WHO_AM_I,
};

/// Addresses an MPU-family part can answer on, in probe order
pub const MPU_CANDIDATE_ADDRESSES: [u8; 2] = [MPU_I2C_ADDR_PRIMARY, MPU_I2C_ADDR_SECONDARY];

// Non-reserved 7-bit address range probed by `scan`
pub const SCAN_FIRST_ADDR: u8 = 0x08;
pub const SCAN_LAST_ADDR: u8 = 0x77;
pub const SCAN_CAPACITY: usize = (SCAN_LAST_ADDR - SCAN_FIRST_ADDR + 1) as usize;

// WHO_AM_I identities
pub const WHO_AM_I_MPU6050: u8 = 0x68;
pub const WHO_AM_I_MPU6500: u8 = 0x70;
pub const WHO_AM_I_MPU9250: u8 = 0x71;
pub const WHO_AM_I_MPU9255: u8 = 0x73;
pub const WHO_AM_I_MPU6886: u8 = 0x19;

/// Addresses that answered a bus scan
pub type ScanResult = Vec<u8, SCAN_CAPACITY>;

/// Errors surfaced by the detector and the driver
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// No candidate address responded during detection
    #[error("no MPU-family sensor found")]
    NotDetected,

    /// A transaction failed during init or read
    #[error("bus failure: {0}")]
    BusFailure(#[from] BusError),
}

/// Chip identity decoded from WHO_AM_I
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpuModel {
    /// MPU6050 or MPU6000
    Mpu6050,
    Mpu6500,
    Mpu9250,
    Mpu9255,
    Mpu6886,
    /// Responded, but with an identity we do not know
    Unknown(u8),
}

impl MpuModel {
    pub fn from_who_am_i(id: u8) -> Self {
        match id {
            WHO_AM_I_MPU6050 => MpuModel::Mpu6050,
            WHO_AM_I_MPU6500 => MpuModel::Mpu6500,
            WHO_AM_I_MPU9250 => MpuModel::Mpu9250,
            WHO_AM_I_MPU9255 => MpuModel::Mpu9255,
            WHO_AM_I_MPU6886 => MpuModel::Mpu6886,
            other => MpuModel::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MpuModel::Mpu6050 => "MPU6050",
            MpuModel::Mpu6500 => "MPU6500",
            MpuModel::Mpu9250 => "MPU9250",
            MpuModel::Mpu9255 => "MPU9255",
            MpuModel::Mpu6886 => "MPU6886",
            MpuModel::Unknown(_) => "MPU (unknown id)",
        }
    }
}

/// A responding sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub address: u8,
    pub model: MpuModel,
}

/// Detection state machine over [`MPU_CANDIDATE_ADDRESSES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Next candidate to try
    Probing(usize),
    Found(Detection),
    Exhausted,
}

impl Probe {
    pub fn start() -> Self {
        Probe::Probing(0)
    }

    /// Candidate address the next step will read, if any
    pub fn candidate(&self) -> Option<u8> {
        match self {
            Probe::Probing(index) => MPU_CANDIDATE_ADDRESSES.get(*index).copied(),
            _ => None,
        }
    }

    /// Feed the result of reading WHO_AM_I at the current candidate
    pub fn advance(self, result: Result<u8, BusError>) -> Self {
        let Probe::Probing(index) = self else {
            return self;
        };
        let Some(address) = MPU_CANDIDATE_ADDRESSES.get(index).copied() else {
            return Probe::Exhausted;
        };

        match result {
            Ok(id) => Probe::Found(Detection {
                address,
                model: MpuModel::from_who_am_i(id),
            }),
            Err(err) => {
                debug!("no MPU at {:#04x}: {}", address, err);
                if index + 1 < MPU_CANDIDATE_ADDRESSES.len() {
                    Probe::Probing(index + 1)
                } else {
                    Probe::Exhausted
                }
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Probe::Probing(_))
    }
}

/// Find the first candidate address that answers a WHO_AM_I read
///
/// At most one read per candidate. Transport failures mean "not present".
pub async fn detect<I: I2cDevice>(bus: &mut I) -> Option<Detection> {
    let mut probe = Probe::start();
    while let Some(address) = probe.candidate() {
        let result = bus.read_reg(address, MPU_REG_WHO_AM_I).await;
        probe = probe.advance(result);
    }

    match probe {
        Probe::Found(detection) => {
            info!(
                "found {} at {:#04x}",
                detection.model.name(),
                detection.address
            );
            Some(detection)
        }
        _ => None,
    }
}

/// Like [`detect`], but reports exhaustion as [`DriverError::NotDetected`]
pub async fn locate<I: I2cDevice>(bus: &mut I) -> Result<Detection, DriverError> {
    detect(bus).await.ok_or(DriverError::NotDetected)
}

/// Probe every non-reserved address with a one-byte read
pub async fn scan<I: I2cDevice>(bus: &mut I) -> ScanResult {
    let mut found = ScanResult::new();
    for address in SCAN_FIRST_ADDR..=SCAN_LAST_ADDR {
        let mut byte = [0u8; 1];
        if bus.read(address, &mut byte).await.is_ok() {
            // capacity covers the whole range
            let _ = found.push(address);
        }
    }
    debug!("scan found {} device(s)", found.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBus, SimMpu, Transaction};
    use embassy_futures::block_on;
    use std::vec;

    #[test]
    fn test_detect_secondary_when_primary_nacks() {
        let mut bus = SimBus::new().with_mpu(0x69, SimMpu::new(WHO_AM_I_MPU6500));

        let detection = block_on(detect(&mut bus));

        assert_eq!(
            detection,
            Some(Detection {
                address: 0x69,
                model: MpuModel::Mpu6500,
            })
        );
    }

    #[test]
    fn test_detect_prefers_primary() {
        let mut bus = SimBus::new().with_mpu(0x68, SimMpu::new(WHO_AM_I_MPU6050));

        let detection = block_on(detect(&mut bus)).unwrap();

        assert_eq!(detection.address, 0x68);
        assert_eq!(bus.transactions().len(), 1);
    }

    #[test]
    fn test_detect_none_when_both_nack() {
        let mut bus = SimBus::new().with_device(0x3C);

        assert_eq!(block_on(detect(&mut bus)), None);
        assert_eq!(block_on(locate(&mut bus)), Err(DriverError::NotDetected));
    }

    #[test]
    fn test_detect_reads_at_most_one_register_per_candidate() {
        let mut bus = SimBus::new();
        block_on(detect(&mut bus));

        assert_eq!(
            bus.transactions(),
            vec![
                Transaction::WriteRead {
                    addr: 0x68,
                    write_data: vec![MPU_REG_WHO_AM_I],
                    read_len: 1,
                },
                Transaction::WriteRead {
                    addr: 0x69,
                    write_data: vec![MPU_REG_WHO_AM_I],
                    read_len: 1,
                },
            ]
        );
    }

    #[test]
    fn test_detect_leaves_device_untouched() {
        let mut bus = SimBus::new().with_mpu(0x68, SimMpu::new(WHO_AM_I_MPU6050));
        let before = bus.mpu().unwrap().registers();

        block_on(detect(&mut bus));

        assert_eq!(bus.mpu().unwrap().registers(), before);
    }

    #[test]
    fn test_detect_skips_transient_failure_on_primary() {
        let mut bus = SimBus::new()
            .with_mpu(0x68, SimMpu::new(WHO_AM_I_MPU6050))
            .with_device(0x69);
        bus.fail_next(1, BusError::Timeout);

        let detection = block_on(detect(&mut bus)).unwrap();

        assert_eq!(detection.address, 0x69);
        assert_eq!(detection.model, MpuModel::Unknown(0xFF));
    }

    #[test]
    fn test_probe_state_machine() {
        let probe = Probe::start();
        assert_eq!(probe.candidate(), Some(0x68));

        let probe = probe.advance(Err(BusError::Nack));
        assert_eq!(probe, Probe::Probing(1));
        assert_eq!(probe.candidate(), Some(0x69));

        let exhausted = probe.advance(Err(BusError::Nack));
        assert_eq!(exhausted, Probe::Exhausted);
        assert!(exhausted.is_terminal());
        assert_eq!(exhausted.candidate(), None);
        assert_eq!(exhausted.advance(Ok(0x68)), Probe::Exhausted);

        let found = Probe::Probing(1).advance(Ok(WHO_AM_I_MPU9250));
        assert_eq!(
            found,
            Probe::Found(Detection {
                address: 0x69,
                model: MpuModel::Mpu9250,
            })
        );
    }

    #[test]
    fn test_model_from_who_am_i() {
        assert_eq!(MpuModel::from_who_am_i(0x68), MpuModel::Mpu6050);
        assert_eq!(MpuModel::from_who_am_i(0x19), MpuModel::Mpu6886);
        assert_eq!(MpuModel::from_who_am_i(0x73), MpuModel::Mpu9255);
        assert_eq!(MpuModel::from_who_am_i(0x42), MpuModel::Unknown(0x42));
    }

    #[test]
    fn test_scan_lists_responders() {
        let mut bus = SimBus::new()
            .with_device(0x3C)
            .with_mpu(0x69, SimMpu::new(WHO_AM_I_MPU6050))
            .with_device(0x51);

        let found = block_on(scan(&mut bus));

        assert_eq!(found.as_slice(), &[0x3C, 0x51, 0x69]);
        assert_eq!(bus.transactions().len(), SCAN_CAPACITY);
    }

    #[test]
    fn test_scan_empty_bus() {
        let mut bus = SimBus::new();
        assert!(block_on(scan(&mut bus)).is_empty());
    }
}
