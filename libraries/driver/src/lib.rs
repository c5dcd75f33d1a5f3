#![no_std]

#[cfg(any(test, feature = "sim"))]
extern crate std;

pub mod i2c;
pub mod imu;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use i2c::HalI2c;
pub use imu::{
    detect, locate, scan, AccelRange, Detection, DriverError, GyroRange, Mpu, MpuModel, Probe,
    ScanResult, SensorHandle,
};
