#![no_std]

#[cfg(test)]
extern crate std;
extern crate nalgebra;

mod bus;
mod imu;

pub use bus::*;
pub use imu::*;
