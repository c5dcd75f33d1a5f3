//! # AHRS - Attitude reference from the accelerometer
//!
//! Tilt (pitch and roll) derived from the direction of the measured gravity
//! vector. No gyroscope data is integrated, so the estimate only holds while
//! the device is close to static.
//!
//! ## Platform Support
//!
//! The crate is `no_std`; trigonometry goes through `num-traits` with its
//! `libm` backend. The **desktop** feature turns on `std` support in nalgebra
//! for host builds.
#![no_std]

#[cfg(test)]
extern crate std;

pub mod tilt;

pub use tilt::{compute, Orientation};
