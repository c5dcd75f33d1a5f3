#![no_std]

mod board;
mod monitor;
mod reading;

pub use board::{Board, Resources};
pub use monitor::{ImuMonitor, MonitorState};
pub use reading::{Diagnostic, Readout, Tick};
