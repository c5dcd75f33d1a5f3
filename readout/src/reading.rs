use core::fmt;

use ahrs::Orientation;
use driver::ScanResult;
use hal::PhysicalSample;

/// One successful pass through the pipeline
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub orientation: Orientation,
    pub sample: PhysicalSample,
}

impl Readout {
    pub fn from_sample(sample: PhysicalSample) -> Self {
        Readout {
            orientation: Orientation::from_accel(&sample.accel),
            sample,
        }
    }
}

/// What the renderer gets each refresh tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    Reading(Readout),
    /// The bus failed this tick; `last_good` is the most recent reading, if any
    Unavailable { last_good: Option<Readout> },
    /// Detection failed at startup; no bus traffic is generated
    NoSensor,
}

/// Why no sensor was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Nothing acknowledged anywhere on the bus
    NoDevices,
    /// Other devices answered, none of them on an MPU address
    NoMpu { devices: ScanResult },
}

impl Diagnostic {
    pub fn from_scan(devices: ScanResult) -> Self {
        if devices.is_empty() {
            Diagnostic::NoDevices
        } else {
            Diagnostic::NoMpu { devices }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoDevices => write!(f, "No I2C devices found"),
            Diagnostic::NoMpu { devices } => {
                write!(f, "No MPU found. Devices: ")?;
                for (i, addr) in devices.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "0x{:02X}", addr)?;
                }
                Ok(())
            }
        }
    }
}
