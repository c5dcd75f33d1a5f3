use std::time::Duration;

use driver::sim::{SimBus, SimMpu};
use driver::imu::WHO_AM_I_MPU6886;
use embedded_hal_async::delay::DelayNs;
use readout::{Board, Resources};

use crate::config::SitlConfig;

/// Delay backed by the tokio timer
#[derive(Debug, Default)]
pub struct TokioDelay;

impl DelayNs for TokioDelay {
    async fn delay_ns(&mut self, ns: u32) {
        tokio::time::sleep(Duration::from_nanos(ns as u64)).await;
    }
}

/// Host board whose I2C bus is simulated in memory
pub struct SimulatedBoard {
    bus: SimBus,
}

impl SimulatedBoard {
    pub fn new(config: &SitlConfig) -> Self {
        let mut bus = SimBus::new();
        if let Some(addr) = config.imu_addr {
            // the Cardputer's IMU identifies as an MPU6886
            bus = bus.with_mpu(addr, SimMpu::new(WHO_AM_I_MPU6886));
        }
        for addr in &config.bystanders {
            bus = bus.with_device(*addr);
        }
        SimulatedBoard { bus }
    }
}

impl Board for SimulatedBoard {
    type I2c = SimBus;
    type Delay = TokioDelay;

    fn name(&self) -> &str {
        "SITL"
    }

    fn split_resources(self) -> Resources<SimBus, TokioDelay> {
        Resources {
            i2c: self.bus,
            delay: TokioDelay,
        }
    }
}
