use driver::{detect, scan, Detection, DriverError, Mpu, SensorHandle};
use embedded_hal_async::delay::DelayNs;
use hal::I2cDevice;
use log::{info, warn};

use crate::{Board, Diagnostic, Readout, Resources, Tick};

/// Where the monitor is in the detect → init → read sequence
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorState {
    /// Detection exhausted every candidate
    NoSensor(Diagnostic),
    /// Detected, but `init` has not succeeded yet
    Pending(Detection),
    Ready(SensorHandle),
}

/// Owns the sensor for the session and runs the pipeline once per tick
///
/// Not re-entrant: the host must drive `tick` from a single task.
pub struct ImuMonitor<I: I2cDevice, D: DelayNs> {
    mpu: Mpu<I>,
    delay: D,
    state: MonitorState,
    last_good: Option<Readout>,
}

impl<I: I2cDevice, D: DelayNs> ImuMonitor<I, D> {
    /// Detect the sensor and try to initialise it once
    ///
    /// An `init` bus failure leaves the monitor pending; the next `tick`
    /// tries again.
    pub async fn start(resources: Resources<I, D>) -> Self {
        let Resources { i2c, delay } = resources;
        let mut monitor = ImuMonitor {
            mpu: Mpu::new(i2c),
            delay,
            state: MonitorState::NoSensor(Diagnostic::NoDevices),
            last_good: None,
        };
        monitor.redetect().await;
        monitor
    }

    /// Split a board's resources and start on them
    pub async fn start_board<B>(board: B) -> Self
    where
        B: Board<I2c = I, Delay = D>,
    {
        info!("starting IMU readout on {}", board.name());
        Self::start(board.split_resources()).await
    }

    /// Run detection again, discarding the current handle
    pub async fn redetect(&mut self) {
        let bus = self.mpu.bus_mut();
        self.state = match detect(bus).await {
            Some(detection) => MonitorState::Pending(detection),
            None => {
                let diagnostic = Diagnostic::from_scan(scan(bus).await);
                warn!("{}", diagnostic);
                MonitorState::NoSensor(diagnostic)
            }
        };

        if let MonitorState::Pending(detection) = self.state {
            if let Err(err) = self.init(detection).await {
                warn!("sensor init failed, will retry: {}", err);
            }
        }
    }

    /// One pass of read → convert → tilt
    pub async fn tick(&mut self) -> Tick {
        let handle = match &self.state {
            MonitorState::NoSensor(_) => return Tick::NoSensor,
            MonitorState::Ready(handle) => *handle,
            MonitorState::Pending(detection) => {
                let detection = *detection;
                match self.init(detection).await {
                    Ok(handle) => handle,
                    Err(err) => return self.unavailable(err),
                }
            }
        };

        match self.mpu.read_raw(&handle).await {
            Ok(raw) => {
                let readout = Readout::from_sample(handle.to_physical(&raw));
                self.last_good = Some(readout);
                Tick::Reading(readout)
            }
            Err(err) => self.unavailable(err),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn sensor(&self) -> Option<&SensorHandle> {
        match &self.state {
            MonitorState::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match &self.state {
            MonitorState::NoSensor(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }

    pub fn last_good(&self) -> Option<&Readout> {
        self.last_good.as_ref()
    }

    /// Mutable access to the bus, e.g. for a simulation to move the sensor
    pub fn bus_mut(&mut self) -> &mut I {
        self.mpu.bus_mut()
    }

    async fn init(&mut self, detection: Detection) -> Result<SensorHandle, DriverError> {
        let handle = self
            .mpu
            .init(detection.address, detection.model, &mut self.delay)
            .await?;
        self.state = MonitorState::Ready(handle);
        Ok(handle)
    }

    fn unavailable(&self, err: DriverError) -> Tick {
        warn!("IMU reading unavailable: {}", err);
        Tick::Unavailable {
            last_good: self.last_good,
        }
    }
}
