use embedded_hal_async::delay::DelayNs;
use hal::I2cDevice;

/// Platform binding: hands the IMU pipeline its bus and a delay source
pub trait Board
where
    Self: Sized,
{
    type I2c: I2cDevice;
    type Delay: DelayNs;

    fn name(&self) -> &str;

    fn split_resources(self) -> Resources<Self::I2c, Self::Delay>;
}

pub struct Resources<I, D> {
    pub i2c: I,
    pub delay: D,
}
