use std::time::Instant;

use env_logger::Env;
use hal::BusError;
use log::{error, info, warn};
use readout::{ImuMonitor, Readout, Tick};

mod board;
mod config;
mod motion;

use board::SimulatedBoard;
use config::SitlConfig;
use motion::TiltSweep;

enum State {
    Initializing,
    Running,
    Stopping,
}

fn format_readout(readout: &Readout) -> String {
    let a = readout.sample.accel;
    let g = readout.sample.gyro;
    format!(
        "accel (g) X:{:6.2} Y:{:6.2} Z:{:6.2} | gyro (deg/s) X:{:6.1} Y:{:6.1} Z:{:6.1} | pitch {:6.1} deg roll {:6.1} deg",
        a.x, a.y, a.z, g.x, g.y, g.z, readout.orientation.pitch, readout.orientation.roll
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = SitlConfig::from_env()?;
    let sweep = TiltSweep::default();
    let mut state = State::Initializing;
    let mut monitor = None;
    let mut interval = tokio::time::interval(config.tick);
    let started = Instant::now();
    let mut tick_count: u64 = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        match state {
            State::Initializing => {
                info!("Initializing IMU...");
                let board = SimulatedBoard::new(&config);
                let started_monitor = ImuMonitor::start_board(board).await;
                if let Some(diagnostic) = started_monitor.diagnostic() {
                    error!("IMU Error: {}", diagnostic);
                    state = State::Stopping;
                } else {
                    monitor = Some(started_monitor);
                    state = State::Running;
                }
            }
            State::Running => {
                let Some(monitor) = monitor.as_mut() else {
                    state = State::Stopping;
                    continue;
                };

                tokio::select! {
                    _ = &mut ctrl_c => {
                        state = State::Stopping;
                        continue;
                    }
                    _ = interval.tick() => {}
                }

                let t = started.elapsed().as_secs_f32();
                if let Some(mpu) = monitor.bus_mut().mpu_mut() {
                    mpu.set_accel(sweep.accel(t));
                    mpu.set_gyro(sweep.gyro(t));
                    mpu.set_temperature_raw(sweep.temperature_raw(t));
                }
                tick_count += 1;
                if let Some(every) = config.fail_every {
                    if tick_count % every == 0 {
                        monitor.bus_mut().fail_next(1, BusError::Timeout);
                    }
                }

                match monitor.tick().await {
                    Tick::Reading(readout) => info!("{}", format_readout(&readout)),
                    Tick::Unavailable { last_good } => match last_good {
                        Some(readout) => warn!("Read error! last: {}", format_readout(&readout)),
                        None => warn!("Read error!"),
                    },
                    Tick::NoSensor => state = State::Stopping,
                }

                if config.ticks.is_some_and(|limit| tick_count >= limit) {
                    state = State::Stopping;
                }
            }
            State::Stopping => {
                info!("Stopping after {} ticks", tick_count);
                break;
            }
        }
    }
    Ok(())
}
