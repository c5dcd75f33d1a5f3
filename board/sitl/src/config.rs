use std::time::Duration;

use anyhow::{bail, Context};

const DEFAULT_IMU_ADDR: u8 = 0x68;
const DEFAULT_TICK_MS: u64 = 100; // ~10 Hz refresh

/// Simulation settings, read from `SITL_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitlConfig {
    /// Where the simulated MPU answers; `None` leaves the bus without one
    pub imu_addr: Option<u8>,
    /// Extra non-MPU devices on the bus
    pub bystanders: Vec<u8>,
    /// Stop after this many ticks
    pub ticks: Option<u64>,
    pub tick: Duration,
    /// Inject a bus failure every N ticks
    pub fail_every: Option<u64>,
}

impl Default for SitlConfig {
    fn default() -> Self {
        Self {
            imu_addr: Some(DEFAULT_IMU_ADDR),
            bystanders: Vec::new(),
            ticks: None,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            fail_every: None,
        }
    }
}

impl SitlConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = SitlConfig::default();

        if let Some(value) = lookup("SITL_IMU_ADDR") {
            config.imu_addr = match value.trim() {
                "none" => None,
                addr => Some(parse_address(addr).context("SITL_IMU_ADDR")?),
            };
        }
        if let Some(value) = lookup("SITL_BYSTANDERS") {
            config.bystanders = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_address)
                .collect::<anyhow::Result<_>>()
                .context("SITL_BYSTANDERS")?;
        }
        if let Some(value) = lookup("SITL_TICKS") {
            config.ticks = Some(value.trim().parse().context("SITL_TICKS")?);
        }
        if let Some(value) = lookup("SITL_TICK_MS") {
            let ms: u64 = value.trim().parse().context("SITL_TICK_MS")?;
            if ms == 0 {
                bail!("SITL_TICK_MS must be positive");
            }
            config.tick = Duration::from_millis(ms);
        }
        if let Some(value) = lookup("SITL_FAIL_EVERY") {
            let every: u64 = value.trim().parse().context("SITL_FAIL_EVERY")?;
            config.fail_every = (every > 0).then_some(every);
        }

        Ok(config)
    }
}

/// Parse a 7-bit address written as `0x68` or `104`
fn parse_address(text: &str) -> anyhow::Result<u8> {
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse(),
    }
    .with_context(|| format!("invalid I2C address {:?}", text))?;

    if value > 0x7F {
        bail!("I2C address {:#04x} is not 7-bit", value);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SitlConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SitlConfig::default());
        assert_eq!(config.imu_addr, Some(0x68));
        assert_eq!(config.tick, Duration::from_millis(100));
    }

    #[test]
    fn test_overrides() {
        let config = SitlConfig::from_lookup(lookup(&[
            ("SITL_IMU_ADDR", "0x69"),
            ("SITL_BYSTANDERS", "0x3C, 81"),
            ("SITL_TICKS", "25"),
            ("SITL_TICK_MS", "50"),
            ("SITL_FAIL_EVERY", "7"),
        ]))
        .unwrap();

        assert_eq!(config.imu_addr, Some(0x69));
        assert_eq!(config.bystanders, vec![0x3C, 0x51]);
        assert_eq!(config.ticks, Some(25));
        assert_eq!(config.tick, Duration::from_millis(50));
        assert_eq!(config.fail_every, Some(7));
    }

    #[test]
    fn test_no_imu() {
        let config = SitlConfig::from_lookup(lookup(&[("SITL_IMU_ADDR", "none")])).unwrap();
        assert_eq!(config.imu_addr, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(SitlConfig::from_lookup(lookup(&[("SITL_IMU_ADDR", "0x80")])).is_err());
        assert!(SitlConfig::from_lookup(lookup(&[("SITL_IMU_ADDR", "zz")])).is_err());
        assert!(SitlConfig::from_lookup(lookup(&[("SITL_TICK_MS", "0")])).is_err());
        assert!(SitlConfig::from_lookup(lookup(&[("SITL_TICKS", "-1")])).is_err());
    }
}
