use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the JSON key-value groups.
    pub data_dir: PathBuf,
    /// Nominal interval between tracked location fixes.
    pub location_interval: Duration,
    /// Fastest interval the platform source may deliver fixes at.
    pub location_fastest: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let data_dir = env::var("PHONE_SECURE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let location_interval_secs: u64 = env::var("LOCATION_INTERVAL_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let location_fastest_secs: u64 = env::var("LOCATION_FASTEST_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;

        if location_interval_secs == 0 {
            return Err("LOCATION_INTERVAL_SECS must be greater than zero".into());
        }
        if location_fastest_secs > location_interval_secs {
            return Err("LOCATION_FASTEST_SECS cannot exceed LOCATION_INTERVAL_SECS".into());
        }

        Ok(Config {
            data_dir,
            location_interval: Duration::from_secs(location_interval_secs),
            location_fastest: Duration::from_secs(location_fastest_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            location_interval: Duration::from_secs(10),
            location_fastest: Duration::from_secs(5),
        }
    }
}
