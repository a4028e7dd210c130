//! Configuration loading from TOML
//!
//! # Configuration File Format
//!
//! ```toml
//! [station]
//! team_number = 1234
//! protocol = "2015"       # "2014" | "2015" | "2016" | "2020"
//!
//! [network]
//! # Optional manual overrides. When non-empty, these take precedence over
//! # the addresses the protocol derives from the team number.
//! robot_address = "10.12.34.2"
//! radio_address = ""
//! fms_address = ""
//! ```
//!
//! Both sections are optional; an absent file yields the defaults (team 0,
//! 2020 protocol, no overrides). Team 0 is the unconfigured placeholder —
//! the station will run, but the derived robot/radio addresses are useless
//! until a real team number is set.

use crate::error::{Error, Result};
use crate::protocol::Era;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Largest team number whose `10.TE.AM.x` address is expressible
/// (TE = team / 100 must fit an octet).
pub const MAX_TEAM_NUMBER: u16 = 25599;

/// Station identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    /// FRC team number, 1-25599 (0 = unconfigured)
    #[serde(default)]
    pub team_number: u16,

    /// Protocol era selector: "2014", "2015", "2016" or "2020"
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "2020".to_string()
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            team_number: 0,
            protocol: default_protocol(),
        }
    }
}

/// Manual address overrides
///
/// Empty strings mean "use the address derived by the protocol". Useful on
/// networks where mDNS does not work and the robot sits at a known IP.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub robot_address: String,

    #[serde(default)]
    pub radio_address: String,

    #[serde(default)]
    pub fms_address: String,
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Validation
    ///
    /// - `team_number` must be 0 (unconfigured) or within 1-25599
    /// - `protocol` must name a supported era
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = basic_toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges without touching the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.station.team_number > MAX_TEAM_NUMBER {
            return Err(Error::Config(format!(
                "team_number must be at most {} (got {})",
                MAX_TEAM_NUMBER, self.station.team_number
            )));
        }

        // Fails with a list of supported eras if the string is unknown
        self.era()?;

        Ok(())
    }

    /// Parse the configured protocol era
    pub fn era(&self) -> Result<Era> {
        self.station
            .protocol
            .parse()
            .map_err(|_| {
                Error::Config(format!(
                    "Unknown protocol \"{}\" (supported: 2014, 2015, 2016, 2020)",
                    self.station.protocol
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let toml = r#"
            [station]
            team_number = 1234
            protocol = "2015"

            [network]
            robot_address = "10.12.34.2"
        "#;
        let config: Config = basic_toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.station.team_number, 1234);
        assert_eq!(config.era().unwrap(), Era::Frc2015);
        assert_eq!(config.network.robot_address, "10.12.34.2");
        assert!(config.network.radio_address.is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.station.team_number, 0);
        assert_eq!(config.era().unwrap(), Era::Frc2020);
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let config: Config = basic_toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.era().unwrap(), Era::Frc2020);
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        let toml = r#"
            [station]
            protocol = "2017"
        "#;
        let config: Config = basic_toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_team_number_out_of_range() {
        let toml = r#"
            [station]
            team_number = 25600
        "#;
        let config: Config = basic_toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
