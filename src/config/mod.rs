pub mod database;

use std::collections::HashSet;
use std::env;
use std::str::FromStr;

use crate::logger::LogFormat;
use crate::models::NavigationStatus;
use crate::services::detector::DetectorSettings;
use crate::services::detention::{DetentionTariff, DEFAULT_DAY_RATE};
use crate::services::events::DEFAULT_EVENT_BUFFER;
use crate::services::port_locator::{PortLocator, DEFAULT_BBOX_DEGREES, DEFAULT_SEARCH_RADIUS_NM};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub detention_day_rate: f64,
    pub port_search_radius_nm: f64,
    pub port_bbox_degrees: f64,
    pub stationary_statuses: Vec<NavigationStatus>,
    pub count_arriving_vessel: bool,
    pub event_buffer: usize,
    pub log_format: LogFormat,
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let stationary_statuses = env::var("STATIONARY_STATUSES")
            .unwrap_or_else(|_| "AT_ANCHOR,MOORED".to_string())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.parse::<NavigationStatus>()
                    .map_err(|e| anyhow::anyhow!("Invalid STATIONARY_STATUSES value: {}", e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if stationary_statuses.is_empty() {
            anyhow::bail!("STATIONARY_STATUSES must name at least one status");
        }

        let config = EngineConfig {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 25)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", 5)?,
            db_acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            detention_day_rate: parse_var("DETENTION_DAY_RATE", DEFAULT_DAY_RATE)?,
            port_search_radius_nm: parse_var("PORT_SEARCH_RADIUS_NM", DEFAULT_SEARCH_RADIUS_NM)?,
            port_bbox_degrees: parse_var("PORT_BBOX_DEGREES", DEFAULT_BBOX_DEGREES)?,
            stationary_statuses,
            count_arriving_vessel: parse_var("COUNT_ARRIVING_VESSEL", false)?,
            event_buffer: parse_var("EVENT_BUFFER", DEFAULT_EVENT_BUFFER)?,
            log_format: parse_var("LOG_FORMAT", LogFormat::Pretty)?,
        };

        if config.detention_day_rate < 0.0 || !config.detention_day_rate.is_finite() {
            anyhow::bail!("DETENTION_DAY_RATE must be a non-negative number");
        }
        if config.port_search_radius_nm <= 0.0 || config.port_bbox_degrees <= 0.0 {
            anyhow::bail!("PORT_SEARCH_RADIUS_NM and PORT_BBOX_DEGREES must be positive");
        }

        Ok(config)
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            locator: PortLocator::new(self.port_search_radius_nm, self.port_bbox_degrees),
            tariff: DetentionTariff::new(self.detention_day_rate),
            stationary: self.stationary_statuses.iter().copied().collect::<HashSet<_>>(),
            include_arriving_vessel: self.count_arriving_vessel,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} value {:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "DATABASE_URL",
        "DETENTION_DAY_RATE",
        "STATIONARY_STATUSES",
        "PORT_SEARCH_RADIUS_NM",
        "LOG_FORMAT",
        "DB_MAX_CONNECTIONS",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        env::set_var("DATABASE_URL", "postgres://localhost/harborwatch");

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.detention_day_rate, 10_000.0);
        assert_eq!(config.port_search_radius_nm, 50.0);
        assert_eq!(config.port_bbox_degrees, 0.5);
        assert_eq!(config.db_max_connections, 25);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.count_arriving_vessel);

        let settings = config.detector_settings();
        assert!(settings.is_stationary(NavigationStatus::AtAnchor));
        assert!(settings.is_stationary(NavigationStatus::Moored));
        assert!(!settings.is_stationary(NavigationStatus::Underway));
        clear();
    }

    #[test]
    #[serial]
    fn test_missing_database_url_is_an_error() {
        clear();
        assert!(EngineConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        env::set_var("DATABASE_URL", "postgres://localhost/harborwatch");
        env::set_var("DETENTION_DAY_RATE", "15000");
        env::set_var("STATIONARY_STATUSES", "at_anchor, moored, aground");
        env::set_var("LOG_FORMAT", "json");

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.detector_settings().tariff.day_rate, 15_000.0);
        assert!(config.stationary_statuses.contains(&NavigationStatus::Aground));
        assert_eq!(config.log_format, LogFormat::Json);
        clear();
    }

    #[test]
    #[serial]
    fn test_malformed_values_are_rejected() {
        clear();
        env::set_var("DATABASE_URL", "postgres://localhost/harborwatch");
        env::set_var("DB_MAX_CONNECTIONS", "lots");
        assert!(EngineConfig::from_env().is_err());

        env::remove_var("DB_MAX_CONNECTIONS");
        env::set_var("STATIONARY_STATUSES", "DRIFTING");
        assert!(EngineConfig::from_env().is_err());
        clear();
    }
}
