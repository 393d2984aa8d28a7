use anyhow::Result;
use chrono::NaiveDateTime;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::flow::SimulationSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Readings per tag when the request does not say
    pub default_readings: usize,
    /// Requests asking for more are rejected
    pub max_readings: usize,
    pub timestep_seconds: u32,
    pub start_time: NaiveDateTime,
    /// Fixed sensor seed for reproducible runs; entropy when unset
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let settings = SimulationSettings::default();
        Self {
            default_readings: settings.readings,
            max_readings: 100_000,
            timestep_seconds: settings.timestep_seconds,
            start_time: settings.start_time,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn settings(&self, readings: usize) -> SimulationSettings {
        SimulationSettings {
            readings,
            timestep_seconds: self.timestep_seconds,
            start_time: self.start_time,
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `CARBON__*` variables, then `PORT`
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("CARBON__").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
    }

    pub fn load() -> Result<Self> {
        Ok(Self::figment().extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.simulation.default_readings, 720);
        assert_eq!(cfg.simulation.timestep_seconds, 5);
        assert_eq!(cfg.simulation.seed, None);
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [simulation]
                seed = 7
                start_time = "2025-06-01T12:00:00"

                [server]
                port = 9000
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.simulation.seed, Some(7));
        assert_eq!(cfg.simulation.max_readings, 100_000);

        let settings = cfg.simulation.settings(10);
        assert_eq!(settings.readings, 10);
        assert_eq!(settings.start_time.to_string(), "2025-06-01 12:00:00");
    }
}
