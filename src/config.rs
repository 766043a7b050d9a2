use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::optimizer::{EngineKind, MicrogridConfig, SolveOptions};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "MICROGRID__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub microgrid: MicrogridConfig,
    pub solver: SolverConfig,
    pub economics: EconomicsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub engine: EngineKind,
    pub time_limit_s: f64,
    pub relative_gap: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::MicroLp,
            time_limit_s: 30.0,
            relative_gap: 0.05,
        }
    }
}

impl SolverConfig {
    pub fn options(&self) -> SolveOptions {
        SolveOptions::new(Duration::from_secs_f64(self.time_limit_s), self.relative_gap)
    }
}

/// Installed-cost assumptions for payback figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsConfig {
    pub battery_capex_per_kwh: f64,
    pub solar_capex_per_kw: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            battery_capex_per_kwh: 1000.0,
            solar_capex_per_kw: 4000.0,
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml` if present, then `MICROGRID__*` env vars.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Like [`Config::load`] with an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|err| DispatchError::Configuration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.microgrid.validate()?;

        if !self.solver.time_limit_s.is_finite() || self.solver.time_limit_s <= 0.0 {
            return Err(DispatchError::Configuration(format!(
                "solver.time_limit_s must be positive: {}",
                self.solver.time_limit_s
            )));
        }
        if !(0.0..1.0).contains(&self.solver.relative_gap) {
            return Err(DispatchError::Configuration(format!(
                "solver.relative_gap must be in [0, 1): {}",
                self.solver.relative_gap
            )));
        }
        if !(self.economics.battery_capex_per_kwh >= 0.0 && self.economics.solar_capex_per_kw >= 0.0) {
            return Err(DispatchError::Configuration(
                "economics capex figures cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}
