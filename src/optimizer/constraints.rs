use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Diesel CO2 emissions factor (tonnes CO2 per litre burned).
///
/// Converts a carbon tax in $/ton into a surcharge in $/L. Fixed physical
/// constant, not a tunable parameter.
pub const DIESEL_CO2_TONNES_PER_LITRE: f64 = 0.00268;

/// Objective weight per kW of curtailed solar.
///
/// Tie-breaker only: negligible next to fuel cost, it stops the optimizer from
/// curtailing when curtailment changes nothing.
pub const CURTAILMENT_PENALTY_PER_KW: f64 = 0.01;

/// Economic and physical parameters of one microgrid.
///
/// Units are fixed: kW, kWh, $/L, $/ton, L/hr, L/kWh, fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrogridConfig {
    /// Diesel generator rated output (kW)
    pub diesel_capacity_kw: f64,
    /// Minimum stable loading while committed (kW)
    pub diesel_min_stable_kw: f64,
    /// Fuel burned per committed hour regardless of output (L/hr)
    pub diesel_intercept_l_per_hr: f64,
    /// Marginal fuel per kWh produced (L/kWh)
    pub diesel_slope_l_per_kwh: f64,
    pub fuel_price_per_l: f64,
    pub carbon_tax_per_ton: f64,
    pub battery_capacity_kwh: f64,
    /// Charge and discharge rate limit (kW)
    pub battery_power_kw: f64,
    /// Round-trip efficiency split evenly across both legs, in (0, 1]
    pub battery_efficiency: f64,
    pub solar_capacity_kw: f64,
}

impl Default for MicrogridConfig {
    /// Remote northern community defaults (2025 fuel and carbon prices).
    fn default() -> Self {
        Self {
            diesel_capacity_kw: 500.0,
            diesel_min_stable_kw: 150.0,
            diesel_intercept_l_per_hr: 15.0,
            diesel_slope_l_per_kwh: 0.24,
            fuel_price_per_l: 2.20,
            carbon_tax_per_ton: 95.0,
            battery_capacity_kwh: 1000.0,
            battery_power_kw: 250.0,
            battery_efficiency: 0.95,
            solar_capacity_kw: 400.0,
        }
    }
}

impl MicrogridConfig {
    fn magnitudes(&self) -> [(&'static str, f64); 10] {
        [
            ("diesel_capacity_kw", self.diesel_capacity_kw),
            ("diesel_min_stable_kw", self.diesel_min_stable_kw),
            ("diesel_intercept_l_per_hr", self.diesel_intercept_l_per_hr),
            ("diesel_slope_l_per_kwh", self.diesel_slope_l_per_kwh),
            ("fuel_price_per_l", self.fuel_price_per_l),
            ("carbon_tax_per_ton", self.carbon_tax_per_ton),
            ("battery_capacity_kwh", self.battery_capacity_kwh),
            ("battery_power_kw", self.battery_power_kw),
            ("battery_efficiency", self.battery_efficiency),
            ("solar_capacity_kw", self.solar_capacity_kw),
        ]
    }

    /// Validate the parameter invariants
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.magnitudes() {
            if !value.is_finite() {
                return Err(DispatchError::Configuration(format!(
                    "{} is not finite: {}",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(DispatchError::Configuration(format!(
                    "{} cannot be negative: {}",
                    name, value
                )));
            }
        }

        if self.diesel_min_stable_kw > self.diesel_capacity_kw {
            return Err(DispatchError::Configuration(format!(
                "diesel_min_stable_kw ({}) must be <= diesel_capacity_kw ({})",
                self.diesel_min_stable_kw, self.diesel_capacity_kw
            )));
        }

        if self.battery_efficiency <= 0.0 || self.battery_efficiency > 1.0 {
            return Err(DispatchError::Configuration(format!(
                "battery_efficiency must be in (0, 1]: {}",
                self.battery_efficiency
            )));
        }

        Ok(())
    }

    /// Fuel price inflated by the carbon tax equivalent ($/L)
    pub fn effective_fuel_price(&self) -> f64 {
        self.fuel_price_per_l + self.carbon_tax_per_ton * DIESEL_CO2_TONNES_PER_LITRE
    }

    /// Cost of keeping the generator committed for one hour ($)
    pub fn intercept_cost(&self) -> f64 {
        self.diesel_intercept_l_per_hr * self.effective_fuel_price()
    }

    /// Marginal cost per kWh of diesel output ($/kWh)
    pub fn slope_cost(&self) -> f64 {
        self.diesel_slope_l_per_kwh * self.effective_fuel_price()
    }

    /// Battery energy at the start of every horizon (kWh)
    pub fn initial_soc_kwh(&self) -> f64 {
        0.5 * self.battery_capacity_kwh
    }

    /// Fuel burned for a committed hour at `power_kw` (L)
    pub fn fuel_litres(&self, committed: bool, power_kw: f64) -> f64 {
        if committed {
            self.diesel_intercept_l_per_hr + self.diesel_slope_l_per_kwh * power_kw
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = MicrogridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_soc_kwh(), 500.0);
    }

    #[test]
    fn test_effective_price_includes_carbon() {
        let config = MicrogridConfig::default();
        // 2.20 + 95 * 0.00268
        assert!((config.effective_fuel_price() - 2.4546).abs() < 1e-9);
        assert!((config.intercept_cost() - 15.0 * 2.4546).abs() < 1e-9);
        assert!((config.slope_cost() - 0.24 * 2.4546).abs() < 1e-9);
    }

    #[test]
    fn test_fuel_litres() {
        let config = MicrogridConfig::default();
        assert_eq!(config.fuel_litres(false, 0.0), 0.0);
        assert!((config.fuel_litres(true, 200.0) - 63.0).abs() < 1e-9);
    }

    #[rstest]
    #[case::negative_capacity(|c: &mut MicrogridConfig| c.diesel_capacity_kw = -1.0)]
    #[case::min_stable_above_capacity(|c: &mut MicrogridConfig| c.diesel_min_stable_kw = 600.0)]
    #[case::zero_efficiency(|c: &mut MicrogridConfig| c.battery_efficiency = 0.0)]
    #[case::efficiency_above_one(|c: &mut MicrogridConfig| c.battery_efficiency = 1.01)]
    #[case::nan_price(|c: &mut MicrogridConfig| c.fuel_price_per_l = f64::NAN)]
    #[case::negative_carbon(|c: &mut MicrogridConfig| c.carbon_tax_per_ton = -5.0)]
    #[case::infinite_solar(|c: &mut MicrogridConfig| c.solar_capacity_kw = f64::INFINITY)]
    fn test_invalid_config_rejected(#[case] mutate: fn(&mut MicrogridConfig)) {
        let mut config = MicrogridConfig::default();
        mutate(&mut config);
        assert!(matches!(
            config.validate(),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_battery_and_solar_are_valid() {
        let config = MicrogridConfig {
            battery_capacity_kwh: 0.0,
            battery_power_kw: 0.0,
            solar_capacity_kw: 0.0,
            ..MicrogridConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_min_stable_above_capacity_always_rejected(
            capacity in 0.0f64..1000.0,
            excess in 0.001f64..500.0,
        ) {
            let config = MicrogridConfig {
                diesel_capacity_kw: capacity,
                diesel_min_stable_kw: capacity + excess,
                ..MicrogridConfig::default()
            };
            prop_assert!(config.validate().is_err());
        }

        #[test]
        fn prop_in_range_config_validates(
            capacity in 0.0f64..2000.0,
            min_fraction in 0.0f64..=1.0,
            efficiency in 0.01f64..=1.0,
            battery in 0.0f64..5000.0,
            carbon in 0.0f64..300.0,
        ) {
            let config = MicrogridConfig {
                diesel_capacity_kw: capacity,
                diesel_min_stable_kw: capacity * min_fraction,
                battery_efficiency: efficiency,
                battery_capacity_kwh: battery,
                carbon_tax_per_ton: carbon,
                ..MicrogridConfig::default()
            };
            prop_assert!(config.validate().is_ok());
            prop_assert!(config.effective_fuel_price() >= config.fuel_price_per_l);
        }
    }
}
