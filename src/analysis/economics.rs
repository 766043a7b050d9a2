//! Fuel, cost and payback figures for a solved dispatch
//!
//! The baseline is a diesel-only plant: generator committed every hour,
//! serving the full load.

use serde::{Deserialize, Serialize};

use crate::config::EconomicsConfig;
use crate::domain::{DispatchResult, HorizonSeries};
use crate::optimizer::{MicrogridConfig, DIESEL_CO2_TONNES_PER_LITRE};

const HOURS_PER_YEAR: f64 = 8760.0;

/// Fuel burned by the optimized dispatch (L)
pub fn fuel_litres(result: &DispatchResult, config: &MicrogridConfig) -> f64 {
    result
        .iter()
        .map(|r| config.fuel_litres(r.is_generator_on(), r.gen_power))
        .sum()
}

/// Fuel a diesel-only plant would burn serving the same horizon (L)
pub fn baseline_fuel_litres(horizon: &HorizonSeries, config: &MicrogridConfig) -> f64 {
    horizon.len() as f64 * config.diesel_intercept_l_per_hr
        + horizon.total_load_kwh() * config.diesel_slope_l_per_kwh
}

/// Up-front cost of the installed battery and solar ($)
pub fn capex(config: &MicrogridConfig, economics: &EconomicsConfig) -> f64 {
    config.battery_capacity_kwh * economics.battery_capex_per_kwh
        + config.solar_capacity_kw * economics.solar_capex_per_kw
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub hours: usize,
    pub baseline_fuel_l: f64,
    pub optimized_fuel_l: f64,
    /// Effective fuel price used for both costs ($/L, carbon included)
    pub effective_fuel_price: f64,
    pub baseline_cost: f64,
    pub optimized_cost: f64,
    pub savings: f64,
    /// Savings as a fraction of the baseline cost
    pub savings_fraction: f64,
    pub co2_avoided_tonnes: f64,
    pub diesel_energy_kwh: f64,
    pub solar_used_kwh: f64,
    pub capex: f64,
}

impl CostSummary {
    pub fn compute(
        horizon: &HorizonSeries,
        result: &DispatchResult,
        config: &MicrogridConfig,
        economics: &EconomicsConfig,
    ) -> Self {
        let price = config.effective_fuel_price();
        let baseline_fuel_l = baseline_fuel_litres(horizon, config);
        let optimized_fuel_l = fuel_litres(result, config);
        let baseline_cost = baseline_fuel_l * price;
        let optimized_cost = optimized_fuel_l * price;
        let savings = baseline_cost - optimized_cost;

        Self {
            hours: horizon.len(),
            baseline_fuel_l,
            optimized_fuel_l,
            effective_fuel_price: price,
            baseline_cost,
            optimized_cost,
            savings,
            savings_fraction: if baseline_cost > 0.0 {
                savings / baseline_cost
            } else {
                0.0
            },
            co2_avoided_tonnes: (baseline_fuel_l - optimized_fuel_l) * DIESEL_CO2_TONNES_PER_LITRE,
            diesel_energy_kwh: result.diesel_energy_kwh(),
            solar_used_kwh: result.solar_used_kwh(),
            capex: capex(config, economics),
        }
    }

    /// Scale the flow quantities of a sub-horizon summary to a full year.
    pub fn annualized(&self) -> Self {
        if self.hours == 0 {
            return self.clone();
        }
        let k = HOURS_PER_YEAR / self.hours as f64;
        Self {
            hours: HOURS_PER_YEAR as usize,
            baseline_fuel_l: self.baseline_fuel_l * k,
            optimized_fuel_l: self.optimized_fuel_l * k,
            effective_fuel_price: self.effective_fuel_price,
            baseline_cost: self.baseline_cost * k,
            optimized_cost: self.optimized_cost * k,
            savings: self.savings * k,
            savings_fraction: self.savings_fraction,
            co2_avoided_tonnes: self.co2_avoided_tonnes * k,
            diesel_energy_kwh: self.diesel_energy_kwh * k,
            solar_used_kwh: self.solar_used_kwh * k,
            capex: self.capex,
        }
    }

    /// Simple payback in years, from this summary's savings rate.
    ///
    /// `None` when the dispatch saves nothing.
    pub fn payback_years(&self) -> Option<f64> {
        let annual = self.annualized().savings;
        (annual > 0.0).then(|| self.capex / annual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DispatchRecord, SolveStatus};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn fixture() -> (HorizonSeries, DispatchResult) {
        let horizon = HorizonSeries::hourly(t0(), &[200.0, 200.0], &[0.0, 0.5]).unwrap();
        let result = DispatchResult {
            records: vec![
                DispatchRecord {
                    timestamp: t0(),
                    gen_power: 200.0,
                    gen_status: 1,
                    bat_soc: 500.0,
                    bat_charge: 0.0,
                    bat_discharge: 0.0,
                    solar_used: 0.0,
                    load: 200.0,
                },
                DispatchRecord {
                    timestamp: t0() + Duration::hours(1),
                    gen_power: 0.0,
                    gen_status: 0,
                    bat_soc: 500.0,
                    bat_charge: 0.0,
                    bat_discharge: 0.0,
                    solar_used: 200.0,
                    load: 200.0,
                },
            ],
            status: SolveStatus::Optimal,
            objective: 0.0,
        };
        (horizon, result)
    }

    #[test]
    fn test_fuel_accounting() {
        let (horizon, result) = fixture();
        let config = MicrogridConfig::default();

        // 15 + 0.24·200 = 63 L for the one committed hour
        assert!((fuel_litres(&result, &config) - 63.0).abs() < 1e-9);
        // 2·15 + 0.24·400 = 126 L diesel-only
        assert!((baseline_fuel_litres(&horizon, &config) - 126.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_summary() {
        let (horizon, result) = fixture();
        let config = MicrogridConfig::default();
        let economics = EconomicsConfig::default();

        let summary = CostSummary::compute(&horizon, &result, &config, &economics);
        let price = config.effective_fuel_price();
        assert!((summary.baseline_cost - 126.0 * price).abs() < 1e-9);
        assert!((summary.savings - 63.0 * price).abs() < 1e-9);
        assert!((summary.savings_fraction - 0.5).abs() < 1e-9);
        assert!((summary.co2_avoided_tonnes - 63.0 * 0.00268).abs() < 1e-12);
        // 1000 kWh · $1000 + 400 kW · $4000
        assert_eq!(summary.capex, 2_600_000.0);

        let annual = summary.annualized();
        assert_eq!(annual.hours, 8760);
        assert!((annual.savings - summary.savings * 4380.0).abs() < 1e-6);
        let payback = summary.payback_years().unwrap();
        assert!((payback - summary.capex / annual.savings).abs() < 1e-9);
    }

    #[test]
    fn test_no_payback_without_savings() {
        let (horizon, mut result) = fixture();
        result.records[1].gen_status = 1;
        result.records[1].gen_power = 200.0;
        let summary = CostSummary::compute(
            &horizon,
            &result,
            &MicrogridConfig::default(),
            &EconomicsConfig::default(),
        );
        assert!(summary.savings.abs() < 1e-9);
        assert_eq!(summary.payback_years(), None);
    }
}
