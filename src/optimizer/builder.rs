//! Dispatch model construction
//!
//! Turns a [`MicrogridConfig`] and a [`HorizonSeries`] into a [`DispatchModel`]:
//! per-timestep decision variables plus the constraint families and cost
//! objective of the hybrid diesel/battery/solar formulation.
//!
//! For every timestep `t`:
//! - energy balance: `gen + discharge + (solar - curtailed) == load + charge`
//! - generator envelope: `min_stable·on <= gen <= capacity·on`
//! - SoC: `soc[0] == capacity/2`, `soc[t] == soc[t-1] + charge·η - discharge/η`
//! - bounds: `soc <= capacity`, `charge, discharge <= power`, `curtailed <= solar`
//!
//! plus the terminal condition `soc[T-1] >= soc[0]`.
//!
//! Charge and discharge are bounded independently; nothing forbids both being
//! non-zero in the same step, the objective only makes it unattractive.

use tracing::debug;

use super::constraints::{MicrogridConfig, CURTAILMENT_PENALTY_PER_KW};
use super::model::{ConstraintFamily, LinearExpr, LinearModel, Relation, VarId};
use crate::domain::HorizonSeries;
use crate::error::Result;

/// Decision variables as index-aligned arrays over `[0, T)`
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchVariables {
    pub gen_status: Vec<VarId>,
    pub gen_power: Vec<VarId>,
    pub bat_charge: Vec<VarId>,
    pub bat_discharge: Vec<VarId>,
    pub bat_soc: Vec<VarId>,
    pub solar_curtailed: Vec<VarId>,
}

impl DispatchVariables {
    fn allocate(model: &mut LinearModel, horizon_len: usize) -> Self {
        let mut vars = Self {
            gen_status: Vec::with_capacity(horizon_len),
            gen_power: Vec::with_capacity(horizon_len),
            bat_charge: Vec::with_capacity(horizon_len),
            bat_discharge: Vec::with_capacity(horizon_len),
            bat_soc: Vec::with_capacity(horizon_len),
            solar_curtailed: Vec::with_capacity(horizon_len),
        };
        for t in 0..horizon_len {
            vars.gen_status.push(model.add_binary(format!("gen_status[{t}]")));
            vars.gen_power.push(model.add_non_negative(format!("gen_power[{t}]")));
            vars.bat_charge.push(model.add_non_negative(format!("bat_charge[{t}]")));
            vars.bat_discharge.push(model.add_non_negative(format!("bat_discharge[{t}]")));
            vars.bat_soc.push(model.add_non_negative(format!("bat_soc[{t}]")));
            vars.solar_curtailed.push(model.add_non_negative(format!("solar_curtailed[{t}]")));
        }
        vars
    }

    pub fn len(&self) -> usize {
        self.gen_power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gen_power.is_empty()
    }
}

/// A built, not yet solved, dispatch problem for one horizon.
#[derive(Debug, Clone)]
pub struct DispatchModel {
    pub model: LinearModel,
    pub vars: DispatchVariables,
    /// Available solar per step (kW), `solar_pu·solar_capacity`
    pub available_solar: Vec<f64>,
    pub load: Vec<f64>,
    pub initial_soc_kwh: f64,
}

impl DispatchModel {
    pub fn horizon_len(&self) -> usize {
        self.vars.len()
    }
}

/// Build the dispatch model for `horizon` under `config`.
///
/// Fails with `Configuration` or `Input` before anything is allocated if either
/// argument breaks its invariants.
pub fn build(config: &MicrogridConfig, horizon: &HorizonSeries) -> Result<DispatchModel> {
    config.validate()?;
    horizon.validate()?;

    let n = horizon.len();
    let available_solar = horizon.available_solar(config.solar_capacity_kw);
    let load = horizon.loads();
    let initial_soc = config.initial_soc_kwh();
    let eff = config.battery_efficiency;

    let mut model = LinearModel::new();
    let vars = DispatchVariables::allocate(&mut model, n);

    for t in 0..n {
        // gen + discharge - curtailed - charge == load - available_solar
        model.add_constraint(
            ConstraintFamily::EnergyBalance,
            format!("energy_balance[{t}]"),
            LinearExpr::new()
                .term(vars.gen_power[t], 1.0)
                .term(vars.bat_discharge[t], 1.0)
                .term(vars.solar_curtailed[t], -1.0)
                .term(vars.bat_charge[t], -1.0),
            Relation::Equal,
            load[t] - available_solar[t],
        );

        model.add_constraint(
            ConstraintFamily::GenMin,
            format!("gen_min[{t}]"),
            LinearExpr::new()
                .term(vars.gen_power[t], 1.0)
                .term(vars.gen_status[t], -config.diesel_min_stable_kw),
            Relation::GreaterOrEqual,
            0.0,
        );
        model.add_constraint(
            ConstraintFamily::GenMax,
            format!("gen_max[{t}]"),
            LinearExpr::new()
                .term(vars.gen_power[t], 1.0)
                .term(vars.gen_status[t], -config.diesel_capacity_kw),
            Relation::LessOrEqual,
            0.0,
        );

        if t == 0 {
            model.add_constraint(
                ConstraintFamily::SocAnchor,
                "soc_anchor",
                vars.bat_soc[0].into(),
                Relation::Equal,
                initial_soc,
            );
        } else {
            // soc[t] - soc[t-1] - charge·η + discharge/η == 0
            model.add_constraint(
                ConstraintFamily::SocTracking,
                format!("soc_tracking[{t}]"),
                LinearExpr::new()
                    .term(vars.bat_soc[t], 1.0)
                    .term(vars.bat_soc[t - 1], -1.0)
                    .term(vars.bat_charge[t], -eff)
                    .term(vars.bat_discharge[t], 1.0 / eff),
                Relation::Equal,
                0.0,
            );
        }

        model.add_constraint(
            ConstraintFamily::SocCapacity,
            format!("soc_capacity[{t}]"),
            vars.bat_soc[t].into(),
            Relation::LessOrEqual,
            config.battery_capacity_kwh,
        );
        model.add_constraint(
            ConstraintFamily::ChargeRateLimit,
            format!("charge_rate_limit[{t}]"),
            vars.bat_charge[t].into(),
            Relation::LessOrEqual,
            config.battery_power_kw,
        );
        model.add_constraint(
            ConstraintFamily::DischargeRateLimit,
            format!("discharge_rate_limit[{t}]"),
            vars.bat_discharge[t].into(),
            Relation::LessOrEqual,
            config.battery_power_kw,
        );
        model.add_constraint(
            ConstraintFamily::SolarCurtailmentLimit,
            format!("solar_curtailment_limit[{t}]"),
            vars.solar_curtailed[t].into(),
            Relation::LessOrEqual,
            available_solar[t],
        );
    }

    model.add_constraint(
        ConstraintFamily::TerminalSoc,
        "terminal_soc",
        vars.bat_soc[n - 1].into(),
        Relation::GreaterOrEqual,
        initial_soc,
    );

    let intercept_cost = config.intercept_cost();
    let slope_cost = config.slope_cost();
    let mut objective = LinearExpr::new();
    for t in 0..n {
        objective.add_term(vars.gen_status[t], intercept_cost);
        objective.add_term(vars.gen_power[t], slope_cost);
        objective.add_term(vars.solar_curtailed[t], CURTAILMENT_PENALTY_PER_KW);
    }
    model.minimise(objective);

    debug!(
        horizon_len = n,
        variables = model.variables().len(),
        binaries = model.num_binaries(),
        constraints = model.constraints().len(),
        effective_fuel_price = config.effective_fuel_price(),
        "built dispatch model"
    );

    Ok(DispatchModel {
        model,
        vars,
        available_solar,
        load,
        initial_soc_kwh: initial_soc,
    })
}
