use super::types::SolvedModel;
use crate::domain::{DispatchRecord, DispatchResult, HorizonSeries};

/// Values this close to zero are engine round-off and reported as zero.
const ZERO_TOLERANCE: f64 = 1e-9;

fn clean(value: f64) -> f64 {
    if value.abs() < ZERO_TOLERANCE {
        0.0
    } else {
        value
    }
}

/// Read the solved assignment back into a table aligned with `horizon`.
///
/// `solved` must come from a successful [`super::DispatchSolver::solve`] on a
/// model built from the same horizon. Rows beyond the model's length are
/// not reported.
pub fn extract(solved: &SolvedModel, horizon: &HorizonSeries) -> DispatchResult {
    let vars = &solved.dispatch.vars;
    let values = &solved.assignment;

    let records = (0..solved.dispatch.horizon_len())
        .zip(horizon.iter())
        .map(|(t, input)| {
            let curtailed = clean(values.value(vars.solar_curtailed[t]));
            DispatchRecord {
                timestamp: input.timestamp,
                gen_power: clean(values.value(vars.gen_power[t])),
                gen_status: u8::from(values.value(vars.gen_status[t]) > 0.5),
                bat_soc: clean(values.value(vars.bat_soc[t])),
                bat_charge: clean(values.value(vars.bat_charge[t])),
                bat_discharge: clean(values.value(vars.bat_discharge[t])),
                solar_used: clean(solved.dispatch.available_solar[t] - curtailed),
                load: input.load_kw,
            }
        })
        .collect();

    DispatchResult {
        records,
        status: values.status,
        objective: solved.objective,
    }
}
