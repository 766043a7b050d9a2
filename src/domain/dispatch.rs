use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How the engine terminated on a successful solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,
    /// Accepted once the relative optimality gap bound was met
    WithinGap,
    /// Stopped at the time limit with a feasible incumbent; gap not certified
    TimeLimit,
}

/// Dispatch decisions for one timestep, aligned to the input record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub timestamp: NaiveDateTime,
    /// Diesel output (kW)
    pub gen_power: f64,
    /// Diesel commitment, 0 or 1
    pub gen_status: u8,
    /// Battery state of charge (kWh)
    pub bat_soc: f64,
    /// Battery charging power (kW)
    pub bat_charge: f64,
    /// Battery discharging power (kW)
    pub bat_discharge: f64,
    /// Solar delivered to the bus after curtailment (kW)
    pub solar_used: f64,
    /// Original load (kW)
    pub load: f64,
}

impl DispatchRecord {
    pub fn is_generator_on(&self) -> bool {
        self.gen_status == 1
    }

    /// Supply minus demand at the bus; zero up to solver tolerance.
    pub fn balance_residual(&self) -> f64 {
        self.gen_power + self.bat_discharge + self.solar_used - self.load - self.bat_charge
    }
}

/// Result table of one horizon solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub records: Vec<DispatchRecord>,
    pub status: SolveStatus,
    /// Objective value of the returned assignment ($, fuel incl. carbon plus curtailment penalty)
    pub objective: f64,
}

impl DispatchResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.records.iter()
    }

    /// The engine stopped at its time limit; result is feasible but not certified.
    pub fn timed_out(&self) -> bool {
        self.status == SolveStatus::TimeLimit
    }

    /// Total diesel energy (kWh)
    pub fn diesel_energy_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.gen_power).sum()
    }

    /// Number of hours with the generator committed
    pub fn generator_hours(&self) -> u32 {
        self.records.iter().map(|r| u32::from(r.gen_status)).sum()
    }

    pub fn solar_used_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.solar_used).sum()
    }

    pub fn battery_discharge_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.bat_discharge).sum()
    }

    pub fn load_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.load).sum()
    }

    /// Largest absolute energy balance residual over all timesteps
    pub fn max_balance_residual(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.balance_residual().abs())
            .fold(0.0, f64::max)
    }

    /// Concatenate consecutive horizon results into one table.
    ///
    /// The combined status is the weakest of the parts and objectives add up.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a DispatchResult>) -> Option<Self> {
        let mut records = Vec::new();
        let mut objective = 0.0;
        let mut status = None;
        for part in parts {
            records.extend_from_slice(&part.records);
            objective += part.objective;
            status = Some(match status {
                None => part.status,
                Some(prev) => weakest(prev, part.status),
            });
        }
        status.map(|status| Self {
            records,
            status,
            objective,
        })
    }
}

fn weakest(a: SolveStatus, b: SolveStatus) -> SolveStatus {
    use SolveStatus::*;
    match (a, b) {
        (TimeLimit, _) | (_, TimeLimit) => TimeLimit,
        (WithinGap, _) | (_, WithinGap) => WithinGap,
        _ => Optimal,
    }
}
