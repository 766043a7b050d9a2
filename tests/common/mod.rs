#![allow(dead_code)]

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use microgrid_dispatch::optimizer::{MicroLpEngine, SolveOptions};
use microgrid_dispatch::{HorizonSeries, MicrogridConfig, MicrogridOptimizer};

/// Numeric tolerance for checks against solver output (kW / kWh)
pub const TOL: f64 = 1e-4;

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid test timestamp")
}

pub fn series(start: NaiveDateTime, load_kw: &[f64], solar_pu: &[f64]) -> HorizonSeries {
    HorizonSeries::hourly(start, load_kw, solar_pu).expect("valid test horizon")
}

/// Optimizer solving to proven optimality (zero gap).
pub fn optimizer(config: MicrogridConfig) -> MicrogridOptimizer {
    optimizer_with(config, SolveOptions::new(Duration::from_secs(60), 0.0))
}

pub fn optimizer_with(config: MicrogridConfig, options: SolveOptions) -> MicrogridOptimizer {
    MicrogridOptimizer::with_engine(config, Box::new(MicroLpEngine), options)
        .expect("valid test config")
}

/// Twelve summer hours from 04:00, night load with a solar peak around noon.
pub fn summer_morning() -> HorizonSeries {
    series(
        at(2024, 7, 4, 4),
        &[
            320.0, 300.0, 290.0, 300.0, 350.0, 380.0, 400.0, 420.0, 380.0, 350.0, 330.0, 340.0,
        ],
        &[0.0, 0.0, 0.05, 0.2, 0.45, 0.7, 0.9, 1.0, 0.9, 0.7, 0.4, 0.1],
    )
}

/// `days` of a repeating summer day: evening load peak, solar around noon.
pub fn summer_days(days: usize) -> HorizonSeries {
    let load: Vec<f64> = (0..days * 24)
        .map(|h| {
            let hour = (h % 24) as f64;
            let day = (h / 24) as f64;
            320.0 + 90.0 * ((hour - 19.0) * std::f64::consts::PI / 12.0).cos() + 4.0 * day
        })
        .collect();
    let solar: Vec<f64> = (0..days * 24)
        .map(|h| {
            let hour = (h % 24) as f64;
            ((hour - 6.0) * std::f64::consts::PI / 14.0).sin().max(0.0)
        })
        .collect();
    series(at(2024, 7, 1, 0), &load, &solar)
}
