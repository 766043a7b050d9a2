mod common;

use std::sync::Arc;

use common::*;
use microgrid_dispatch::analysis::{solve_by_month, solve_by_month_sequential};
use microgrid_dispatch::config::EconomicsConfig;
use microgrid_dispatch::{DispatchError, MicrogridConfig};

/// Ten hours straddling the January/February boundary.
fn month_boundary(loads: &[f64]) -> microgrid_dispatch::HorizonSeries {
    series(at(2024, 1, 31, 20), loads, &[0.0; 10])
}

#[tokio::test]
async fn months_come_back_in_calendar_order() {
    let optimizer = Arc::new(optimizer(MicrogridConfig::default()));
    let horizon = month_boundary(&[300.0; 10]);

    let annual = solve_by_month(Arc::clone(&optimizer), &horizon).await.unwrap();

    let keys: Vec<_> = annual.months.iter().map(|m| (m.year, m.month)).collect();
    assert_eq!(keys, vec![(2024, 1), (2024, 2)]);
    assert_eq!(annual.months[0].result.len(), 4);
    assert_eq!(annual.months[1].result.len(), 6);
    assert!(annual.timed_out_months().is_empty());

    let combined = annual.combined().unwrap();
    assert_eq!(combined.len(), horizon.len());
    let timestamps: Vec<_> = combined.iter().map(|r| r.timestamp).collect();
    let expected: Vec<_> = horizon.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, expected);

    // each month restarts at half capacity
    let half = 0.5 * optimizer.config().battery_capacity_kwh;
    for month in &annual.months {
        assert!((month.result.records[0].bat_soc - half).abs() < TOL);
    }
}

#[tokio::test]
async fn concurrent_and_sequential_batches_agree() {
    let config = MicrogridConfig::default();
    let optimizer = Arc::new(optimizer(config));
    let horizon = month_boundary(&[
        300.0, 320.0, 280.0, 260.0, 250.0, 240.0, 260.0, 300.0, 340.0, 360.0,
    ]);

    let concurrent = solve_by_month(Arc::clone(&optimizer), &horizon).await.unwrap();
    let sequential = solve_by_month_sequential(&optimizer, &horizon).unwrap();

    assert_eq!(concurrent.months.len(), sequential.months.len());
    let gap = optimizer.solver().options().relative_gap;
    for (a, b) in concurrent.months.iter().zip(&sequential.months) {
        assert_eq!((a.year, a.month), (b.year, b.month));
        let scale = a.result.objective.abs().max(b.result.objective.abs());
        assert!((a.result.objective - b.result.objective).abs() <= gap * scale + 1e-6);
    }
}

#[tokio::test]
async fn one_infeasible_month_fails_the_batch() {
    let optimizer = Arc::new(optimizer(MicrogridConfig::default()));
    let mut loads = [300.0; 10];
    loads[7] = 2000.0;
    let horizon = month_boundary(&loads);

    let err = solve_by_month(Arc::clone(&optimizer), &horizon).await.unwrap_err();
    assert!(matches!(err, DispatchError::Infeasible(_)), "got {err:?}");

    let err = solve_by_month_sequential(&optimizer, &horizon).unwrap_err();
    assert!(matches!(err, DispatchError::Infeasible(_)));
}

#[tokio::test]
async fn batch_summary_covers_every_hour() {
    let optimizer = Arc::new(optimizer(MicrogridConfig::default()));
    let horizon = month_boundary(&[300.0; 10]);
    let economics = EconomicsConfig::default();

    let annual = solve_by_month(Arc::clone(&optimizer), &horizon).await.unwrap();
    let summary = annual.summary(&optimizer, &economics).unwrap();

    assert_eq!(summary.hours, horizon.len());
    assert!(summary.optimized_fuel_l <= summary.baseline_fuel_l + 1e-6);
    assert!(summary.optimized_cost <= summary.baseline_cost + 1e-6);

    let monthly = annual.monthly_summaries(&optimizer, &economics);
    assert_eq!(monthly.len(), 2);
    let hours: usize = monthly.iter().map(|(_, s)| s.hours).sum();
    assert_eq!(hours, horizon.len());
}

#[tokio::test]
async fn invalid_series_is_rejected_before_solving() {
    let optimizer = Arc::new(optimizer(MicrogridConfig::default()));
    let empty = microgrid_dispatch::HorizonSeries::new(vec![]);

    let err = solve_by_month(optimizer, &empty).await.unwrap_err();
    assert!(matches!(err, DispatchError::Input(_)));
}
