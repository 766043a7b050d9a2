//! Month-by-month dispatch of a long series
//!
//! Each calendar month is an independent horizon (its battery is anchored at
//! half capacity), so months are solved concurrently on the blocking pool.
//! A single failing month fails the whole batch; partial totals are never
//! reported. Months that have not started are skipped once the batch fails;
//! a month already inside the engine runs on until its solve time limit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::economics::CostSummary;
use crate::config::EconomicsConfig;
use crate::domain::{DispatchResult, HorizonSeries};
use crate::error::{DispatchError, Result};
use crate::optimizer::MicrogridOptimizer;

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyDispatch {
    pub year: i32,
    pub month: u32,
    pub horizon: HorizonSeries,
    pub result: DispatchResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnualDispatch {
    /// In calendar order
    pub months: Vec<MonthlyDispatch>,
}

impl AnnualDispatch {
    /// All months as one table
    pub fn combined(&self) -> Option<DispatchResult> {
        DispatchResult::concat(self.months.iter().map(|m| &m.result))
    }

    /// Months whose solve stopped at the time limit
    pub fn timed_out_months(&self) -> Vec<(i32, u32)> {
        self.months
            .iter()
            .filter(|m| m.result.timed_out())
            .map(|m| (m.year, m.month))
            .collect()
    }

    /// Cost summary per month, in calendar order
    pub fn monthly_summaries(
        &self,
        optimizer: &MicrogridOptimizer,
        economics: &EconomicsConfig,
    ) -> Vec<((i32, u32), CostSummary)> {
        self.months
            .iter()
            .map(|m| {
                (
                    (m.year, m.month),
                    CostSummary::compute(&m.horizon, &m.result, optimizer.config(), economics),
                )
            })
            .collect()
    }

    /// Cost summary over the whole batch
    pub fn summary(
        &self,
        optimizer: &MicrogridOptimizer,
        economics: &EconomicsConfig,
    ) -> Option<CostSummary> {
        let horizon = HorizonSeries::new(
            self.months
                .iter()
                .flat_map(|m| m.horizon.records().iter().copied())
                .collect(),
        );
        self.combined()
            .map(|result| CostSummary::compute(&horizon, &result, optimizer.config(), economics))
    }
}

/// Solve one month unless the batch has already failed.
fn solve_month(
    optimizer: &MicrogridOptimizer,
    cancelled: &AtomicBool,
    series: &HorizonSeries,
) -> Option<Result<DispatchResult>> {
    if cancelled.load(Ordering::Acquire) {
        return None;
    }
    Some(optimizer.build_and_solve(series))
}

fn split(horizon: &HorizonSeries) -> Result<Vec<((i32, u32), HorizonSeries)>> {
    horizon.validate()?;
    Ok(horizon.split_by_month())
}

/// Solve every calendar month of `horizon` concurrently.
pub async fn solve_by_month(
    optimizer: Arc<MicrogridOptimizer>,
    horizon: &HorizonSeries,
) -> Result<AnnualDispatch> {
    let months = split(horizon)?;
    info!(months = months.len(), hours = horizon.len(), "starting monthly dispatch");

    let cancelled = Arc::new(AtomicBool::new(false));
    let mut tasks = JoinSet::new();
    for (index, ((year, month), series)) in months.into_iter().enumerate() {
        let optimizer = Arc::clone(&optimizer);
        let cancelled = Arc::clone(&cancelled);
        tasks.spawn_blocking(move || {
            let outcome = solve_month(&optimizer, &cancelled, &series);
            (index, year, month, series, outcome)
        });
    }

    let mut solved = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, year, month, series, outcome) = joined
            .map_err(|err| DispatchError::Solver(format!("dispatch task failed: {}", err)))?;
        match outcome {
            None => continue,
            Some(Ok(result)) => {
                info!(
                    year,
                    month,
                    status = %result.status,
                    objective = result.objective,
                    "month solved"
                );
                solved.push((
                    index,
                    MonthlyDispatch {
                        year,
                        month,
                        horizon: series,
                        result,
                    },
                ));
            }
            Some(Err(err)) => {
                error!(year, month, kind = err.kind(), error = %err, "month failed, aborting batch");
                cancelled.store(true, Ordering::Release);
                tasks.abort_all();
                return Err(err);
            }
        }
    }

    solved.sort_by_key(|(index, _)| *index);
    Ok(AnnualDispatch {
        months: solved.into_iter().map(|(_, m)| m).collect(),
    })
}

/// Solve every calendar month in order on the calling thread.
pub fn solve_by_month_sequential(
    optimizer: &MicrogridOptimizer,
    horizon: &HorizonSeries,
) -> Result<AnnualDispatch> {
    let mut months = Vec::new();
    for ((year, month), series) in split(horizon)? {
        let result = optimizer.build_and_solve(&series).inspect_err(|err| {
            error!(year, month, kind = err.kind(), error = %err, "month failed, aborting batch");
        })?;
        months.push(MonthlyDispatch {
            year,
            month,
            horizon: series,
            result,
        });
    }
    Ok(AnnualDispatch { months })
}
