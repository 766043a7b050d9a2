use chrono::{Datelike, Duration, NaiveDateTime};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Spacing between consecutive horizon records.
pub fn step() -> Duration {
    Duration::hours(1)
}

/// One hour of demand and normalized solar availability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonRecord {
    pub timestamp: NaiveDateTime,
    /// Load demand (kW), non-negative
    pub load_kw: f64,
    /// Solar availability per unit of installed capacity, in [0, 1]
    pub solar_pu: f64,
}

impl HorizonRecord {
    pub fn new(timestamp: NaiveDateTime, load_kw: f64, solar_pu: f64) -> Self {
        Self {
            timestamp,
            load_kw,
            solar_pu,
        }
    }
}

/// Ordered, hourly-spaced series of [`HorizonRecord`]s for one dispatch horizon.
///
/// Construction is unchecked so that callers can assemble a series piecewise;
/// [`HorizonSeries::validate`] is run by the model builder before anything is
/// solved, and by [`HorizonSeries::try_new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizonSeries {
    records: Vec<HorizonRecord>,
}

impl HorizonSeries {
    pub fn new(records: Vec<HorizonRecord>) -> Self {
        Self { records }
    }

    /// Build and validate in one step
    pub fn try_new(records: Vec<HorizonRecord>) -> Result<Self> {
        let series = Self::new(records);
        series.validate()?;
        Ok(series)
    }

    /// Build from parallel load/solar arrays starting at `start`, one record per hour.
    pub fn hourly(start: NaiveDateTime, load_kw: &[f64], solar_pu: &[f64]) -> Result<Self> {
        if load_kw.len() != solar_pu.len() {
            return Err(DispatchError::Input(format!(
                "load and solar series differ in length: {} vs {}",
                load_kw.len(),
                solar_pu.len()
            )));
        }
        let records = load_kw
            .iter()
            .zip(solar_pu)
            .enumerate()
            .map(|(i, (&load, &solar))| HorizonRecord::new(start + step() * i as i32, load, solar))
            .collect();
        Self::try_new(records)
    }

    /// Check the series invariants: non-empty, finite non-negative load,
    /// solar in [0, 1], strictly increasing timestamps one hour apart.
    pub fn validate(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(DispatchError::Input("horizon is empty".to_string()));
        }

        for (i, record) in self.records.iter().enumerate() {
            if !record.load_kw.is_finite() || record.load_kw < 0.0 {
                return Err(DispatchError::Input(format!(
                    "load_kw at index {} ({}) must be finite and non-negative: {}",
                    i, record.timestamp, record.load_kw
                )));
            }
            if !record.solar_pu.is_finite() || !(0.0..=1.0).contains(&record.solar_pu) {
                return Err(DispatchError::Input(format!(
                    "solar_pu at index {} ({}) must be within [0, 1]: {}",
                    i, record.timestamp, record.solar_pu
                )));
            }
        }

        for (i, (prev, next)) in self.records.iter().tuple_windows().enumerate() {
            let delta = next.timestamp - prev.timestamp;
            if delta <= Duration::zero() {
                return Err(DispatchError::Input(format!(
                    "timestamps are not strictly increasing at index {}: {} -> {}",
                    i + 1,
                    prev.timestamp,
                    next.timestamp
                )));
            }
            if delta != step() {
                return Err(DispatchError::Input(format!(
                    "timestamps are not hourly at index {}: {} -> {} ({} min)",
                    i + 1,
                    prev.timestamp,
                    next.timestamp,
                    delta.num_minutes()
                )));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HorizonRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &HorizonRecord> {
        self.records.iter()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.last().map(|r| r.timestamp)
    }

    pub fn loads(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.load_kw).collect()
    }

    /// Available solar power (kW) per step for the given installed capacity.
    pub fn available_solar(&self, solar_capacity_kw: f64) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.solar_pu * solar_capacity_kw)
            .collect()
    }

    /// Total demand over the horizon (kWh; one-hour steps)
    pub fn total_load_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.load_kw).sum()
    }

    /// `hours` consecutive records starting at `start`.
    pub fn window(&self, start: NaiveDateTime, hours: usize) -> Result<Self> {
        let offset = self
            .records
            .iter()
            .position(|r| r.timestamp == start)
            .ok_or_else(|| DispatchError::Input(format!("timestamp {} not in horizon", start)))?;
        if hours == 0 || offset + hours > self.records.len() {
            return Err(DispatchError::Input(format!(
                "window of {} hours from {} exceeds horizon ({} records available)",
                hours,
                start,
                self.records.len() - offset
            )));
        }
        Ok(Self::new(self.records[offset..offset + hours].to_vec()))
    }

    /// The first `hours` records (or all of them if the series is shorter).
    pub fn head(&self, hours: usize) -> Self {
        Self::new(self.records.iter().take(hours).copied().collect())
    }

    /// Split into calendar-month sub-horizons, in (year, month) order of appearance.
    pub fn split_by_month(&self) -> Vec<((i32, u32), Self)> {
        self.records
            .iter()
            .chunk_by(|r| (r.timestamp.year(), r.timestamp.month()))
            .into_iter()
            .map(|(key, group)| (key, Self::new(group.copied().collect())))
            .collect()
    }
}

impl<'a> IntoIterator for &'a HorizonSeries {
    type Item = &'a HorizonRecord;
    type IntoIter = std::slice::Iter<'a, HorizonRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
