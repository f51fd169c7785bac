//! Columnar photon event tables.
//!
//! [`EventTable`] stores events as parallel columns (structure of arrays),
//! so cuts compute a mask over whole columns and gather the survivors in
//! bulk. Tables coming out of this crate are ordered by `time`; downstream
//! exposure calculations rely on that, so every operation that merges or
//! reorders rows restores it.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PulseFitError, Result};

/// Optional per-event quality columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Gamma/hadron classifier score in [0, 1).
    Gammaness,
    /// Image orientation angle, degrees.
    Alpha,
    /// Squared angular distance to the source, deg².
    Theta2,
    /// Telescope pointing altitude, radians.
    Altitude,
    /// Image intensity, photoelectrons.
    Intensity,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Gammaness,
        Column::Alpha,
        Column::Theta2,
        Column::Altitude,
        Column::Intensity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Gammaness => "gammaness",
            Column::Alpha => "alpha",
            Column::Theta2 => "theta2",
            Column::Altitude => "altitude",
            Column::Intensity => "intensity",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One detected photon.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    pub time: f64,
    pub phase: f64,
    pub energy: f64,
    pub gammaness: Option<f64>,
    pub alpha: Option<f64>,
    pub theta2: Option<f64>,
    pub altitude: Option<f64>,
    pub intensity: Option<f64>,
}

impl Event {
    pub fn new(time: f64, phase: f64, energy: f64) -> Self {
        Self {
            time,
            phase,
            energy,
            ..Default::default()
        }
    }

    fn quality(&self, column: Column) -> Option<f64> {
        match column {
            Column::Gammaness => self.gammaness,
            Column::Alpha => self.alpha,
            Column::Theta2 => self.theta2,
            Column::Altitude => self.altitude,
            Column::Intensity => self.intensity,
        }
    }
}

/// Ordered collection of events stored column-wise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    time: Vec<f64>,
    phase: Vec<f64>,
    energy: Vec<f64>,
    quality: [Option<Vec<f64>>; 5],
}

fn gather(column: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.par_iter().map(|&i| column[i]).collect()
}

impl EventTable {
    /// Create a table from the three required columns.
    pub fn new(time: Vec<f64>, phase: Vec<f64>, energy: Vec<f64>) -> Result<Self> {
        if time.len() != phase.len() || time.len() != energy.len() {
            return Err(PulseFitError::DimensionMismatch(format!(
                "time ({}), phase ({}) and energy ({}) columns differ in length",
                time.len(),
                phase.len(),
                energy.len()
            )));
        }
        Ok(Self {
            time,
            phase,
            energy,
            quality: Default::default(),
        })
    }

    /// Attach an optional quality column.
    pub fn with_column(mut self, column: Column, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.len() {
            return Err(PulseFitError::DimensionMismatch(format!(
                "column '{}' has {} values for {} events",
                column,
                values.len(),
                self.len()
            )));
        }
        self.quality[column.index()] = Some(values);
        Ok(self)
    }

    /// Build a table from row records.
    ///
    /// A quality column is kept when every event carries it; a column present
    /// on only some events is an error.
    pub fn from_events(events: &[Event]) -> Result<Self> {
        let mut table = Self::new(
            events.iter().map(|e| e.time).collect(),
            events.iter().map(|e| e.phase).collect(),
            events.iter().map(|e| e.energy).collect(),
        )?;
        for column in Column::ALL {
            let present = events.iter().filter(|e| e.quality(column).is_some()).count();
            if present == 0 {
                continue;
            }
            if present != events.len() {
                return Err(PulseFitError::InvalidConfig(format!(
                    "column '{}' is present on {} of {} events",
                    column,
                    present,
                    events.len()
                )));
            }
            let values = events.iter().filter_map(|e| e.quality(column)).collect();
            table = table.with_column(column, values)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn phase(&self) -> &[f64] {
        &self.phase
    }

    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    /// An optional quality column, if the table carries it.
    pub fn column(&self, column: Column) -> Option<&[f64]> {
        self.quality[column.index()].as_deref()
    }

    /// A quality column a cut depends on.
    pub fn require(&self, column: Column) -> Result<&[f64]> {
        self.column(column)
            .ok_or(PulseFitError::MissingColumn(column.name()))
    }

    /// Row `i` as an [`Event`].
    pub fn get(&self, i: usize) -> Option<Event> {
        if i >= self.len() {
            return None;
        }
        let q = |c: Column| self.column(c).map(|v| v[i]);
        Some(Event {
            time: self.time[i],
            phase: self.phase[i],
            energy: self.energy[i],
            gammaness: q(Column::Gammaness),
            alpha: q(Column::Alpha),
            theta2: q(Column::Theta2),
            altitude: q(Column::Altitude),
            intensity: q(Column::Intensity),
        })
    }

    /// Zenith angle in degrees, `90° - altitude`.
    pub fn zenith_deg(&self) -> Result<Vec<f64>> {
        let altitude = self.require(Column::Altitude)?;
        Ok(altitude.par_iter().map(|alt| 90.0 - alt.to_degrees()).collect())
    }

    /// New table holding rows `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Self {
        let mut quality: [Option<Vec<f64>>; 5] = Default::default();
        for (slot, column) in quality.iter_mut().zip(self.quality.iter()) {
            *slot = column.as_ref().map(|c| gather(c, indices));
        }
        Self {
            time: gather(&self.time, indices),
            phase: gather(&self.phase, indices),
            energy: gather(&self.energy, indices),
            quality,
        }
    }

    /// Keep rows where `mask` is true, replacing the stored columns.
    pub fn retain_mask(&mut self, mask: &[bool]) -> Result<()> {
        if mask.len() != self.len() {
            return Err(PulseFitError::DimensionMismatch(format!(
                "mask has {} entries for {} events",
                mask.len(),
                self.len()
            )));
        }
        let kept: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        *self = self.take(&kept);
        Ok(())
    }

    pub fn is_time_ordered(&self) -> bool {
        self.time.windows(2).all(|w| w[0] <= w[1])
    }

    /// Stable sort of all rows by ascending time.
    pub fn sort_by_time(&mut self) {
        if self.is_time_ordered() {
            return;
        }
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.par_sort_by(|&a, &b| self.time[a].total_cmp(&self.time[b]));
        *self = self.take(&order);
    }

    /// Concatenate tables and restore time order.
    ///
    /// Quality columns survive only if every input table carries them.
    pub fn concat(tables: &[EventTable]) -> Self {
        let mut merged = Self::append_all(tables);
        merged.sort_by_time();
        merged
    }

    /// Concatenate many partial tables `chunk` at a time, then restore time
    /// order once at the end.
    pub fn concat_chunked(tables: Vec<EventTable>, chunk: usize) -> Result<Self> {
        if chunk == 0 {
            return Err(PulseFitError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        let mut merged: Option<EventTable> = None;
        for batch in tables.chunks(chunk) {
            let part = Self::append_all(batch);
            merged = Some(match merged {
                None => part,
                Some(acc) => Self::append_all(&[acc, part]),
            });
        }
        let mut merged = merged.unwrap_or_default();
        merged.sort_by_time();
        Ok(merged)
    }

    fn append_all(tables: &[EventTable]) -> Self {
        let total: usize = tables.iter().map(EventTable::len).sum();
        let mut out = Self {
            time: Vec::with_capacity(total),
            phase: Vec::with_capacity(total),
            energy: Vec::with_capacity(total),
            quality: Default::default(),
        };
        for (idx, slot) in out.quality.iter_mut().enumerate() {
            if !tables.is_empty() && tables.iter().all(|t| t.quality[idx].is_some()) {
                *slot = Some(Vec::with_capacity(total));
            }
        }
        for table in tables {
            out.time.extend_from_slice(&table.time);
            out.phase.extend_from_slice(&table.phase);
            out.energy.extend_from_slice(&table.energy);
            for (slot, column) in out.quality.iter_mut().zip(table.quality.iter()) {
                if let (Some(dst), Some(src)) = (slot.as_mut(), column.as_ref()) {
                    dst.extend_from_slice(src);
                }
            }
        }
        out
    }

    /// Observation time as the sum of consecutive arrival-time differences.
    ///
    /// Differences larger than `max_gap` (same units as `time`) are treated as
    /// gaps between observations and contribute nothing.
    pub fn observation_time(&self, max_gap: Option<f64>) -> Result<f64> {
        if !self.is_time_ordered() {
            return Err(PulseFitError::NotTimeOrdered);
        }
        let limit = max_gap.unwrap_or(f64::INFINITY);
        Ok(self
            .time
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|dt| *dt <= limit)
            .sum())
    }
}
