//! Per-cell calibration: baseline offset plus the polynomial mapping from
//! baseline-subtracted raw to a physical-unit scalar.
//!
//! Profile is read-mostly like Layout, but unlike Layout it is mutated by
//! `set_c1`/`set_baseline` and by the Calibration Controller's commit step,
//! so it lives behind the writer lock the sensor facade owns.
use crate::error::SensorError;
use crate::layout::Layout;
use std::collections::HashMap;

/// `{baseline, c0, c1, c2}` for one cell. `c1 == 0.0` marks the cell
/// disabled for aggregation (its raw value is still tracked).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCal {
    pub baseline: i64,
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

impl Default for CellCal {
    fn default() -> Self {
        Self {
            baseline: 0,
            c0: 0.0,
            c1: 1.0,
            c2: 0.0,
        }
    }
}

impl CellCal {
    /// Calibrated value from a raw sample: `c2*delta^2 + c1*delta + c0`,
    /// where `delta = raw - baseline`.
    pub fn apply(&self, raw: i32) -> f64 {
        let delta = (i64::from(raw) - self.baseline) as f64;
        self.c2.mul_add(delta * delta, self.c1.mul_add(delta, self.c0))
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    cells: HashMap<(u32, u32), CellCal>,
}

impl Profile {
    /// An identity profile (`{b=0, c0=0, c1=1, c2=0}`) for every cell in
    /// `layout` — used when no profile file is supplied.
    pub fn identity_for(layout: &Layout) -> Self {
        let mut cells = HashMap::new();
        for patch in layout.patches() {
            for cell in layout.cells(patch) {
                cells.insert((patch, cell), CellCal::default());
            }
        }
        Self { cells }
    }

    /// Builds a profile from parsed CSV rows, validated against `layout`.
    /// Rows for cells the layout does not declare are dropped with a
    /// `tracing::warn!`; layout cells missing a row default to identity.
    pub fn load(rows: &[skin_config::ProfileRow], layout: &Layout) -> Result<Self, SensorError> {
        let mut cells = HashMap::new();
        let mut seen = std::collections::HashSet::new();
        for row in rows {
            if !seen.insert((row.patch, row.cell)) {
                return Err(SensorError::DuplicateCell {
                    patch: row.patch,
                    cell: row.cell,
                });
            }
            if !layout.has(row.patch, row.cell) {
                tracing::warn!(
                    patch = row.patch,
                    cell = row.cell,
                    "profile row references a cell not present in the layout, ignoring"
                );
                continue;
            }
            cells.insert(
                (row.patch, row.cell),
                CellCal {
                    baseline: row.baseline,
                    c0: row.c0,
                    c1: row.c1,
                    c2: row.c2,
                },
            );
        }

        for patch in layout.patches() {
            for cell in layout.cells(patch) {
                cells.entry((patch, cell)).or_insert_with(CellCal::default);
            }
        }

        Ok(Self { cells })
    }

    /// Serializes every cell's calibration back to the CSV row shape.
    pub fn save_rows(&self) -> Vec<skin_config::ProfileRow> {
        let mut rows: Vec<_> = self
            .cells
            .iter()
            .map(|(&(patch, cell), cal)| skin_config::ProfileRow {
                patch,
                cell,
                baseline: cal.baseline,
                c0: cal.c0,
                c1: cal.c1,
                c2: cal.c2,
            })
            .collect();
        rows.sort_by_key(|r| (r.patch, r.cell));
        rows
    }

    /// `{b, c0, c1, c2}` for `(patch, cell)`, or identity defaults if the
    /// cell has no entry.
    pub fn get(&self, patch: u32, cell: u32) -> CellCal {
        self.cells.get(&(patch, cell)).copied().unwrap_or_default()
    }

    pub fn set_c1(&mut self, patch: u32, cell: u32, v: f64) -> Result<(), SensorError> {
        match self.cells.get_mut(&(patch, cell)) {
            Some(cal) => {
                cal.c1 = v;
                Ok(())
            }
            None => Err(SensorError::UnknownCell { patch, cell }),
        }
    }

    pub fn set_baseline(&mut self, patch: u32, cell: u32, v: i64) -> Result<(), SensorError> {
        match self.cells.get_mut(&(patch, cell)) {
            Some(cal) => {
                cal.baseline = v;
                Ok(())
            }
            None => Err(SensorError::UnknownCell { patch, cell }),
        }
    }
}
