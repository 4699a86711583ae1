//! Per-cell and per-patch mutable state. One `PatchState` per patch is the
//! unit of locking: the ingest thread and the consumer synchronize through
//! it, never holding more than one at a time.
use std::collections::VecDeque;

/// Mutable state for one cell, addressed by its slot within the owning
/// patch (see `Layout::cell_slot`).
#[derive(Debug, Clone)]
pub struct CellState {
    pub raw_latest: i32,
    pub avg: f64,
    avg_initialized: bool,
    pub baseline_accum: i64,
    pub baseline_count: u32,
    history: Option<VecDeque<i32>>,
}

impl CellState {
    fn new(history_cap: usize) -> Self {
        Self {
            raw_latest: 0,
            avg: 0.0,
            avg_initialized: false,
            baseline_accum: 0,
            baseline_count: 0,
            history: if history_cap > 0 {
                Some(VecDeque::with_capacity(history_cap))
            } else {
                None
            },
        }
    }

    pub fn avg_initialized(&self) -> bool {
        self.avg_initialized
    }

    pub fn set_avg_initialized(&mut self, v: bool) {
        self.avg_initialized = v;
    }

    /// Pushes a raw sample into the history ring, dropping the oldest
    /// entry once at capacity. No-op if history tracking is disabled.
    pub fn push_history(&mut self, raw: i32, cap: usize) {
        if let Some(hist) = self.history.as_mut() {
            if hist.len() >= cap {
                hist.pop_front();
            }
            hist.push_back(raw);
        }
    }

    /// A copy of the history ring, oldest first.
    pub fn history_snapshot(&self) -> Vec<i32> {
        self.history
            .as_ref()
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Mutable state for one patch: its cells (ordered to match
/// `Layout::cells`) plus the smoothed pressure-centroid reading.
#[derive(Debug, Clone)]
pub struct PatchState {
    pub patch: u32,
    pub cells: Vec<CellState>,
    /// `(magnitude, x, y)`, smoothed with `pressure_alpha`.
    pub pressure_avg: (f64, f64, f64),
    pressure_initialized: bool,
    /// Incremented by the pipeline on every record this patch receives;
    /// lets the aggregator recompute the pressure centroid only when new
    /// data has actually arrived, keeping repeated queries deterministic.
    generation: u64,
    last_aggregated_generation: u64,
}

impl PatchState {
    pub fn new(patch: u32, cell_count: usize, history_cap: usize) -> Self {
        Self {
            patch,
            cells: (0..cell_count).map(|_| CellState::new(history_cap)).collect(),
            pressure_avg: (0.0, 0.0, 0.0),
            pressure_initialized: false,
            generation: 0,
            last_aggregated_generation: 0,
        }
    }

    pub fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether the pressure centroid needs to be recomputed: true iff a
    /// record has landed since the last aggregation.
    pub fn pressure_stale(&self) -> bool {
        self.generation != self.last_aggregated_generation
    }

    pub fn mark_pressure_fresh(&mut self) {
        self.last_aggregated_generation = self.generation;
    }

    pub fn pressure_initialized(&self) -> bool {
        self.pressure_initialized
    }

    pub fn set_pressure_initialized(&mut self, v: bool) {
        self.pressure_initialized = v;
    }
}
