//! Per-patch summaries computed on demand from the current cell state.
//! All three functions iterate cells in layout-declared order so
//! floating-point sums are reproducible for a given snapshot.
//!
//! `cell` is always drawn from `layout.cells(patch.patch)`, so
//! `cell_slot`/`position` lookups for it cannot fail; the `expect`s below
//! document that invariant rather than handle a real error path.
#![allow(clippy::expect_used)]
use crate::cell::PatchState;
use crate::layout::Layout;
use crate::profile::Profile;

/// `avg[p, c]` for each cell in `patch`, in layout order.
pub fn patch_state(layout: &Layout, patch: &PatchState) -> Vec<f64> {
    layout
        .cells(patch.patch)
        .iter()
        .map(|&cell| {
            let slot = layout.cell_slot(patch.patch, cell).expect("cell in layout");
            patch.cells[slot].avg
        })
        .collect()
}

/// Arithmetic mean of `patch_state`, excluding cells with `c1 == 0`
/// (disabled for aggregation).
pub fn patch_mean(layout: &Layout, profile: &Profile, patch: &PatchState) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for cell in layout.cells(patch.patch) {
        let cal = profile.get(patch.patch, cell);
        if cal.c1 == 0.0 {
            continue;
        }
        let slot = layout.cell_slot(patch.patch, cell).expect("cell in layout");
        sum += patch.cells[slot].avg;
        n += 1;
    }
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// `(magnitude, x_bar, y_bar)`: the weight-weighted pressure centroid over
/// enabled, non-negative-clipped cell values, smoothed with
/// `pressure_alpha` and held in `patch.pressure_avg`.
///
/// Only recomputes the raw centroid and advances the smoother when the
/// patch has received a record since the last call (`PatchState`'s
/// generation counter) — calling this twice with no intervening records
/// returns bit-identical results.
pub fn patch_pressure(
    layout: &Layout,
    profile: &Profile,
    patch: &mut PatchState,
    pressure_alpha: f64,
) -> (f64, f64, f64) {
    if !patch.pressure_stale() {
        return patch.pressure_avg;
    }

    let mut magnitude = 0.0;
    let mut wx = 0.0;
    let mut wy = 0.0;
    for cell in layout.cells(patch.patch) {
        let cal = profile.get(patch.patch, cell);
        if cal.c1 == 0.0 {
            continue;
        }
        let slot = layout.cell_slot(patch.patch, cell).expect("cell in layout");
        let w = patch.cells[slot].avg.max(0.0);
        let (x, y) = layout.position(patch.patch, cell).expect("cell in layout");
        magnitude += w;
        wx += w * x;
        wy += w * y;
    }

    let (x_bar, y_bar) = if magnitude > 0.0 {
        (wx / magnitude, wy / magnitude)
    } else {
        (0.0, 0.0)
    };

    let raw = (magnitude, x_bar, y_bar);
    patch.pressure_avg = if patch.pressure_initialized() {
        (
            pressure_alpha.mul_add(raw.0, (1.0 - pressure_alpha) * patch.pressure_avg.0),
            pressure_alpha.mul_add(raw.1, (1.0 - pressure_alpha) * patch.pressure_avg.1),
            pressure_alpha.mul_add(raw.2, (1.0 - pressure_alpha) * patch.pressure_avg.2),
        )
    } else {
        raw
    };
    patch.set_pressure_initialized(true);
    patch.mark_pressure_fresh();
    patch.pressure_avg
}
