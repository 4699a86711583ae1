//! The physical arrangement of patches and cells.
//!
//! Layout is read-mostly: it is built once at load time and never mutated
//! afterward, so it carries no internal lock — callers share it behind an
//! `Arc`.
use crate::error::SensorError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CellEntry {
    cell: u32,
    x: f64,
    y: f64,
}

#[derive(Debug, Clone)]
struct PatchEntry {
    patch: u32,
    cells: Vec<CellEntry>,
    cell_index: HashMap<u32, usize>,
}

/// Holds patch ids, the cells within each patch, and each cell's 2-D
/// position. Built from `skin_config::LayoutRow`s via [`Layout::load`].
#[derive(Debug, Clone)]
pub struct Layout {
    patches: Vec<PatchEntry>,
    patch_index: HashMap<u32, usize>,
}

impl Layout {
    /// Builds a layout from parsed rows, preserving the order rows were
    /// declared in (both across patches and within a patch's cells).
    /// Returns `DuplicateCell` on a repeated `(patch, cell)` pair.
    pub fn load(rows: &[skin_config::LayoutRow]) -> Result<Self, SensorError> {
        let mut patches: Vec<PatchEntry> = Vec::new();
        let mut patch_index: HashMap<u32, usize> = HashMap::new();

        for row in rows {
            let patch_idx = *patch_index.entry(row.patch).or_insert_with(|| {
                patches.push(PatchEntry {
                    patch: row.patch,
                    cells: Vec::new(),
                    cell_index: HashMap::new(),
                });
                patches.len() - 1
            });
            let entry = &mut patches[patch_idx];
            if entry.cell_index.contains_key(&row.cell) {
                return Err(SensorError::DuplicateCell {
                    patch: row.patch,
                    cell: row.cell,
                });
            }
            entry.cell_index.insert(row.cell, entry.cells.len());
            entry.cells.push(CellEntry {
                cell: row.cell,
                x: row.x,
                y: row.y,
            });
        }

        Ok(Self {
            patches,
            patch_index,
        })
    }

    /// Patch ids in declaration order.
    pub fn patches(&self) -> Vec<u32> {
        self.patches.iter().map(|p| p.patch).collect()
    }

    /// Cell ids for `patch`, in declaration order. Empty if the patch is
    /// not in this layout.
    pub fn cells(&self, patch: u32) -> Vec<u32> {
        self.patch_index
            .get(&patch)
            .map(|&idx| self.patches[idx].cells.iter().map(|c| c.cell).collect())
            .unwrap_or_default()
    }

    /// Number of cells declared for `patch`.
    pub fn cell_count(&self, patch: u32) -> usize {
        self.patch_index
            .get(&patch)
            .map_or(0, |&idx| self.patches[idx].cells.len())
    }

    pub fn position(&self, patch: u32, cell: u32) -> Option<(f64, f64)> {
        let p = &self.patches[*self.patch_index.get(&patch)?];
        let c = &p.cells[*p.cell_index.get(&cell)?];
        Some((c.x, c.y))
    }

    pub fn has_patch(&self, patch: u32) -> bool {
        self.patch_index.contains_key(&patch)
    }

    pub fn has(&self, patch: u32, cell: u32) -> bool {
        self.patch_index
            .get(&patch)
            .is_some_and(|&idx| self.patches[idx].cell_index.contains_key(&cell))
    }

    /// Index of `cell` within `patch`'s cell vector, matching the order
    /// used by `PatchState::cells` for the same patch.
    pub fn cell_slot(&self, patch: u32, cell: u32) -> Option<usize> {
        let idx = *self.patch_index.get(&patch)?;
        self.patches[idx].cell_index.get(&cell).copied()
    }
}
