//! Core-grid factorization.
//!
//! A node with `n` cores is drawn as a `rows x cols` grid with `rows * cols == n`. The factor pair
//! is chosen so the grid's column/row ratio is as close as possible to the aspect ratio of the area
//! it must fill.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CoreGrid {
    pub rows: u32,
    pub cols: u32,
}

impl CoreGrid {
    pub fn cell_count(self) -> u32 {
        self.rows * self.cols
    }

    /// Column and row of core `index`. Cores fill a column before moving to the next one.
    pub fn cell(self, index: u32) -> (u32, u32) {
        (index / self.rows, index % self.rows)
    }
}

/// Space of the target area that cores cannot use.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorPadding {
    pub horizontal: f64,
    pub vertical: f64,
}

/// Every factor pair of `count`, in candidate order: for each divisor `i <= sqrt(count)` the
/// pair `(i, count / i)` comes before its transpose.
pub fn factor_pairs(count: u32) -> Vec<CoreGrid> {
    let mut out = Vec::new();
    let mut i = 1u32;
    while u64::from(i) * u64::from(i) <= u64::from(count) {
        if count % i == 0 {
            let j = count / i;
            out.push(CoreGrid { rows: i, cols: j });
            if i != j {
                out.push(CoreGrid { rows: j, cols: i });
            }
        }
        i += 1;
    }
    out
}

/// Picks the factor pair of `count` whose `cols / rows` ratio is closest to the usable area's
/// `width / height`. Usable dimensions are clamped to at least 1 so degenerate areas still get a
/// grid. Ties keep the earliest candidate. Returns `None` when `count` is zero.
pub fn best_factor(
    area_width: f64,
    area_height: f64,
    count: u32,
    padding: FactorPadding,
) -> Option<CoreGrid> {
    if count == 0 {
        return None;
    }
    let usable_width = (area_width - padding.horizontal).max(1.0);
    let usable_height = (area_height - padding.vertical).max(1.0);
    let target = usable_width / usable_height;

    let mut best: Option<(CoreGrid, f64)> = None;
    for grid in factor_pairs(count) {
        let score = (f64::from(grid.cols) / f64::from(grid.rows) - target).abs();
        match best {
            Some((_, s)) if s <= score => {}
            _ => best = Some((grid, score)),
        }
    }
    best.map(|(grid, _)| grid)
}
