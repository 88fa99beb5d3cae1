//! Keyboard focus order and directional movement over overlay regions
//!
//! Works on region centres in source units with the y axis flipped to a
//! top-left origin, so "up" means towards the top of the page.

use std::cmp::Ordering;

/// Arrow direction for focus movement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Rows closer than this (source units) count as the same line
const ROW_TOLERANCE: f64 = 2.0;

/// Indices of `centers` in reading order: top-to-bottom, then left-to-right.
pub fn reading_order(centers: &[(f64, f64)]) -> Vec<usize> {
    let mut by_y: Vec<usize> = (0..centers.len()).collect();
    by_y.sort_by(|&a, &b| centers[a].1.total_cmp(&centers[b].1).then(a.cmp(&b)));

    let mut order = Vec::with_capacity(by_y.len());
    let mut row: Vec<usize> = Vec::new();
    let mut row_top = f64::NEG_INFINITY;
    for idx in by_y {
        let y = centers[idx].1;
        if !row.is_empty() && y - row_top > ROW_TOLERANCE {
            flush_row(&mut row, centers, &mut order);
        }
        if row.is_empty() {
            row_top = y;
        }
        row.push(idx);
    }
    flush_row(&mut row, centers, &mut order);
    order
}

fn flush_row(row: &mut Vec<usize>, centers: &[(f64, f64)], order: &mut Vec<usize>) {
    row.sort_by(|&a, &b| compare_x(centers[a], centers[b]).then(a.cmp(&b)));
    order.append(row);
}

fn compare_x(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0)
}

/// Nearest region from `from` in `direction` among those `eligible` accepts.
///
/// Candidates must lie strictly on the pressed side; distance weighs the
/// off-axis offset double so movement prefers staying in line.
pub fn nearest_in_direction(
    centers: &[(f64, f64)],
    from: usize,
    direction: Direction,
    eligible: impl Fn(usize) -> bool,
) -> Option<usize> {
    let (fx, fy) = *centers.get(from)?;
    centers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != from && eligible(i))
        .filter_map(|(i, &(x, y))| {
            let dx = x - fx;
            let dy = y - fy;
            let (primary, secondary) = match direction {
                Direction::Up => (-dy, dx.abs()),
                Direction::Down => (dy, dx.abs()),
                Direction::Left => (-dx, dy.abs()),
                Direction::Right => (dx, dy.abs()),
            };
            (primary > 0.0).then_some((i, primary + 2.0 * secondary))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(i, _)| i)
}
