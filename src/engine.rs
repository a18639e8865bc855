//! Conway's rules (B3/S23) over a sparse cell set.
//!
//! Algorithm: for every live cell, increment the neighbor count of all its
//! eight neighbors, then apply the birth/survival rules to the counted cells.
//! Dead regions cost nothing; a step is O(alive × 9).

use std::collections::HashMap;

use crate::cancel::CancellationToken;
use crate::cell::{Cell, CellSet};
use crate::error::LifeError;

/// Advance `alive` by one generation.
///
/// Fails with [`LifeError::Cancelled`] if `cancel` fires while the step runs.
pub fn next_generation(alive: &CellSet, cancel: &CancellationToken) -> Result<CellSet, LifeError> {
    let mut neighbor_counts: HashMap<Cell, u8> = HashMap::with_capacity(alive.population() * 4);

    for cell in alive {
        cancel.check()?;
        for neighbor in cell.neighbors() {
            *neighbor_counts.entry(neighbor).or_insert(0) += 1;
        }
    }

    let mut next = CellSet::with_capacity(alive.population());
    for (cell, count) in neighbor_counts {
        cancel.check()?;
        let lives = match count {
            3 => true,                  // birth or survival
            2 => alive.is_alive(&cell), // survival only
            _ => false,
        };
        if lives {
            next.insert(cell);
        }
    }
    Ok(next)
}

/// Advance `initial` by `steps` generations.
pub fn advance(
    initial: &CellSet,
    steps: u64,
    cancel: &CancellationToken,
) -> Result<CellSet, LifeError> {
    let mut current = initial.clone();
    for _ in 0..steps {
        cancel.check()?;
        current = next_generation(&current, cancel)?;
    }
    Ok(current)
}

/// Compute generation `target` counted from `initial` as generation 0.
///
/// `target == 0` returns `initial` unchanged; a negative target is
/// [`LifeError::OutOfRange`].
pub fn compute_generation(
    initial: &CellSet,
    target: i64,
    cancel: &CancellationToken,
) -> Result<CellSet, LifeError> {
    let steps = u64::try_from(target).map_err(|_| LifeError::OutOfRange(target))?;
    advance(initial, steps, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns;

    fn set(cells: &[(i64, i64)]) -> CellSet {
        CellSet::from_cells(cells.iter().copied())
    }

    fn step(cells: &CellSet) -> CellSet {
        next_generation(cells, &CancellationToken::new()).unwrap()
    }

    #[test]
    fn block_is_still_life() {
        let block = set(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(step(&block), block);
    }

    #[test]
    fn blinker_oscillates() {
        let blinker = set(&[(0, 0), (1, 0), (2, 0)]);
        let vertical = step(&blinker);
        assert_eq!(vertical, set(&[(1, -1), (1, 0), (1, 1)]));
        assert_eq!(step(&vertical), blinker);
    }

    #[test]
    fn lone_cell_dies() {
        assert!(step(&set(&[(0, 0)])).is_empty());
    }

    #[test]
    fn lone_cell_on_the_edge_dies() {
        assert!(step(&set(&[(i64::MAX, 0)])).is_empty());
        assert!(step(&set(&[(i64::MIN, i64::MIN)])).is_empty());
    }

    #[test]
    fn block_in_the_far_corner_is_still_life() {
        let (x, y) = (i64::MAX - 1, i64::MAX - 1);
        let block = set(&[(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)]);
        assert_eq!(step(&block), block);
    }

    #[test]
    fn edge_clips_births_beyond_the_range() {
        // The horizontal phase would need x = i64::MIN - 1.
        let blinker = set(&[(i64::MIN, 0), (i64::MIN, 1), (i64::MIN, 2)]);
        assert_eq!(step(&blinker), set(&[(i64::MIN, 1), (i64::MIN + 1, 1)]));
    }

    #[test]
    fn empty_stays_empty() {
        let cancel = CancellationToken::new();
        assert!(compute_generation(&CellSet::new(), 100, &cancel).unwrap().is_empty());
    }

    #[test]
    fn glider_translates_every_four_generations() {
        let glider = CellSet::from_pattern(patterns::GLIDER, 0, 0);
        let moved = compute_generation(&glider, 4, &CancellationToken::new()).unwrap();
        let shifted: CellSet = glider.iter().map(|c| Cell::new(c.x + 1, c.y + 1)).collect();
        assert_eq!(moved, shifted);
    }

    #[test]
    fn generation_zero_is_identity() {
        let glider = CellSet::from_pattern(patterns::GLIDER, -3, 7);
        let same = compute_generation(&glider, 0, &CancellationToken::new()).unwrap();
        assert_eq!(same, glider);
    }

    #[test]
    fn negative_target_is_out_of_range() {
        let result = compute_generation(&set(&[(0, 0)]), -1, &CancellationToken::new());
        assert!(matches!(result, Err(LifeError::OutOfRange(-1))));
    }

    #[test]
    fn deterministic() {
        let cancel = CancellationToken::new();
        let seed = CellSet::from_pattern(patterns::R_PENTOMINO, 0, 0);
        let a = compute_generation(&seed, 50, &cancel).unwrap();
        let b = compute_generation(&seed, 50, &cancel).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn additive() {
        let cancel = CancellationToken::new();
        let seed = CellSet::from_pattern(patterns::R_PENTOMINO, 0, 0);
        for (a, b) in [(0, 7), (3, 0), (5, 11), (20, 13)] {
            let first = compute_generation(&seed, a, &cancel).unwrap();
            let split = compute_generation(&first, b, &cancel).unwrap();
            let direct = compute_generation(&seed, a + b, &cancel).unwrap();
            assert_eq!(split, direct, "a={a} b={b}");
        }
    }

    #[test]
    fn r_pentomino_grows() {
        let seed = CellSet::from_pattern(patterns::R_PENTOMINO, 0, 0);
        let later = compute_generation(&seed, 10, &CancellationToken::new()).unwrap();
        assert!(later.population() > 5);
    }

    #[test]
    fn cancelled_step_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let gun = CellSet::from_pattern(patterns::GOSPER_GUN, 0, 0);
        assert!(matches!(next_generation(&gun, &cancel), Err(LifeError::Cancelled)));
        assert!(matches!(compute_generation(&gun, 10, &cancel), Err(LifeError::Cancelled)));
    }

    #[test]
    fn cancel_from_another_thread_stops_advance() {
        let cancel = CancellationToken::new();
        let gun = CellSet::from_pattern(patterns::GOSPER_GUN, 0, 0);
        let canceller = {
            let cancel = cancel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                cancel.cancel();
            })
        };
        let result = advance(&gun, u64::MAX, &cancel);
        canceller.join().unwrap();
        assert!(matches!(result, Err(LifeError::Cancelled)));
    }

    #[test]
    fn cancelled_zero_steps_still_returns_input() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let blinker = set(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(compute_generation(&blinker, 0, &cancel).unwrap(), blinker);
    }
}
