//! Final-state detection: run a pattern forward until it dies out, settles
//! into a still life, or revisits an earlier state.
//!
//! Every state seen is recorded under its [`StateKey`]. A repeat one step
//! apart whose cells equal the previous step is a still life and is reported
//! as [`Outcome::Stabilized`], never as a cycle of length 1. Longer repeats
//! are [`Outcome::Cycle`]. Running out of iterations is
//! [`Outcome::Inconclusive`], which is a normal result.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::cancel::CancellationToken;
use crate::cell::{Cell, CellSet};
use crate::engine::next_generation;
use crate::error::LifeError;

/// Order-independent key for a cell set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// Sentinel for the empty set.
    Empty,
    /// Cells sorted by (x, y).
    Cells(Box<[Cell]>),
}

impl StateKey {
    pub fn of(cells: &CellSet) -> Self {
        if cells.is_empty() {
            Self::Empty
        } else {
            Self::Cells(cells.sorted().into_boxed_slice())
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Cells(cells) => {
                for (i, cell) in cells.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, "{cell}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stabilization {
    /// Unchanged by one more step.
    StillLife,
    /// No cells left.
    Extinct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Stabilized(Stabilization),
    Cycle { length: u64, start_generation: u64 },
    /// The iteration bound was hit while the pattern was still evolving.
    Inconclusive,
}

/// Result of a final-state search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FinalState {
    pub cells: CellSet,
    pub generation: u64,
    pub outcome: Outcome,
}

impl FinalState {
    pub fn is_cyclic(&self) -> bool {
        matches!(self.outcome, Outcome::Cycle { .. })
    }

    pub fn is_stable(&self) -> bool {
        matches!(self.outcome, Outcome::Stabilized(_))
    }

    pub fn reached_max_iterations(&self) -> bool {
        self.outcome == Outcome::Inconclusive
    }

    pub fn cycle_length(&self) -> Option<u64> {
        match self.outcome {
            Outcome::Cycle { length, .. } => Some(length),
            _ => None,
        }
    }

    pub fn cycle_start_generation(&self) -> Option<u64> {
        match self.outcome {
            Outcome::Cycle { start_generation, .. } => Some(start_generation),
            _ => None,
        }
    }
}

impl fmt::Display for FinalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Stabilized(Stabilization::StillLife) => {
                write!(f, "reached a stable state at generation {}", self.generation)
            }
            Outcome::Stabilized(Stabilization::Extinct) => {
                write!(f, "died out at generation {}", self.generation)
            }
            Outcome::Cycle { length, start_generation } => write!(
                f,
                "entered a cycle of length {length} starting at generation {start_generation}"
            ),
            Outcome::Inconclusive => write!(
                f,
                "still evolving after {} generations (population {})",
                self.generation,
                self.cells.population()
            ),
        }
    }
}

/// Run `initial` forward for at most `max_iterations` generations.
pub fn detect_final_state(
    initial: &CellSet,
    max_iterations: u64,
    cancel: &CancellationToken,
) -> Result<FinalState, LifeError> {
    let mut history: HashMap<StateKey, u64> = HashMap::new();
    history.insert(StateKey::of(initial), 0);

    let mut current = initial.clone();
    let mut generation = 0u64;

    while generation < max_iterations {
        cancel.check()?;
        let next = next_generation(&current, cancel)?;
        generation += 1;
        let key = StateKey::of(&next);

        if let Some(&seen_at) = history.get(&key) {
            let length = generation - seen_at;
            let outcome = if length == 1 && next == current {
                Outcome::Stabilized(Stabilization::StillLife)
            } else {
                Outcome::Cycle {
                    length,
                    start_generation: seen_at,
                }
            };
            return Ok(finish(next, generation, outcome));
        }

        if next.is_empty() {
            return Ok(finish(next, generation, Outcome::Stabilized(Stabilization::Extinct)));
        }

        history.insert(key, generation);
        current = next;
    }

    Ok(finish(current, generation, Outcome::Inconclusive))
}

fn finish(cells: CellSet, generation: u64, outcome: Outcome) -> FinalState {
    log::debug!("final state at generation {generation}: {outcome:?}");
    FinalState {
        cells,
        generation,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns;

    fn detect(cells: &CellSet, max_iterations: u64) -> FinalState {
        detect_final_state(cells, max_iterations, &CancellationToken::new()).unwrap()
    }

    #[test]
    fn key_ignores_order() {
        let a = CellSet::from_cells([(2, 0), (0, 1), (0, 0)]);
        let b = CellSet::from_cells([(0, 0), (2, 0), (0, 1)]);
        assert_eq!(StateKey::of(&a), StateKey::of(&b));
        assert_eq!(StateKey::of(&a).to_string(), "0,0;0,1;2,0");
        assert_eq!(StateKey::of(&CellSet::new()), StateKey::Empty);
        assert_eq!(StateKey::Empty.to_string(), "empty");
    }

    #[test]
    fn block_is_stable_not_cyclic() {
        let block = CellSet::from_cells([(0, 0), (1, 0), (0, 1), (1, 1)]);
        let state = detect(&block, 10_000);
        assert!(!state.is_cyclic());
        assert!(state.is_stable());
        assert_eq!(state.outcome, Outcome::Stabilized(Stabilization::StillLife));
        assert_eq!(state.cells, block);
        assert_eq!(state.generation, 1);
        assert_eq!(state.cycle_length(), None);
    }

    #[test]
    fn blinker_is_period_two() {
        let blinker = CellSet::from_cells([(0, 0), (1, 0), (2, 0)]);
        let state = detect(&blinker, 10_000);
        assert!(state.is_cyclic());
        assert_eq!(state.cycle_length(), Some(2));
        assert_eq!(state.cycle_start_generation(), Some(0));
        assert_eq!(state.generation, 2);
        assert_eq!(state.cells, blinker);
        assert!(!state.reached_max_iterations());
    }

    #[test]
    fn pulsar_is_period_three() {
        let pulsar = CellSet::from_pattern(patterns::PULSAR, 0, 0);
        let state = detect(&pulsar, 100);
        assert_eq!(state.cycle_length(), Some(3));
    }

    #[test]
    fn lone_cell_dies_out() {
        let state = detect(&CellSet::from_cells([(0, 0)]), 10_000);
        assert!(!state.is_cyclic());
        assert!(state.cells.is_empty());
        assert_eq!(state.generation, 1);
        assert_eq!(state.outcome, Outcome::Stabilized(Stabilization::Extinct));
    }

    #[test]
    fn empty_input_is_stable() {
        let state = detect(&CellSet::new(), 5);
        assert!(state.is_stable());
        assert!(state.cells.is_empty());
    }

    #[test]
    fn glider_exhausts_small_bound() {
        let glider = CellSet::from_pattern(patterns::GLIDER, 0, 0);
        let state = detect(&glider, 16);
        assert!(state.reached_max_iterations());
        assert!(!state.is_cyclic());
        assert_eq!(state.cycle_length(), None);
        assert_eq!(state.generation, 16);
        assert_eq!(state.cells.population(), 5);
    }

    #[test]
    fn zero_bound_returns_input() {
        let blinker = CellSet::from_cells([(0, 0), (1, 0), (2, 0)]);
        let state = detect(&blinker, 0);
        assert!(state.reached_max_iterations());
        assert_eq!(state.generation, 0);
        assert_eq!(state.cells, blinker);
    }

    #[test]
    fn still_life_after_transient() {
        // Three cells in an L become a block after one step.
        let l = CellSet::from_cells([(0, 0), (1, 0), (0, 1)]);
        let state = detect(&l, 100);
        assert_eq!(state.outcome, Outcome::Stabilized(Stabilization::StillLife));
        assert_eq!(state.generation, 2);
    }

    #[test]
    fn block_at_the_coordinate_limit_is_still_life() {
        let (x, y) = (i64::MAX - 1, i64::MAX - 1);
        let block = CellSet::from_cells([(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)]);
        let state = detect(&block, 10);
        assert_eq!(state.outcome, Outcome::Stabilized(Stabilization::StillLife));
        assert_eq!(state.cells, block);
    }

    #[test]
    fn cancelled_detection_fails() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let glider = CellSet::from_pattern(patterns::GLIDER, 0, 0);
        let result = detect_final_state(&glider, 100, &cancel);
        assert!(matches!(result, Err(LifeError::Cancelled)));
    }

    #[test]
    fn display_distinguishes_outcomes() {
        let still = detect(&CellSet::from_cells([(0, 0), (1, 0), (0, 1), (1, 1)]), 10);
        assert!(still.to_string().starts_with("reached a stable state"));
        let cycle = detect(&CellSet::from_cells([(0, 0), (1, 0), (2, 0)]), 10);
        assert!(cycle.to_string().starts_with("entered a cycle of length 2"));
        let evolving = detect(&CellSet::from_pattern(patterns::GLIDER, 0, 0), 3);
        assert!(evolving.to_string().starts_with("still evolving after 3"));
    }
}
