//! Conway's Game of Life on an unbounded sparse grid, with final-state
//! detection and a read-through cache of per-board generations.
//!
//! ```
//! use sparse_life::{CancellationToken, CellSet, GenerationCoordinator, MemoryStore};
//!
//! let coordinator = GenerationCoordinator::new(MemoryStore::new());
//! let board = coordinator
//!     .create_board(Some("blinker".into()), CellSet::from_cells([(0, 0), (1, 0), (2, 0)]))
//!     .unwrap();
//!
//! let cancel = CancellationToken::new();
//! let second = coordinator.generation(board.id, 2, &cancel).unwrap();
//! assert_eq!(second.cells.population(), 3);
//!
//! let fin = coordinator.final_state_default(board.id, &cancel).unwrap();
//! assert_eq!(fin.cycle_length(), Some(2));
//! ```

pub mod cancel;
pub mod cell;
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod engine;
pub mod error;
pub mod patterns;
pub mod store;

pub use cancel::{CancelOnDrop, CancellationToken};
pub use cell::{Cell, CellSet};
pub use config::{AnchorPolicy, ConfigError, LifeConfig};
pub use coordinator::GenerationCoordinator;
pub use detector::{detect_final_state, FinalState, Outcome, Stabilization, StateKey};
pub use engine::{advance, compute_generation, next_generation};
pub use error::LifeError;
pub use store::{Board, BoardId, Generation, GenerationStore, MemoryStore, StoreError};
