//! Boards, generations and the persistence contract the coordinator reads
//! through.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use thiserror::Error;

use crate::cell::CellSet;

/// Opaque board identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardId(pub u64);

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "board-{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub id: BoardId,
    pub name: Option<String>,
    pub created_at: SystemTime,
}

/// One persisted snapshot of a board. `(board, number)` is unique per store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generation {
    pub board: BoardId,
    pub number: u64,
    pub cells: CellSet,
    pub computed_at: SystemTime,
}

impl Generation {
    pub fn new(board: BoardId, number: u64, cells: CellSet) -> Self {
        Self {
            board,
            number,
            cells,
            computed_at: SystemTime::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// Insert collided with an existing `(board, number)` row.
    #[error("generation {number} of {board} already exists")]
    DuplicateGeneration { board: BoardId, number: u64 },

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Persistence collaborator for boards and their generations.
pub trait GenerationStore: Send + Sync {
    /// Create a board and its generation 0 atomically.
    fn create_board(&self, name: Option<String>, cells: CellSet) -> Result<Board, StoreError>;

    fn board(&self, id: BoardId) -> Result<Option<Board>, StoreError>;

    /// Delete a board and every generation it owns. `false` if it did not exist.
    fn delete_board(&self, id: BoardId) -> Result<bool, StoreError>;

    fn generation_by_number(
        &self,
        id: BoardId,
        number: u64,
    ) -> Result<Option<Generation>, StoreError>;

    /// Highest-numbered generation stored for the board.
    fn latest_generation(&self, id: BoardId) -> Result<Option<Generation>, StoreError>;

    /// Highest-numbered stored generation not above the requested number.
    ///
    /// Stores without an ordered index may keep the default, which answers
    /// with generation 0.
    fn nearest_generation(
        &self,
        id: BoardId,
        _number: u64,
    ) -> Result<Option<Generation>, StoreError> {
        self.generation_by_number(id, 0)
    }

    /// Insert a generation. Fails with [`StoreError::BoardNotFound`] or
    /// [`StoreError::DuplicateGeneration`].
    fn add_generation(&self, generation: Generation) -> Result<Generation, StoreError>;
}

struct BoardRecord {
    board: Board,
    generations: BTreeMap<u64, Generation>,
}

#[derive(Default)]
struct MemoryInner {
    next_id: u64,
    boards: HashMap<BoardId, BoardRecord>,
}

/// In-process store keeping each board's generations ordered by number.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn with_record<T>(
        &self,
        id: BoardId,
        f: impl FnOnce(&BoardRecord) -> Option<T>,
    ) -> Result<Option<T>, StoreError> {
        Ok(self.lock()?.boards.get(&id).and_then(f))
    }
}

impl GenerationStore for MemoryStore {
    fn create_board(&self, name: Option<String>, cells: CellSet) -> Result<Board, StoreError> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let id = BoardId(inner.next_id);
        let board = Board {
            id,
            name,
            created_at: SystemTime::now(),
        };
        let generations = BTreeMap::from([(0, Generation::new(id, 0, cells))]);
        inner.boards.insert(
            id,
            BoardRecord {
                board: board.clone(),
                generations,
            },
        );
        Ok(board)
    }

    fn board(&self, id: BoardId) -> Result<Option<Board>, StoreError> {
        self.with_record(id, |record| Some(record.board.clone()))
    }

    fn delete_board(&self, id: BoardId) -> Result<bool, StoreError> {
        Ok(self.lock()?.boards.remove(&id).is_some())
    }

    fn generation_by_number(
        &self,
        id: BoardId,
        number: u64,
    ) -> Result<Option<Generation>, StoreError> {
        self.with_record(id, |record| record.generations.get(&number).cloned())
    }

    fn latest_generation(&self, id: BoardId) -> Result<Option<Generation>, StoreError> {
        self.with_record(id, |record| {
            record.generations.last_key_value().map(|(_, g)| g.clone())
        })
    }

    fn nearest_generation(
        &self,
        id: BoardId,
        number: u64,
    ) -> Result<Option<Generation>, StoreError> {
        self.with_record(id, |record| {
            record
                .generations
                .range(..=number)
                .next_back()
                .map(|(_, g)| g.clone())
        })
    }

    fn add_generation(&self, generation: Generation) -> Result<Generation, StoreError> {
        let mut inner = self.lock()?;
        let record = inner
            .boards
            .get_mut(&generation.board)
            .ok_or(StoreError::BoardNotFound(generation.board))?;
        if record.generations.contains_key(&generation.number) {
            return Err(StoreError::DuplicateGeneration {
                board: generation.board,
                number: generation.number,
            });
        }
        record.generations.insert(generation.number, generation.clone());
        Ok(generation)
    }
}
