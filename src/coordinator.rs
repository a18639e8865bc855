//! Read-through generation cache over a [`GenerationStore`].
//!
//! Generation 0 is written when a board is created. Any other generation is
//! computed on first request from an anchor (generation 0 unless
//! [`AnchorPolicy::NearestCached`] is configured) and then persisted.
//! Concurrent misses on the same board are serialized by a per-board lock;
//! a duplicate-row error from the store is treated as "already computed" and
//! answered by re-reading the row.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::cell::CellSet;
use crate::config::{AnchorPolicy, LifeConfig};
use crate::detector::{detect_final_state, FinalState};
use crate::engine;
use crate::error::LifeError;
use crate::store::{Board, BoardId, Generation, GenerationStore, StoreError};

pub struct GenerationCoordinator<S> {
    store: S,
    config: LifeConfig,
    board_locks: Mutex<HashMap<BoardId, Arc<Mutex<()>>>>,
}

impl<S: GenerationStore> GenerationCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LifeConfig::default())
    }

    pub fn with_config(store: S, config: LifeConfig) -> Self {
        Self {
            store,
            config,
            board_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    /// Create a board; its generation 0 is persisted immediately.
    pub fn create_board(&self, name: Option<String>, cells: CellSet) -> Result<Board, LifeError> {
        let population = cells.population();
        let board = self.store.create_board(name, cells)?;
        log::info!("created {} with {population} live cells", board.id);
        Ok(board)
    }

    pub fn board(&self, id: BoardId) -> Result<Board, LifeError> {
        self.store.board(id)?.ok_or(LifeError::BoardNotFound(id))
    }

    /// Delete a board together with all of its generations.
    pub fn delete_board(&self, id: BoardId) -> Result<(), LifeError> {
        if !self.store.delete_board(id)? {
            return Err(LifeError::BoardNotFound(id));
        }
        self.board_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        log::info!("deleted {id}");
        Ok(())
    }

    /// Generation `number` of the board, computed and cached on a miss.
    pub fn generation(
        &self,
        id: BoardId,
        number: i64,
        cancel: &CancellationToken,
    ) -> Result<Generation, LifeError> {
        let target = u64::try_from(number).map_err(|_| LifeError::OutOfRange(number))?;

        if let Some(cached) = self.store.generation_by_number(id, target)? {
            log::debug!("cache hit: generation {target} of {id}");
            return Ok(cached);
        }

        let lock = self.board_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have filled it while we waited.
        if let Some(cached) = self.store.generation_by_number(id, target)? {
            return Ok(cached);
        }

        let anchor = self.anchor(id, target)?;
        log::debug!(
            "cache miss: generation {target} of {id}, computing from generation {}",
            anchor.number
        );
        let cells = engine::advance(&anchor.cells, target - anchor.number, cancel)?;
        self.persist(Generation::new(id, target, cells))
    }

    /// The generation after the highest one stored for the board.
    pub fn next_generation(
        &self,
        id: BoardId,
        cancel: &CancellationToken,
    ) -> Result<Generation, LifeError> {
        let latest = self
            .store
            .latest_generation(id)?
            .ok_or(LifeError::BoardNotFound(id))?;
        let number = latest.number + 1;

        if let Some(cached) = self.store.generation_by_number(id, number)? {
            return Ok(cached);
        }

        let lock = self.board_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = self.store.generation_by_number(id, number)? {
            return Ok(cached);
        }

        log::debug!("stepping {id} from generation {}", latest.number);
        let cells = engine::next_generation(&latest.cells, cancel)?;
        self.persist(Generation::new(id, number, cells))
    }

    /// Search for the board's final state starting from generation 0.
    ///
    /// Generations explored here are not persisted; every call recomputes.
    pub fn final_state(
        &self,
        id: BoardId,
        max_iterations: u64,
        cancel: &CancellationToken,
    ) -> Result<FinalState, LifeError> {
        let origin = self
            .store
            .generation_by_number(id, 0)?
            .ok_or(LifeError::BoardNotFound(id))?;

        log::info!("final-state search for {id}, at most {max_iterations} generations");
        let state = detect_final_state(&origin.cells, max_iterations, cancel).map_err(|err| {
            if matches!(err, LifeError::Cancelled) {
                log::warn!("final-state search for {id} cancelled");
            }
            err
        })?;
        log::info!("{id}: {state}");
        Ok(state)
    }

    /// [`final_state`](Self::final_state) bounded by the configured
    /// `max_iterations_for_final_state`.
    pub fn final_state_default(
        &self,
        id: BoardId,
        cancel: &CancellationToken,
    ) -> Result<FinalState, LifeError> {
        self.final_state(id, self.config.max_iterations_for_final_state, cancel)
    }

    fn board_lock(&self, id: BoardId) -> Arc<Mutex<()>> {
        let mut locks = self.board_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    fn anchor(&self, id: BoardId, target: u64) -> Result<Generation, LifeError> {
        let anchor = match self.config.anchor_policy {
            AnchorPolicy::Origin => self.store.generation_by_number(id, 0)?,
            AnchorPolicy::NearestCached => self.store.nearest_generation(id, target)?,
        }
        .ok_or(LifeError::BoardNotFound(id))?;

        if anchor.number > target {
            return Err(StoreError::Backend(format!(
                "anchor generation {} is past requested generation {target}",
                anchor.number
            ))
            .into());
        }
        Ok(anchor)
    }

    fn persist(&self, generation: Generation) -> Result<Generation, LifeError> {
        let (id, number) = (generation.board, generation.number);
        match self.store.add_generation(generation) {
            Ok(stored) => {
                log::debug!("stored generation {number} of {id}");
                Ok(stored)
            }
            Err(StoreError::DuplicateGeneration { .. }) => {
                log::info!("generation {number} of {id} was stored concurrently, re-reading it");
                self.store
                    .generation_by_number(id, number)?
                    .ok_or(LifeError::BoardNotFound(id))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<S: GenerationStore + 'static> GenerationCoordinator<S> {
    /// Run a final-state search on the blocking pool.
    ///
    /// The search is cancelled when `timeout` elapses or when the returned
    /// future is dropped; either way nothing is kept and a retry starts from
    /// generation 0 again.
    pub async fn final_state_within(
        self: Arc<Self>,
        id: BoardId,
        max_iterations: u64,
        timeout: Option<Duration>,
    ) -> Result<FinalState, LifeError> {
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();

        let coordinator = Arc::clone(&self);
        let task = tokio::task::spawn_blocking(move || {
            coordinator.final_state(id, max_iterations, &token)
        });

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    log::warn!("final-state search for {id} timed out after {limit:?}");
                    return Err(LifeError::Cancelled);
                }
            },
            None => task.await,
        };
        guard.disarm();

        match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(LifeError::Cancelled),
        }
    }

    /// [`final_state_within`](Self::final_state_within) using the configured
    /// iteration bound and timeout.
    pub async fn final_state_async(self: Arc<Self>, id: BoardId) -> Result<FinalState, LifeError> {
        let max_iterations = self.config.max_iterations_for_final_state;
        let timeout = self.config.final_state_timeout();
        self.final_state_within(id, max_iterations, timeout).await
    }
}
