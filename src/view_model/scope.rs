// Background task scope tied to a view-model's lifetime

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::ui_state::UiState;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Gate {
    open: bool,
    generation: u64,
}

#[derive(Debug)]
struct Shared {
    gate: Mutex<Gate>,
    state: watch::Sender<UiState>,
}

/// Write side of the state cell handed to one launched task.
///
/// A publisher only writes while its scope is open and no newer task has
/// been launched.
#[derive(Debug, Clone)]
pub struct StatePublisher {
    shared: Arc<Shared>,
    generation: u64,
}

impl StatePublisher {
    /// Replace the current state. Returns `false` once cancelled or superseded.
    pub fn publish(&self, state: UiState) -> bool {
        // The gate stays locked across the send so `cancel` and `launch` cannot interleave
        let gate = lock(&self.shared.gate);
        if !gate.open || gate.generation != self.generation {
            return false;
        }
        self.shared.state.send_replace(state);
        true
    }
}

/// Owns the task a view-model launches. A new launch replaces the previous
/// task; cancelling aborts it and closes the state cell for good.
#[derive(Debug)]
pub struct ViewModelScope {
    shared: Arc<Shared>,
    tasks: Mutex<JoinSet<()>>,
}

impl ViewModelScope {
    pub fn new(initial: UiState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                gate: Mutex::new(Gate {
                    open: true,
                    generation: 0,
                }),
                state,
            }),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn current(&self) -> UiState {
        self.shared.state.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.shared.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.shared.gate).open
    }

    /// Whether a launched task is still running
    pub fn is_busy(&self) -> bool {
        let mut tasks = lock(&self.tasks);
        while tasks.try_join_next().is_some() {}
        !tasks.is_empty()
    }

    /// Abort whatever is running and spawn the future built by `start`.
    ///
    /// `start` runs synchronously with a publisher for the new task, so it can
    /// publish a first state before anything is spawned. Ignored after `cancel`.
    pub fn launch<F, Fut>(&self, start: F)
    where
        F: FnOnce(StatePublisher) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = lock(&self.tasks);
        let publisher = {
            let mut gate = lock(&self.shared.gate);
            if !gate.open {
                tracing::debug!("launch on a cancelled scope ignored");
                return;
            }
            gate.generation += 1;
            StatePublisher {
                shared: Arc::clone(&self.shared),
                generation: gate.generation,
            }
        };

        while tasks.try_join_next().is_some() {}
        if !tasks.is_empty() {
            tracing::debug!(tasks = tasks.len(), "replacing in-flight request");
            tasks.abort_all();
        }
        tasks.spawn(start(publisher));
    }

    /// Close the state cell and abort every in-flight task. Idempotent.
    pub fn cancel(&self) {
        lock(&self.shared.gate).open = false;
        let mut tasks = lock(&self.tasks);
        if !tasks.is_empty() {
            tracing::debug!(tasks = tasks.len(), "cancelling view-model scope");
        }
        tasks.abort_all();
    }

    #[cfg(test)]
    pub fn task_count(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl Drop for ViewModelScope {
    fn drop(&mut self) {
        self.cancel();
    }
}
