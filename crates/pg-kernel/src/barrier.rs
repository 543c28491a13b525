use std::sync::{Condvar, Mutex};

use crate::error::{KernelError, Result};

/// Reusable barrier shared by the workers of one group.
///
/// Every call to [`wait`](GroupBarrier::wait) blocks until all `parties`
/// workers have arrived, after which the barrier resets for the next phase.
/// Writes made by any worker before arriving are visible to every worker
/// after it returns.
///
/// Unlike `std::sync::Barrier`, this one can be poisoned: once a worker
/// calls [`poison`](GroupBarrier::poison), every current and future waiter
/// returns [`KernelError::GroupAborted`] instead of blocking forever.
#[derive(Debug)]
pub struct GroupBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    poisoned: bool,
}

impl GroupBarrier {
    /// Create a barrier for `parties` workers. A barrier for zero parties
    /// behaves like one for a single party.
    pub fn new(parties: usize) -> Self {
        GroupBarrier {
            parties: parties.max(1),
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    /// Number of workers that must arrive before the barrier releases.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Block until all parties have arrived.
    ///
    /// Returns `Ok(true)` for exactly one worker per phase (the last to
    /// arrive), `Ok(false)` for the others.
    pub fn wait(&self) -> Result<bool> {
        let mut state = self.state.lock().map_err(|_| KernelError::GroupAborted)?;
        if state.poisoned {
            return Err(KernelError::GroupAborted);
        }

        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            return Ok(true);
        }

        let generation = state.generation;
        while state.generation == generation && !state.poisoned {
            state = self.cvar.wait(state).map_err(|_| KernelError::GroupAborted)?;
        }
        if state.generation == generation {
            return Err(KernelError::GroupAborted);
        }
        Ok(false)
    }

    /// Release every waiter with an error and make all later waits fail.
    pub fn poison(&self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.poisoned = true;
        self.cvar.notify_all();
    }

    pub fn is_poisoned(&self) -> bool {
        match self.state.lock() {
            Ok(state) => state.poisoned,
            Err(_) => true,
        }
    }
}

/// Poisons the barrier if dropped while the owning thread is unwinding.
pub(crate) struct PoisonOnPanic<'a>(pub(crate) &'a GroupBarrier);

impl Drop for PoisonOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.poison();
        }
    }
}
