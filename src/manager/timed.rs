use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::debug;
use rand::Rng;

use super::Manager;

/// Tick interval bounds for a [`TimedManager`].
///
/// Each tick waits a fresh uniformly random period inside the bounds, so a
/// fleet of peers started together does not burst in lockstep.
#[derive(Debug, Clone)]
pub struct TimedManagerConfig {
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for TimedManagerConfig {
    fn default() -> Self {
        TimedManagerConfig {
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(2),
        }
    }
}

/// Wraps a [`Manager`] with a scheduler thread that drives
/// [`Manager::retransmit_all`] on a jitter-randomized interval.
///
/// The thread stops when the wrapper is dropped.
pub struct TimedManager {
    manager: Arc<Manager>,
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl TimedManager {
    pub fn new(manager: Arc<Manager>, config: TimedManagerConfig) -> Self {
        let (shutdown, ticks) = bounded::<()>(0);
        let min_ms = config.min_interval.as_millis() as u64;
        // An inverted range collapses to the minimum bound.
        let max_ms = (config.max_interval.as_millis() as u64).max(min_ms);

        let tick_target = manager.clone();
        let handle = thread::spawn(move || {
            let mut rng = rand::thread_rng();
            loop {
                let wait = Duration::from_millis(rng.gen_range(min_ms..=max_ms));
                match ticks.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        tick_target.retransmit_all();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        debug!("retransmit scheduler stopping");
                        return;
                    }
                }
            }
        });

        TimedManager {
            manager,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }
}

impl Drop for TimedManager {
    fn drop(&mut self) {
        // Wake the scheduler; a send also fails fine if it already exited.
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
