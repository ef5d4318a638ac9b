//! # Command publisher
//!
//! Runs [`DbwInterface::publish_cycle`] on its own thread once every `pub_period_ms`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

// Internal
use crate::interface::{DbwBus, DbwInterface};
use util::{throttle::LogThrottle, warn_throttle};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to the publisher thread. The thread is stopped when this is dropped.
pub struct CmdPublisher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdPublisher {
    /// Start publishing.
    pub fn spawn<B: DbwBus + 'static>(interface: Arc<DbwInterface<B>>) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("dbw_cmd_pub".into())
            .spawn(move || publish_loop(&interface, &thread_stop))?;

        info!("Command publisher started");

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the publisher and wait for the thread to finish.
    pub fn stop(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.stop.store(true, Ordering::Release);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Command publisher thread panicked");
            } else {
                debug!("Command publisher stopped");
            }
        }
    }
}

impl Drop for CmdPublisher {
    fn drop(&mut self) {
        self.join();
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn publish_loop<B: DbwBus>(interface: &DbwInterface<B>, stop: &AtomicBool) {
    let period = Duration::from_millis(interface.params().pub_period_ms);
    let overrun_throttle = LogThrottle::new(Duration::from_secs_f64(
        interface.params().log_throttle_period_s,
    ));

    while !stop.load(Ordering::Acquire) {
        let cycle_start_instant = Instant::now();

        interface.publish_cycle();

        let cycle_dur = Instant::now() - cycle_start_instant;

        match period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => {
                warn_throttle!(
                    overrun_throttle,
                    Instant::now(),
                    "Publish cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - period.as_secs_f64()
                );
            }
        }
    }
}
