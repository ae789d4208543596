use crate::foundation::error::{InkframeError, InkframeResult};
use crate::render::coordinator::RenderCoordinator;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// Trigger name used for timer ticks.
pub const SCHEDULE_TRIGGER: &str = "schedule";
/// Trigger name used for external wake-ups.
pub const WAKE_TRIGGER: &str = "trigger";

#[derive(Debug)]
enum Wake {
    Trigger,
    Shutdown,
}

/// Periodic refresh loop for one coordinator.
///
/// Every tick calls [`RenderCoordinator::refresh_image`], so a tick that lands on a running render
/// is coalesced like any other trigger. An external [`SchedulerHandle::trigger`] refreshes right
/// away and restarts the interval.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    limit: Option<u64>,
}

impl Scheduler {
    /// Scheduler ticking every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            limit: None,
        }
    }

    /// Stop on its own after `ticks` refreshes.
    pub fn limit(mut self, ticks: u64) -> Self {
        self.limit = Some(ticks);
        self
    }

    /// Shorthand for `Scheduler::new(interval).start(coordinator)`.
    pub fn spawn(
        coordinator: RenderCoordinator,
        interval: Duration,
    ) -> InkframeResult<SchedulerHandle> {
        Self::new(interval).start(coordinator)
    }

    /// Start the loop on its own thread. The first refresh happens immediately.
    pub fn start(self, coordinator: RenderCoordinator) -> InkframeResult<SchedulerHandle> {
        let (tx, rx) = mpsc::channel::<Wake>();
        let thread = std::thread::Builder::new()
            .name("inkframe-schedule".to_owned())
            .spawn(move || {
                let mut ticks = 0u64;
                let mut trigger = SCHEDULE_TRIGGER;
                loop {
                    coordinator.refresh_image(trigger);
                    ticks += 1;
                    if self.limit.is_some_and(|limit| ticks >= limit) {
                        tracing::debug!(ticks, "scheduler tick limit reached");
                        break;
                    }
                    trigger = match rx.recv_timeout(self.interval) {
                        Ok(Wake::Trigger) => WAKE_TRIGGER,
                        Err(RecvTimeoutError::Timeout) => SCHEDULE_TRIGGER,
                        Ok(Wake::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    };
                }
            })
            .map_err(|e| InkframeError::Other(anyhow::anyhow!("spawn scheduler thread: {e}")))?;
        Ok(SchedulerHandle {
            tx,
            thread: Some(thread),
        })
    }
}

/// Control handle for a running [`Scheduler`]. Dropping it stops the loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    tx: Sender<Wake>,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Refresh now and restart the interval.
    pub fn trigger(&self) {
        let _ = self.tx.send(Wake::Trigger);
    }

    /// Stop the loop and wait for its thread.
    pub fn shutdown(mut self) {
        let _ = self.tx.send(Wake::Shutdown);
        self.join_thread();
    }

    /// Wait for the loop to stop on its own (tick limit reached).
    pub fn join(mut self) {
        self.join_thread();
    }

    fn join_thread(&mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("scheduler thread panicked");
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(Wake::Shutdown);
        self.join_thread();
    }
}
