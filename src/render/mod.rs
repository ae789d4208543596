//! Turning render dispatches into display writes.
//!
//! The [`coordinator::RenderCoordinator`] is the only sanctioned way into a device's engine once a
//! scene is live. Frames it produces are fitted to the panel by [`normalize`], compared with the
//! displayed frame by [`diff`] and handed to a [`driver::Driver`].

/// Render coordinator.
pub mod coordinator;
/// Exact frame comparison.
pub mod diff;
/// Display driver contract and built-in drivers.
pub mod driver;
/// Scaling and rotation.
pub mod normalize;
/// Periodic refresh loop.
pub mod scheduler;
