/// Device configuration (output geometry, timing, active scene).
pub mod device;
/// Persisted scene format.
pub mod model;
pub(crate) mod validate;
