/// Execution context and control-flow signal.
pub mod context;
/// Dispatcher.
pub mod engine;
