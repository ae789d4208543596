/// Convenience result type used across inkframe.
pub type InkframeResult<T> = Result<T, InkframeError>;

/// Top-level error taxonomy used by engine and coordinator APIs.
///
/// The variants follow the fault kinds a scene can produce. The intentional short-circuit is not
/// an error and is modelled by [`crate::Signal::Break`] instead.
#[derive(thiserror::Error, Debug)]
pub enum InkframeError {
    /// Malformed persisted device configuration or scene JSON.
    #[error("validation error: {0}")]
    Validation(String),

    /// An App's effective configuration could not be resolved, or the App refused to construct.
    #[error("config error: {0}")]
    Config(String),

    /// The scene graph itself is invalid (dangling edge, unknown node kind, unregistered app,
    /// runaway recursion). Never isolated per node.
    #[error("structural error: {0}")]
    Structural(String),

    /// Raised inside an App's `run`. Recovered at node granularity by the engine.
    #[error("run error: {0}")]
    Run(String),

    /// The display driver failed to accept a frame.
    #[error("driver error: {0}")]
    Driver(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InkframeError {
    /// Build a [`InkframeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`InkframeError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`InkframeError::Structural`] value.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Build a [`InkframeError::Run`] value.
    pub fn run(msg: impl Into<String>) -> Self {
        Self::Run(msg.into())
    }

    /// Build a [`InkframeError::Driver`] value.
    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    /// Whether this fault invalidates the whole dispatch rather than a single node.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
