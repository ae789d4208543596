use crate::eval::context::Signal;
use crate::foundation::error::InkframeError;
use std::fmt;

/// Parse or evaluation failure inside a condition, positioned by byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExprError {
    pub(crate) offset: usize,
    pub(crate) message: String,
    pub(crate) condition: Option<String>,
}

impl ExprError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
            condition: None,
        }
    }

    /// Attach the condition text the error came from.
    pub(crate) fn in_condition(mut self, src: &str) -> Self {
        self.condition = Some(src.to_owned());
        self
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(src) = &self.condition {
            write!(f, "condition '{src}' ")?;
        }
        write!(f, "at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ExprError {}

/// A condition that does not parse is an App configuration fault.
impl From<ExprError> for InkframeError {
    fn from(err: ExprError) -> Self {
        InkframeError::config(format!("invalid {err}"))
    }
}

/// A condition that fails against the current state is a run fault of the node evaluating it.
impl From<ExprError> for Signal {
    fn from(err: ExprError) -> Self {
        Signal::run(err.to_string())
    }
}
