use crate::foundation::error::InkframeError;
use crate::scene::model::{JsonMap, NodeId};
use image::RgbaImage;

/// Scene-scoped key/value state shared by every dispatch while the scene is active.
pub type State = JsonMap;

/// Why an App run stopped early.
#[derive(Debug)]
pub enum Signal {
    /// Intentional short-circuit: abort the whole top-level dispatch. Caught only at the dispatch
    /// boundary and logged as an informational break.
    Break(String),
    /// A fault. Run faults are isolated per node; structural faults propagate.
    Fault(InkframeError),
}

/// Result of one App run. `Ok(())` means continue with the chain.
pub type Step = Result<(), Signal>;

impl Signal {
    /// Short-circuit with a reason.
    pub fn halt(reason: impl Into<String>) -> Self {
        Self::Break(reason.into())
    }

    /// Run fault with a message.
    pub fn run(msg: impl Into<String>) -> Self {
        Self::Fault(InkframeError::run(msg))
    }
}

impl From<InkframeError> for Signal {
    fn from(err: InkframeError) -> Self {
        Self::Fault(err)
    }
}

/// The mutable bundle threaded through one dispatch.
///
/// A top-level context owns the scene state for the duration of the dispatch. Child contexts
/// created for sub-pipelines carry deep copies of payload and state and only hand their `image`
/// back to the caller.
#[derive(Debug)]
pub struct ExecutionContext<'p> {
    /// Event name this dispatch was started for.
    pub event: String,
    /// Event payload.
    pub payload: JsonMap,
    /// Image being produced, if any.
    pub image: Option<RgbaImage>,
    /// Scene state (top level) or a private copy of it (child).
    pub state: State,
    /// Nodes that ran successfully, in completion order.
    pub apps_ran: Vec<NodeId>,
    /// Nodes whose run faulted, in order.
    pub apps_errored: Vec<NodeId>,
    /// Enclosing context for sub-pipelines.
    pub parent: Option<&'p ExecutionContext<'p>>,
}

impl ExecutionContext<'static> {
    /// Fresh top-level context.
    pub fn new(
        event: impl Into<String>,
        payload: JsonMap,
        image: Option<RgbaImage>,
        state: State,
    ) -> Self {
        Self {
            event: event.into(),
            payload,
            image,
            state,
            apps_ran: Vec::new(),
            apps_errored: Vec::new(),
            parent: None,
        }
    }
}

impl<'p> ExecutionContext<'p> {
    /// Child context for a sub-pipeline: same event, deep-copied payload and state with `extra`
    /// merged into both, its own image and an empty ledger.
    pub fn child<'c>(&'c self, extra: &JsonMap, image: Option<RgbaImage>) -> ExecutionContext<'c> {
        let mut payload = self.payload.clone();
        let mut state = self.state.clone();
        for (k, v) in extra {
            payload.insert(k.clone(), v.clone());
            state.insert(k.clone(), v.clone());
        }
        ExecutionContext {
            event: self.event.clone(),
            payload,
            image,
            state,
            apps_ran: Vec::new(),
            apps_errored: Vec::new(),
            parent: Some(self),
        }
    }

    /// Nesting depth: 0 for a top-level context.
    pub fn depth(&self) -> usize {
        let mut n = 0;
        let mut cur = self.parent;
        while let Some(p) = cur {
            n += 1;
            cur = p.parent;
        }
        n
    }

    /// Mutable access to the image, or a run fault when there is none.
    pub fn image_mut(&mut self) -> Result<&mut RgbaImage, InkframeError> {
        self.image
            .as_mut()
            .ok_or_else(|| InkframeError::run(format!("event '{}' carries no image", self.event)))
    }
}
