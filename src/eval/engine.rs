use crate::apps::{App, AppRegistry};
use crate::compile::graph::{SceneGraph, compile_scene};
use crate::eval::context::{ExecutionContext, Signal, State, Step};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::scene::device::DeviceConfig;
use crate::scene::model::{FIELD_HANDLE_PREFIX, JsonMap, NodeId, NodeKind, Scene};
use image::RgbaImage;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::sync::Weak;

/// Event keyword of render triggers.
pub const RENDER_EVENT: &str = "render";
/// Event dispatched once when a scene becomes active.
pub const INIT_EVENT: &str = "init";

/// Coordinator-side hooks the engine (and Apps through it) may call.
pub trait RenderControl: Send + Sync {
    /// Whether a render is currently in flight. Never blocks.
    fn is_rendering(&self) -> bool;
    /// Ask for a fresh top-level render. Dropped when one is already in flight.
    fn request_rerender(&self, trigger: &str);
}

struct AppSlot {
    keyword: String,
    ends_chain: bool,
    app: RefCell<Box<dyn App>>,
}

/// Scene execution engine.
///
/// Owns the compiled graph, one App instance per registered App node, and the scene state. The
/// graph walk is synchronous; `dispatch` takes `&mut self`, so callers sharing an engine must
/// serialize access (the render coordinator does this with its engine lock).
pub struct Engine {
    graph: SceneGraph,
    apps: HashMap<NodeId, AppSlot>,
    state: State,
    device: DeviceConfig,
    control: Option<Weak<dyn RenderControl>>,
    depth: Cell<usize>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("scene", &self.graph.scene_id())
            .field("apps", &self.apps.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Engine {
    /// Compile `scene` and construct its Apps.
    ///
    /// Fails only on structural faults in the graph. Nodes whose App cannot be configured are
    /// logged and omitted; reaching one during a dispatch is then a structural fault.
    pub fn build(
        scene: &Scene,
        registry: &AppRegistry,
        device: &DeviceConfig,
    ) -> InkframeResult<Self> {
        let graph = compile_scene(scene)?;
        Ok(Self::from_graph(graph, registry, device))
    }

    /// Construct Apps for an already compiled graph.
    pub fn from_graph(graph: SceneGraph, registry: &AppRegistry, device: &DeviceConfig) -> Self {
        let mut apps = HashMap::new();
        for node in graph.nodes().filter(|n| n.kind == NodeKind::App) {
            match registry.construct(node, device) {
                Ok(app) => {
                    apps.insert(
                        node.id.clone(),
                        AppSlot {
                            keyword: node.keyword().to_owned(),
                            ends_chain: app.ends_chain(),
                            app: RefCell::new(app),
                        },
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        node = %node.id,
                        keyword = %node.keyword(),
                        error = %err,
                        "app omitted from scene"
                    );
                }
            }
        }

        Self {
            graph,
            apps,
            state: State::new(),
            device: device.clone(),
            control: None,
            depth: Cell::new(0),
        }
    }

    /// Attach the coordinator hooks.
    pub fn with_control(mut self, control: Weak<dyn RenderControl>) -> Self {
        self.control = Some(control);
        self
    }

    /// The compiled scene graph.
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Device the scene runs on.
    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    /// Persistent scene state as of the end of the last dispatch.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Whether `node` has a constructed App.
    pub fn has_app(&self, node: &str) -> bool {
        self.apps.contains_key(node)
    }

    /// Run one top-level dispatch.
    ///
    /// Entry chains for `event` run sequentially in declaration order, all writing into the same
    /// context. Run faults are isolated per node. A short-circuit ends the dispatch early and still
    /// returns the partial context. A structural fault abandons the dispatch and is returned as an
    /// error. Either way the context's state becomes the new scene state.
    #[tracing::instrument(skip(self, payload, image), fields(scene = %self.graph.scene_id()))]
    pub fn dispatch(
        &mut self,
        event: &str,
        payload: JsonMap,
        image: Option<RgbaImage>,
    ) -> InkframeResult<ExecutionContext<'static>> {
        let state = std::mem::take(&mut self.state);
        let mut ctx = ExecutionContext::new(event, payload, image, state);
        self.depth.set(0);

        let outcome = self.run_entries(&mut ctx);
        self.state = ctx.state.clone();

        match outcome {
            Ok(()) => Ok(ctx),
            Err(Signal::Break(reason)) => {
                tracing::info!(
                    event,
                    %reason,
                    apps_ran = ?ctx.apps_ran,
                    apps_errored = ?ctx.apps_errored,
                    "dispatch short-circuited"
                );
                Ok(ctx)
            }
            Err(Signal::Fault(err)) => {
                tracing::error!(
                    event,
                    error = %err,
                    apps_ran = ?ctx.apps_ran,
                    apps_errored = ?ctx.apps_errored,
                    "dispatch abandoned"
                );
                Err(err)
            }
        }
    }

    fn run_entries(&self, ctx: &mut ExecutionContext<'_>) -> Step {
        let entries = self.graph.entry_nodes(&ctx.event);
        for entry in entries {
            if let Some(first) = self.graph.default_successor(entry) {
                self.run_chain(first, ctx)?;
            }
        }
        Ok(())
    }

    /// Run `start` and then follow default successors until the chain ends.
    ///
    /// App nodes go through [`Engine::run_node`]. A `render` event node in a chain requests a
    /// rerender instead of running. Any other event node, an unknown node kind, or revisiting a
    /// node within the same chain is a structural fault.
    pub fn run_chain(&self, start: &str, ctx: &mut ExecutionContext<'_>) -> Step {
        self.walk_chain(start, ctx, false)
    }

    /// Like [`Engine::run_chain`] but stops right after the first node that records a run fault.
    ///
    /// The fault stays in `apps_errored` and nothing downstream of it runs. Used by sub-pipelines
    /// that are abandoned as a whole once any of their nodes fails.
    pub fn run_chain_until_fault(&self, start: &str, ctx: &mut ExecutionContext<'_>) -> Step {
        self.walk_chain(start, ctx, true)
    }

    fn walk_chain(&self, start: &str, ctx: &mut ExecutionContext<'_>, stop_on_fault: bool) -> Step {
        let mut seen = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(InkframeError::structural(format!(
                    "default chain loops back to node '{id}'"
                ))
                .into());
            }
            let node = self.graph.node(id).ok_or_else(|| {
                InkframeError::structural(format!("chain reaches unknown node '{id}'"))
            })?;

            match &node.kind {
                NodeKind::App => {
                    let errored = ctx.apps_errored.len();
                    self.run_node(id, ctx)?;
                    if stop_on_fault && ctx.apps_errored.len() > errored {
                        break;
                    }
                    if self.apps.get(id).is_some_and(|slot| slot.ends_chain) {
                        break;
                    }
                }
                NodeKind::Event if node.keyword() == RENDER_EVENT => {
                    self.request_rerender(&format!("event:{id}"));
                }
                NodeKind::Event => {
                    return Err(InkframeError::structural(format!(
                        "event node '{id}' ({}) cannot run inside a chain",
                        node.keyword()
                    ))
                    .into());
                }
                NodeKind::Unknown(kind) => {
                    return Err(InkframeError::structural(format!(
                        "node '{id}' has unknown kind '{kind}'"
                    ))
                    .into());
                }
            }
            current = self.graph.default_successor(id);
        }
        Ok(())
    }

    /// Invoke a single node's App.
    ///
    /// On success the node is appended to `apps_ran`. A run fault is logged, appended to
    /// `apps_errored` and swallowed so the caller's chain continues. Short-circuits and structural
    /// faults propagate unchanged.
    pub fn run_node(&self, id: &str, ctx: &mut ExecutionContext<'_>) -> Step {
        let slot = self.apps.get(id).ok_or_else(|| {
            let what = match self.graph.node(id) {
                Some(node) => format!("app '{}'", node.keyword()),
                None => "unknown node".to_owned(),
            };
            InkframeError::structural(format!("node '{id}' has no registered app ({what})"))
        })?;

        let depth = self.depth.get() + 1;
        if depth > self.device.max_depth {
            return Err(InkframeError::structural(format!(
                "invocation depth limit {} exceeded at node '{id}'",
                self.device.max_depth
            ))
            .into());
        }
        let Ok(mut app) = slot.app.try_borrow_mut() else {
            return Err(InkframeError::structural(format!(
                "node '{id}' invoked while it is already running"
            ))
            .into());
        };

        self.depth.set(depth);
        let result = app.run(self, ctx);
        self.depth.set(depth - 1);
        drop(app);

        match result {
            Ok(()) => {
                ctx.apps_ran.push(id.to_owned());
                Ok(())
            }
            Err(Signal::Fault(err)) if !err.is_structural() => {
                tracing::error!(
                    node = %id,
                    keyword = %slot.keyword,
                    event = %ctx.event,
                    error = %error_chain(&err),
                    "app run failed"
                );
                ctx.apps_errored.push(id.to_owned());
                Ok(())
            }
            Err(signal) => Err(signal),
        }
    }

    /// Target of the named edge `field/<name>` (or bare `<name>`) leaving `node`.
    pub fn field_target(&self, node: &str, name: &str) -> Option<&str> {
        let prefixed = format!("{FIELD_HANDLE_PREFIX}{name}");
        self.graph
            .named_edge(node, &prefixed)
            .or_else(|| self.graph.named_edge(node, name))
            .map(|e| e.target.as_str())
    }

    /// Whether the coordinator currently has a render in flight.
    pub fn is_rendering(&self) -> bool {
        self.control
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|c| c.is_rendering())
    }

    /// Ask the coordinator for a fresh top-level render.
    pub fn request_rerender(&self, trigger: &str) {
        match self.control.as_ref().and_then(Weak::upgrade) {
            Some(control) => control.request_rerender(trigger),
            None => tracing::debug!(trigger, "rerender requested without a coordinator"),
        }
    }
}

fn error_chain(err: &InkframeError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/eval/engine.rs"]
mod tests;
