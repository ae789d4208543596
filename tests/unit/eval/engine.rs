use super::*;
use crate::apps::{AppInit, FieldKind, FieldSpec};
use crate::scene::model::{Edge, Node, NodeData};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

fn node(id: &str, kind: &str, keyword: &str) -> Node {
    Node {
        id: id.to_owned(),
        kind: match kind {
            "event" => NodeKind::Event,
            "app" => NodeKind::App,
            other => NodeKind::Unknown(other.to_owned()),
        },
        data: NodeData {
            keyword: keyword.to_owned(),
            config: JsonMap::new(),
        },
    }
}

fn edge(source: &str, target: &str, handle: Option<&str>) -> Edge {
    Edge {
        id: format!("{source}->{target}"),
        source: source.to_owned(),
        target: target.to_owned(),
        source_handle: handle.map(str::to_owned),
        target_handle: None,
    }
}

fn device(nodes: Vec<Node>, edges: Vec<Edge>) -> DeviceConfig {
    DeviceConfig {
        name: "test".to_owned(),
        width: 4,
        height: 4,
        rotate: Default::default(),
        scaling_mode: Default::default(),
        background_color: Default::default(),
        interval: 60.0,
        max_depth: 8,
        scene: Scene {
            id: "scene".to_owned(),
            nodes,
            edges,
        },
    }
}

fn boxed(app: impl App + 'static) -> InkframeResult<Box<dyn App>> {
    Ok(Box::new(app))
}

/// Appends its node id to `state.trace`.
struct Mark(String);

impl App for Mark {
    fn run(&mut self, _engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        let trace = ctx
            .state
            .entry("trace")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = trace {
            items.push(Value::String(self.0.clone()));
        }
        Ok(())
    }
}

struct Fail;

impl App for Fail {
    fn run(&mut self, _engine: &Engine, _ctx: &mut ExecutionContext<'_>) -> Step {
        Err(Signal::run("boom"))
    }
}

struct Halt;

impl App for Halt {
    fn run(&mut self, _engine: &Engine, _ctx: &mut ExecutionContext<'_>) -> Step {
        Err(Signal::halt("precondition failed"))
    }
}

/// Runs the chain connected to its `field/inner` handle.
struct Call(String);

impl App for Call {
    fn run(&mut self, engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        let target = engine
            .field_target(&self.0, "inner")
            .ok_or_else(|| Signal::run("no inner edge"))?;
        engine.run_chain(target, ctx)
    }
}

fn registry() -> AppRegistry {
    let mut r = AppRegistry::new();
    r.register("mark", vec![], |init: AppInit<'_>| boxed(Mark(init.node.id.clone())));
    r.register("fail", vec![], |_| boxed(Fail));
    r.register("halt", vec![], |_| boxed(Halt));
    r.register("call", vec![], |init: AppInit<'_>| boxed(Call(init.node.id.clone())));
    r.register(
        "needs_url",
        vec![FieldSpec::new("url", FieldKind::String).required()],
        |_| boxed(Fail),
    );
    r
}

fn engine(nodes: Vec<Node>, edges: Vec<Edge>) -> Engine {
    let dev = device(nodes, edges);
    Engine::build(&dev.scene, &registry(), &dev).unwrap()
}

fn chain_abc(b_keyword: &str) -> Engine {
    engine(
        vec![
            node("render", "event", "render"),
            node("a", "app", "mark"),
            node("b", "app", b_keyword),
            node("c", "app", "mark"),
        ],
        vec![
            edge("render", "a", None),
            edge("a", "b", Some("next")),
            edge("b", "c", None),
        ],
    )
}

fn trace(ctx: &ExecutionContext<'_>) -> Vec<String> {
    ctx.state
        .get("trace")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
        .unwrap_or_default()
}

#[test]
fn unknown_event_is_a_noop() {
    let mut e = chain_abc("mark");
    let img = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
    let ctx = e
        .dispatch("button_press", JsonMap::new(), Some(img.clone()))
        .unwrap();
    assert!(ctx.apps_ran.is_empty());
    assert!(ctx.apps_errored.is_empty());
    assert_eq!(ctx.image.unwrap(), img);
}

#[test]
fn run_fault_is_isolated_to_its_node() {
    let mut e = chain_abc("fail");
    let ctx = e.dispatch("render", JsonMap::new(), None).unwrap();
    assert_eq!(ctx.apps_ran, ["a", "c"]);
    assert_eq!(ctx.apps_errored, ["b"]);
}

#[test]
fn chain_until_fault_stops_after_the_failing_node() {
    let e = chain_abc("fail");
    let mut ctx = ExecutionContext::new("render", JsonMap::new(), None, State::new());
    e.run_chain_until_fault("a", &mut ctx).unwrap();
    assert_eq!(ctx.apps_ran, ["a"]);
    assert_eq!(ctx.apps_errored, ["b"]);
    assert_eq!(trace(&ctx), ["a"]);
}

#[test]
fn short_circuit_aborts_the_dispatch_without_error() {
    let mut e = chain_abc("halt");
    let ctx = e.dispatch("render", JsonMap::new(), None).unwrap();
    assert_eq!(ctx.apps_ran, ["a"]);
    assert!(ctx.apps_errored.is_empty());
    assert_eq!(trace(&ctx), ["a"]);
}

#[test]
fn short_circuit_propagates_through_explicit_invocation() {
    let mut e = engine(
        vec![
            node("render", "event", "render"),
            node("outer", "app", "call"),
            node("stop", "app", "halt"),
            node("after", "app", "mark"),
        ],
        vec![
            edge("render", "outer", None),
            edge("outer", "stop", Some("field/inner")),
            edge("outer", "after", None),
        ],
    );
    let ctx = e.dispatch("render", JsonMap::new(), None).unwrap();
    assert!(ctx.apps_ran.is_empty());
    assert!(trace(&ctx).is_empty());
}

#[test]
fn entry_chains_run_sequentially_into_one_context() {
    let mut e = engine(
        vec![
            node("r1", "event", "render"),
            node("a", "app", "mark"),
            node("r2", "event", "render"),
            node("b", "app", "mark"),
        ],
        vec![edge("r2", "b", None), edge("r1", "a", None)],
    );
    let ctx = e.dispatch("render", JsonMap::new(), None).unwrap();
    assert_eq!(ctx.apps_ran, ["a", "b"]);
}

#[test]
fn state_persists_across_dispatches() {
    let mut e = chain_abc("mark");
    e.dispatch("render", JsonMap::new(), None).unwrap();
    let ctx = e.dispatch("render", JsonMap::new(), None).unwrap();
    assert_eq!(trace(&ctx), ["a", "b", "c", "a", "b", "c"]);
    assert_eq!(e.state().get("trace").and_then(Value::as_array).map(Vec::len), Some(6));
}

#[test]
fn state_survives_a_short_circuit() {
    let mut e = chain_abc("halt");
    e.dispatch("render", JsonMap::new(), None).unwrap();
    assert_eq!(e.state().get("trace"), Some(&json!(["a"])));
}

#[test]
fn unregistered_app_is_structural_and_fatal() {
    let mut e = chain_abc("nope");
    assert!(!e.has_app("b"));
    let err = e.dispatch("render", JsonMap::new(), None).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("'b'"));
}

#[test]
fn configuration_fault_omits_only_that_node() {
    let mut e = engine(
        vec![
            node("render", "event", "render"),
            node("a", "app", "mark"),
            node("tick", "event", "tick"),
            node("bad", "app", "needs_url"),
        ],
        vec![edge("render", "a", None), edge("tick", "bad", None)],
    );
    assert!(!e.has_app("bad"));
    let ctx = e.dispatch("render", JsonMap::new(), None).unwrap();
    assert_eq!(ctx.apps_ran, ["a"]);
    assert!(e.dispatch("tick", JsonMap::new(), None).unwrap_err().is_structural());
}

#[test]
fn unknown_kind_and_foreign_events_are_structural() {
    let mut e = engine(
        vec![
            node("render", "event", "render"),
            node("code", "code", "whatever"),
        ],
        vec![edge("render", "code", None)],
    );
    assert!(e.dispatch("render", JsonMap::new(), None).unwrap_err().is_structural());

    let mut e = engine(
        vec![
            node("render", "event", "render"),
            node("press", "event", "button_press"),
        ],
        vec![edge("render", "press", None)],
    );
    assert!(e.dispatch("render", JsonMap::new(), None).unwrap_err().is_structural());
}

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<String>>,
}

impl RenderControl for Recorder {
    fn is_rendering(&self) -> bool {
        true
    }

    fn request_rerender(&self, trigger: &str) {
        self.requests.lock().unwrap().push(trigger.to_owned());
    }
}

#[test]
fn render_event_in_chain_requests_a_rerender_and_continues() {
    let rec = Arc::new(Recorder::default());
    let control: Weak<dyn RenderControl> = Arc::downgrade(&rec) as Weak<dyn RenderControl>;
    let mut e = engine(
        vec![
            node("press", "event", "button_press"),
            node("a", "app", "mark"),
            node("refresh", "event", "render"),
            node("b", "app", "mark"),
        ],
        vec![
            edge("press", "a", None),
            edge("a", "refresh", None),
            edge("refresh", "b", None),
        ],
    )
    .with_control(control);

    assert!(e.is_rendering());
    let ctx = e.dispatch("button_press", JsonMap::new(), None).unwrap();
    assert_eq!(ctx.apps_ran, ["a", "b"]);
    assert_eq!(*rec.requests.lock().unwrap(), ["event:refresh"]);
}

#[test]
fn detached_engine_reports_not_rendering() {
    let e = chain_abc("mark");
    assert!(!e.is_rendering());
    e.request_rerender("manual");
}

#[test]
fn default_chain_cycle_is_structural() {
    let mut e = engine(
        vec![
            node("render", "event", "render"),
            node("a", "app", "mark"),
            node("b", "app", "mark"),
        ],
        vec![
            edge("render", "a", None),
            edge("a", "b", None),
            edge("b", "a", None),
        ],
    );
    let err = e.dispatch("render", JsonMap::new(), None).unwrap_err();
    assert!(err.to_string().contains("loops back"));
}

#[test]
fn reentrant_invocation_is_structural() {
    let mut e = engine(
        vec![
            node("render", "event", "render"),
            node("x", "app", "call"),
            node("y", "app", "call"),
        ],
        vec![
            edge("render", "x", None),
            edge("x", "y", Some("field/inner")),
            edge("y", "x", Some("field/inner")),
        ],
    );
    let err = e.dispatch("render", JsonMap::new(), None).unwrap_err();
    assert!(err.to_string().contains("already running"));
}

#[test]
fn depth_limit_is_structural() {
    let mut nodes = vec![node("render", "event", "render")];
    let mut edges = vec![edge("render", "n0", None)];
    for i in 0..12 {
        nodes.push(node(&format!("n{i}"), "app", "call"));
        edges.push(edge(&format!("n{i}"), &format!("n{}", i + 1), Some("field/inner")));
    }
    nodes.push(node("n12", "app", "mark"));
    let mut e = engine(nodes, edges);
    let err = e.dispatch("render", JsonMap::new(), None).unwrap_err();
    assert!(err.to_string().contains("depth limit 8"));
}

#[test]
fn field_target_prefers_prefixed_handles() {
    let e = engine(
        vec![
            node("x", "app", "call"),
            node("a", "app", "mark"),
            node("b", "app", "mark"),
        ],
        vec![
            edge("x", "a", Some("inner")),
            edge("x", "b", Some("field/inner")),
        ],
    );
    assert_eq!(e.field_target("x", "inner"), Some("b"));
    assert_eq!(e.field_target("x", "missing"), None);
}
