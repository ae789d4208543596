//! App capability contract, registry and built-in capabilities.
//!
//! An App is one processing step. It is constructed once per scene node with its resolved config
//! and lives until the scene is replaced, so it may keep private state between dispatches.

use crate::eval::context::{ExecutionContext, Step};
use crate::eval::engine::Engine;
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::scene::device::DeviceConfig;
use crate::scene::model::Node;
use std::collections::BTreeMap;
use std::fmt;

pub mod config;

mod branch;
mod clock;
mod color;
mod control;
mod glyphs;
mod split;

pub use config::{FieldKind, FieldSpec, ResolvedConfig, resolve_config};
pub use split::{GridSpec, grid_cells};

/// A processing step bound to one scene node.
pub trait App: Send {
    /// Run the step. May mutate `ctx.image` and `ctx.state` in place.
    ///
    /// Return [`crate::Signal::Break`] to abort the whole dispatch, or a fault to have this node
    /// recorded as errored while the chain continues.
    fn run(&mut self, engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step;

    /// Whether the default-chain walk stops after this node. Apps that hand control to another
    /// branch explicitly (conditional branches) return `true`.
    fn ends_chain(&self) -> bool {
        false
    }
}

/// Fire-and-forget log sinks for one App instance.
#[derive(Debug, Clone)]
pub struct AppLogger {
    node: String,
    keyword: String,
}

impl AppLogger {
    pub(crate) fn new(node: &str, keyword: &str) -> Self {
        Self {
            node: node.to_owned(),
            keyword: keyword.to_owned(),
        }
    }

    /// Informational message.
    pub fn log(&self, message: impl fmt::Display) {
        tracing::info!(node = %self.node, keyword = %self.keyword, "{message}");
    }

    /// Error message. Does not affect the dispatch.
    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(node = %self.node, keyword = %self.keyword, "{message}");
    }
}

/// Everything a constructor receives for one node.
pub struct AppInit<'a> {
    /// Capability keyword.
    pub keyword: &'a str,
    /// The node being constructed.
    pub node: &'a Node,
    /// Field defaults merged with the node's overrides.
    pub config: ResolvedConfig,
    /// Device the scene runs on.
    pub device: &'a DeviceConfig,
    /// Log sinks tagged with the node id.
    pub logger: AppLogger,
}

type Constructor = Box<dyn Fn(AppInit<'_>) -> InkframeResult<Box<dyn App>> + Send + Sync>;

struct Registration {
    fields: Vec<FieldSpec>,
    construct: Constructor,
}

/// Capability registry keyed by keyword.
#[derive(Default)]
pub struct AppRegistry {
    apps: BTreeMap<String, Registration>,
}

impl fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRegistry")
            .field("keywords", &self.apps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AppRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in capabilities (`color`, `clock`, `if`, `split`, `rerender`,
    /// `halt`, `set_state`).
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        color::register(&mut r);
        clock::register(&mut r);
        branch::register(&mut r);
        split::register(&mut r);
        control::register(&mut r);
        r
    }

    /// Register (or replace) a capability.
    pub fn register<F>(&mut self, keyword: impl Into<String>, fields: Vec<FieldSpec>, construct: F)
    where
        F: Fn(AppInit<'_>) -> InkframeResult<Box<dyn App>> + Send + Sync + 'static,
    {
        self.apps.insert(
            keyword.into(),
            Registration {
                fields,
                construct: Box::new(construct),
            },
        );
    }

    /// Whether a keyword is registered.
    pub fn contains(&self, keyword: &str) -> bool {
        self.apps.contains_key(keyword)
    }

    /// Field schema of a keyword.
    pub fn fields(&self, keyword: &str) -> Option<&[FieldSpec]> {
        self.apps.get(keyword).map(|r| r.fields.as_slice())
    }

    /// Registered keywords, sorted.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    /// Resolve a node's config and construct its App.
    ///
    /// An unregistered keyword is a structural fault; a resolution or constructor failure is a
    /// configuration fault.
    pub fn construct(&self, node: &Node, device: &DeviceConfig) -> InkframeResult<Box<dyn App>> {
        let keyword = node.keyword();
        let reg = self.apps.get(keyword).ok_or_else(|| {
            InkframeError::structural(format!(
                "node '{}' uses unregistered app '{keyword}'",
                node.id
            ))
        })?;
        let in_node = |e: InkframeError| {
            let msg = match e {
                InkframeError::Config(msg) => msg,
                other => other.to_string(),
            };
            InkframeError::config(format!("node '{}' ({keyword}): {msg}", node.id))
        };
        let config = resolve_config(&reg.fields, &node.data.config).map_err(in_node)?;
        let init = AppInit {
            keyword,
            node,
            config,
            device,
            logger: AppLogger::new(&node.id, keyword),
        };
        (reg.construct)(init).map_err(in_node)
    }
}
