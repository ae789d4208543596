//! Inkframe runs node-graph scenes on unattended displays.
//!
//! A device configuration names the output geometry and one scene: event nodes wired to App nodes.
//! The public API is coordinator-oriented:
//!
//! - Load and validate a [`DeviceConfig`]
//! - Build an [`AppRegistry`] (the built-ins plus your own [`App`]s)
//! - Create a [`RenderCoordinator`] around a [`Driver`]
//! - Trigger renders with [`RenderCoordinator::refresh_image`] or a [`Scheduler`], and feed other
//!   events through [`RenderCoordinator::dispatch_event`]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Capability contract, registry and built-in Apps.
pub mod apps;
/// Scene graph compilation.
pub mod compile;
/// Dispatch engine.
pub mod eval;
pub(crate) mod expression;
/// Coordinator, drivers and frame normalization.
pub mod render;
/// Persisted device and scene model.
pub mod scene;

pub use crate::foundation::color::Color;
pub use crate::foundation::core::{Canvas, Rect};
pub use crate::foundation::error::{InkframeError, InkframeResult};

pub use crate::apps::{
    App, AppInit, AppLogger, AppRegistry, FieldKind, FieldSpec, GridSpec, ResolvedConfig,
    grid_cells, resolve_config,
};
pub use crate::compile::graph::{SceneGraph, compile_scene};
pub use crate::eval::context::{ExecutionContext, Signal, State, Step};
pub use crate::eval::engine::{Engine, INIT_EVENT, RENDER_EVENT, RenderControl};
pub use crate::render::coordinator::{RenderCoordinator, RenderOutcome, RenderStatus};
pub use crate::render::diff::diff_bbox;
pub use crate::render::driver::{Driver, InMemoryDriver, PngDriver};
pub use crate::render::normalize::{rotate, scale_image};
pub use crate::render::scheduler::{Scheduler, SchedulerHandle};
pub use crate::scene::device::{
    DEFAULT_MAX_DEPTH, DeviceConfig, Rotation, ScalingMode, interval_from_secs,
};
pub use crate::scene::model::{Edge, JsonMap, Node, NodeData, NodeId, NodeKind, Scene};
