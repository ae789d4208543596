use crate::apps::AppRegistry;
use crate::eval::context::ExecutionContext;
use crate::eval::engine::{Engine, INIT_EVENT, RENDER_EVENT, RenderControl};
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::render::diff::diff_bbox;
use crate::render::driver::Driver;
use crate::render::normalize::{rotate, scale_image};
use crate::scene::device::DeviceConfig;
use crate::scene::model::{JsonMap, NodeId, Scene};
use image::RgbaImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

/// What one render attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Another render was in flight; this trigger was dropped.
    Coalesced,
    /// The scene produced no image.
    NoImage,
    /// The frame matched what the display already shows; nothing was written.
    Unchanged,
    /// The frame was sent to the driver. `bbox` covers the pixels that changed.
    Written {
        /// Changed region of the output frame.
        bbox: Rect,
    },
}

impl RenderOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Coalesced => "coalesced",
            Self::NoImage => "no image produced",
            Self::Unchanged => "no change",
            Self::Written { .. } => "written",
        }
    }
}

/// Snapshot of the coordinator's frame slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStatus {
    /// A render is running.
    pub in_progress: bool,
    /// A frame has been written to the display.
    pub has_current: bool,
    /// A frame is on its way to the display.
    pub has_next: bool,
}

#[derive(Default)]
struct FrameSlots {
    current: Option<RgbaImage>,
    next: Option<RgbaImage>,
}

struct DriverSlot {
    driver: Box<dyn Driver>,
    powered: bool,
}

struct Shared {
    this: Weak<Shared>,
    registry: AppRegistry,
    in_progress: AtomicBool,
    idle: Mutex<()>,
    idle_cv: Condvar,
    engine: Mutex<Engine>,
    frames: Mutex<FrameSlots>,
    driver: Mutex<DriverSlot>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the render flag; clears it and wakes `wait_idle` callers when dropped.
struct RenderGuard(Arc<Shared>);

impl Drop for RenderGuard {
    fn drop(&mut self) {
        self.0.in_progress.store(false, Ordering::Release);
        let _idle = lock(&self.0.idle);
        self.0.idle_cv.notify_all();
    }
}

/// Serializes every entry into a device's scene engine and turns render dispatches into display
/// writes.
///
/// Cloning is cheap; all clones drive the same device.
#[derive(Clone)]
pub struct RenderCoordinator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for RenderCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCoordinator")
            .field("status", &self.status())
            .finish()
    }
}

impl RenderCoordinator {
    /// Build the engine for `device.scene`, attach the coordinator and dispatch `init` once.
    ///
    /// Fails on an invalid device configuration or a structurally broken scene graph.
    pub fn new(
        device: DeviceConfig,
        registry: AppRegistry,
        driver: impl Driver + 'static,
    ) -> InkframeResult<Self> {
        device.validate()?;
        let engine = Engine::build(&device.scene, &registry, &device)?;
        let shared = Arc::new_cyclic(|this: &Weak<Shared>| {
            let control: Weak<dyn RenderControl> = this.clone();
            Shared {
                this: this.clone(),
                registry,
                in_progress: AtomicBool::new(false),
                idle: Mutex::new(()),
                idle_cv: Condvar::new(),
                engine: Mutex::new(engine.with_control(control)),
                frames: Mutex::new(FrameSlots::default()),
                driver: Mutex::new(DriverSlot {
                    driver: Box::new(driver),
                    powered: false,
                }),
            }
        });
        shared.init();
        Ok(Self { shared })
    }

    /// Start a background render unless one is already running.
    ///
    /// Never blocks. Returns whether a render was started; a dropped trigger is logged and not
    /// retried.
    pub fn refresh_image(&self, trigger: &str) -> bool {
        self.shared.refresh(trigger)
    }

    /// Render on the calling thread. Returns [`RenderOutcome::Coalesced`] without waiting when a
    /// render is already running.
    pub fn render_now(&self, trigger: &str) -> InkframeResult<RenderOutcome> {
        let Some(_guard) = self.shared.try_begin() else {
            tracing::info!(trigger, "render already in progress; trigger ignored");
            return Ok(RenderOutcome::Coalesced);
        };
        self.shared.render_logged(trigger)
    }

    /// Dispatch an arbitrary event through the engine, waiting for any running dispatch first.
    ///
    /// The event carries no image. Use [`RenderCoordinator::refresh_image`] for renders.
    pub fn dispatch_event(
        &self,
        event: &str,
        payload: JsonMap,
    ) -> InkframeResult<ExecutionContext<'static>> {
        lock(&self.shared.engine).dispatch(event, payload, None)
    }

    /// Block until no render is running.
    pub fn wait_idle(&self) {
        let mut idle = lock(&self.shared.idle);
        while self.shared.in_progress.load(Ordering::Acquire) {
            idle = self
                .shared
                .idle_cv
                .wait(idle)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// The last frame written to the display.
    pub fn current_image(&self) -> Option<RgbaImage> {
        lock(&self.shared.frames).current.clone()
    }

    /// Current flag and slot occupancy.
    pub fn status(&self) -> RenderStatus {
        let frames = lock(&self.shared.frames);
        RenderStatus {
            in_progress: self.shared.in_progress.load(Ordering::Acquire),
            has_current: frames.current.is_some(),
            has_next: frames.next.is_some(),
        }
    }

    /// Snapshot of the scene state.
    pub fn state(&self) -> JsonMap {
        lock(&self.shared.engine).state().clone()
    }

    /// Device the coordinator drives.
    pub fn device(&self) -> DeviceConfig {
        lock(&self.shared.engine).device().clone()
    }

    /// Replace the active scene.
    ///
    /// Waits for the running dispatch, rebuilds every App with empty scene state and dispatches
    /// `init`. The displayed frame is kept. On error the previous scene stays active.
    pub fn reconfigure(&self, scene: Scene) -> InkframeResult<()> {
        {
            let mut engine = lock(&self.shared.engine);
            let mut device = engine.device().clone();
            device.scene = scene;
            device.validate()?;
            let control: Weak<dyn RenderControl> = self.shared.this.clone();
            let rebuilt =
                Engine::build(&device.scene, &self.shared.registry, &device)?.with_control(control);
            tracing::info!(
                scene = %device.scene.id,
                nodes = rebuilt.graph().node_count(),
                edges = rebuilt.graph().edge_count(),
                "scene replaced"
            );
            *engine = rebuilt;
        }
        self.shared.init();
        Ok(())
    }

    /// Power the display down after any running render finishes.
    pub fn power_off(&self) -> InkframeResult<()> {
        self.wait_idle();
        let mut slot = lock(&self.shared.driver);
        if slot.powered {
            slot.driver.turn_off()?;
            slot.powered = false;
        }
        Ok(())
    }
}

impl RenderControl for Shared {
    fn is_rendering(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    fn request_rerender(&self, trigger: &str) {
        self.refresh(trigger);
    }
}

impl Shared {
    fn init(&self) {
        if let Err(err) = lock(&self.engine).dispatch(INIT_EVENT, JsonMap::new(), None) {
            tracing::warn!(error = %err, "init dispatch failed");
        }
    }

    fn try_begin(&self) -> Option<RenderGuard> {
        let this = self.this.upgrade()?;
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RenderGuard(this))
    }

    #[tracing::instrument(skip(self))]
    fn refresh(&self, trigger: &str) -> bool {
        let Some(guard) = self.try_begin() else {
            tracing::info!(trigger, "render already in progress; trigger ignored");
            return false;
        };
        let owned = trigger.to_owned();
        let spawned = std::thread::Builder::new()
            .name("inkframe-render".to_owned())
            .spawn(move || {
                let shared = Arc::clone(&guard.0);
                if let Err(err) = shared.render_logged(&owned) {
                    tracing::debug!(trigger = %owned, error = %err, "keeping the previous frame");
                }
                drop(guard);
            });
        match spawned {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(trigger, error = %err, "could not start render thread");
                false
            }
        }
    }

    fn render_logged(&self, trigger: &str) -> InkframeResult<RenderOutcome> {
        let started = Instant::now();
        let mut ledger = Ledger::default();
        let result = self.render(trigger, &mut ledger);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome) => tracing::info!(
                trigger,
                outcome = outcome.label(),
                apps_ran = ?ledger.ran,
                apps_errored = ?ledger.errored,
                elapsed_ms,
                "render finished"
            ),
            Err(err) => tracing::error!(
                trigger,
                error = %err,
                apps_ran = ?ledger.ran,
                apps_errored = ?ledger.errored,
                elapsed_ms,
                "render failed"
            ),
        }
        result
    }

    fn render(&self, trigger: &str, ledger: &mut Ledger) -> InkframeResult<RenderOutcome> {
        let (device, ctx) = {
            let mut engine = lock(&self.engine);
            let device = engine.device().clone();
            let canvas = device.render_canvas();
            let blank = RgbaImage::from_pixel(
                canvas.width,
                canvas.height,
                device.background_color.to_pixel(),
            );
            let ctx = engine.dispatch(RENDER_EVENT, JsonMap::new(), Some(blank))?;
            (device, ctx)
        };
        ledger.ran = ctx.apps_ran;
        ledger.errored = ctx.apps_errored;

        let Some(image) = ctx.image else {
            tracing::info!(trigger, reason = "no image produced", "render skipped");
            return Ok(RenderOutcome::NoImage);
        };

        let canvas = device.render_canvas();
        let image = if Canvas::of(&image) == canvas {
            image
        } else {
            tracing::debug!(
                trigger,
                from = ?Canvas::of(&image),
                to = ?canvas,
                mode = ?device.scaling_mode,
                "rescaling scene output"
            );
            scale_image(&image, canvas, device.scaling_mode, device.background_color)
        };
        let frame = rotate(image, device.rotate);

        let bbox = {
            let mut frames = lock(&self.frames);
            let bbox = match &frames.current {
                Some(current) => diff_bbox(current, &frame),
                None => Some(Rect::full(Canvas::of(&frame))),
            };
            if bbox.is_some() {
                frames.next = Some(frame.clone());
            }
            bbox
        };
        let Some(bbox) = bbox else {
            tracing::info!(trigger, "no change; display write skipped");
            return Ok(RenderOutcome::Unchanged);
        };

        std::thread::yield_now();
        let written = self.write(&frame);

        let mut frames = lock(&self.frames);
        frames.next = None;
        written?;
        frames.current = Some(frame);
        Ok(RenderOutcome::Written { bbox })
    }

    fn write(&self, frame: &RgbaImage) -> InkframeResult<()> {
        let mut slot = lock(&self.driver);
        if !slot.powered {
            slot.driver
                .turn_on()
                .map_err(|e| InkframeError::driver(format!("turn on: {e}")))?;
            slot.powered = true;
        }
        slot.driver.render(frame)
    }
}

#[derive(Default)]
struct Ledger {
    ran: Vec<NodeId>,
    errored: Vec<NodeId>,
}
