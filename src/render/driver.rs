use crate::foundation::error::{InkframeError, InkframeResult};
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Display driver contract.
///
/// `render` receives frames already sized and rotated for the physical output. Power gating is
/// optional; the coordinator calls `turn_on` once before the first write.
pub trait Driver: Send {
    /// Push one frame to the display.
    fn render(&mut self, image: &RgbaImage) -> InkframeResult<()>;

    /// Power the display up.
    fn turn_on(&mut self) -> InkframeResult<()> {
        Ok(())
    }

    /// Power the display down.
    fn turn_off(&mut self) -> InkframeResult<()> {
        Ok(())
    }
}

/// In-memory driver for tests and debugging.
///
/// Clones share the same frame log, so a test can keep one handle while the coordinator owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDriver {
    frames: Arc<Mutex<Vec<RgbaImage>>>,
    power_ons: Arc<AtomicUsize>,
    power_offs: Arc<AtomicUsize>,
    delay: Duration,
}

impl InMemoryDriver {
    /// Create an empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every `render`, simulating a slow panel.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Copies of every frame written, oldest first.
    pub fn frames(&self) -> Vec<RgbaImage> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of frames written.
    pub fn write_count(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of `turn_on` calls.
    pub fn power_on_count(&self) -> usize {
        self.power_ons.load(Ordering::SeqCst)
    }

    /// Number of `turn_off` calls.
    pub fn power_off_count(&self) -> usize {
        self.power_offs.load(Ordering::SeqCst)
    }
}

impl Driver for InMemoryDriver {
    fn render(&mut self, image: &RgbaImage) -> InkframeResult<()> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image.clone());
        Ok(())
    }

    fn turn_on(&mut self) -> InkframeResult<()> {
        self.power_ons.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn turn_off(&mut self) -> InkframeResult<()> {
        self.power_offs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Writes every frame to a PNG file, replacing the previous one.
#[derive(Debug, Clone)]
pub struct PngDriver {
    path: PathBuf,
}

impl PngDriver {
    /// Driver writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Driver for PngDriver {
    fn render(&mut self, image: &RgbaImage) -> InkframeResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                InkframeError::driver(format!("create '{}': {e}", parent.display()))
            })?;
        }
        image
            .save_with_format(&self.path, ImageFormat::Png)
            .map_err(|e| InkframeError::driver(format!("write '{}': {e}", self.path.display())))
    }
}
