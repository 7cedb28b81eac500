//! mdshot
//!
//! Renders Markdown text to a tightly cropped PNG by laying it out in an
//! off-screen browser surface, measuring the true content bounding box, and
//! cropping the captured raster to it.
//!
//! # How a render works
//!
//! 1. The Markdown is base64-encoded into a self-contained HTML document
//!    (template + bundled converter script) and loaded via a `data:` URL.
//! 2. The pipeline polls the document until it reports itself ready
//!    (load complete, converter present, content mounted).
//! 3. The viewport is grown to an oversized first-pass size so nothing wraps
//!    or clips, the content box is measured, the viewport is shrunk around
//!    the measured footprint, and the content is measured again.
//! 4. A full-viewport screenshot is taken at native pixel density and cropped
//!    to the content rectangle in device pixels.
//!
//! # Example
//!
//! ```no_run
//! use mdshot::{RenderOptions, Renderer};
//!
//! # async fn demo() -> mdshot::Result<()> {
//! let renderer = Renderer::new(RenderOptions::default());
//! let image = renderer.render("# Hello\n\nSome *Markdown*.").await?;
//! image.save("hello.png")?;
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod cdp;
pub mod chat;
pub mod config;
pub mod detect;
pub mod handle;
pub mod pipeline;
pub mod probe;
pub mod resize;
pub mod template;

pub use cdp::CdpSurface;
pub use chat::{ChatClient, ChatConfig};
pub use config::Settings;
pub use detect::looks_like_markdown;
pub use handle::SurfaceHandle;
pub use pipeline::{CdpLauncher, Renderer, SurfaceLauncher};

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

/// Configuration for a render surface
///
/// The defaults match what the pipeline expects: a window large enough to
/// hold typical content before the first resize pass, and a navigation
/// deadline well under the overall render budget.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Initial viewport dimensions
    pub viewport: Viewport,
    /// Deadline for the initial document-load event in milliseconds
    pub load_timeout_ms: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            load_timeout_ms: 5000,
        }
    }
}

/// Timing and sizing policy for the render pipeline
///
/// The defaults reproduce the production behavior: an oversized 1200×10000
/// first pass, a 100-pixel right-sizing margin, 800/400 ms settle delays,
/// a 200 ms poll grace followed by up to 100 polls at 100 ms (a 10 s
/// ceiling), and a 15 s end-to-end budget.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Surface creation parameters (initial viewport, load deadline)
    pub surface: SurfaceConfig,
    /// Oversized first-pass viewport that lets content flow naturally
    pub first_pass_viewport: Viewport,
    /// Margin added around the measured content when right-sizing (CSS px)
    pub resize_margin: u32,
    /// Settle delay after the first-pass resize
    pub first_settle: Duration,
    /// Settle delay after the final resize
    pub second_settle: Duration,
    /// Delay after the ready signal before layout is trusted
    pub style_settle: Duration,
    /// Grace delay before the first readiness poll
    pub poll_grace: Duration,
    /// Interval between readiness polls
    pub poll_interval: Duration,
    /// Readiness poll attempt ceiling
    pub max_poll_attempts: u32,
    /// End-to-end wall-clock budget for one render
    pub overall_timeout: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            first_pass_viewport: Viewport {
                width: 1200,
                height: 10000,
            },
            resize_margin: 100,
            first_settle: Duration::from_millis(800),
            second_settle: Duration::from_millis(400),
            style_settle: Duration::from_millis(300),
            poll_grace: Duration::from_millis(200),
            poll_interval: Duration::from_millis(100),
            max_poll_attempts: 100,
            overall_timeout: Duration::from_secs(15),
        }
    }
}

/// Geometry of the content container, as measured inside the surface
///
/// Offsets are floored and extents are ceiled on the surface side, so the
/// box never undershoots the painted content. Produced fresh by every
/// measurement; never reused across resize passes because resizing can shift
/// layout offsets.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ContentGeometry {
    /// Left offset of the content box in CSS pixels (floored)
    pub x: i32,
    /// Top offset of the content box in CSS pixels (floored)
    pub y: i32,
    /// Content box width in CSS pixels (ceiled)
    pub width: u32,
    /// Content box height in CSS pixels (ceiled)
    pub height: u32,
    /// Scale factor between CSS pixels and device pixels (>= 1 in practice)
    pub dpr: f64,
}

/// A crop rectangle in device pixels, clamped to the captured raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Convert CSS-pixel geometry to a device-pixel crop rectangle.
    ///
    /// Offsets are floored and extents are ceiled so rounding can only ever
    /// grow the crop, never shave rendered pixels off it. The origin is then
    /// clamped into the raster and the extents trimmed so that
    /// `origin + extent` never exceeds the raster bounds.
    pub fn from_geometry(geometry: &ContentGeometry, raster_width: u32, raster_height: u32) -> Self {
        let x = (geometry.x as f64 * geometry.dpr).floor() as i64;
        let y = (geometry.y as f64 * geometry.dpr).floor() as i64;
        let width = (geometry.width as f64 * geometry.dpr).ceil() as i64;
        let height = (geometry.height as f64 * geometry.dpr).ceil() as i64;

        let max_x = raster_width.saturating_sub(1) as i64;
        let max_y = raster_height.saturating_sub(1) as i64;
        let x = x.clamp(0, max_x) as u32;
        let y = y.clamp(0, max_y) as u32;

        let width = (width.max(0) as u32).min(raster_width - x.min(raster_width));
        let height = (height.max(0) as u32).min(raster_height - y.min(raster_height));

        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The final cropped raster, owned by the caller
///
/// The surface that produced it may already be gone by the time this value
/// is returned.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Width in device pixels
    pub width: u32,
    /// Height in device pixels
    pub height: u32,
    /// PNG-encoded pixel data
    pub png_data: Vec<u8>,
}

impl RenderedImage {
    /// Write the PNG bytes to a file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, &self.png_data)?;
        Ok(())
    }
}

/// Core trait for render surface implementations
///
/// A surface is an owned, disposable off-screen document host. Exactly one
/// live surface serves an in-flight render; it is destroyed after capture
/// (or torn down by the next run if the pipeline abandoned it). Methods are
/// synchronous; async callers drive a surface through [`SurfaceHandle`],
/// which owns it on a dedicated worker thread.
pub trait Surface {
    /// Create a surface with the given configuration
    fn new(config: SurfaceConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a composed HTML document via an in-memory content address and
    /// wait for the document-load event, bounded by the configured deadline
    fn load_document(&mut self, html: &str) -> Result<()>;

    /// Evaluate a script in the document and return its JSON result
    fn eval(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Resize the surface viewport (CSS pixels)
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<()>;

    /// Capture a full-viewport PNG at native pixel density
    fn capture(&mut self) -> Result<Vec<u8>>;

    /// Tear the surface down and release its resources
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
