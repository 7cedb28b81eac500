//! Two-pass viewport resizing around the rendered content
//!
//! Final content dimensions are unknown until the document has rendered, so
//! the first pass opens an oversized viewport where nothing wraps or clips.
//! The second pass shrinks the viewport to the measured footprint plus a
//! margin that absorbs any offset shift the resize itself causes. Each pass
//! is followed by a settle delay before the geometry is trusted.

use crate::{ContentGeometry, RenderOptions, Result, SurfaceHandle};
use log::debug;
use tokio::time::sleep;

/// Open the oversized first-pass viewport and let layout settle.
pub async fn first_pass(surface: &SurfaceHandle, options: &RenderOptions) -> Result<()> {
    let viewport = options.first_pass_viewport;
    surface.set_viewport(viewport.width, viewport.height).await?;
    sleep(options.first_settle).await;
    Ok(())
}

/// Compute the right-sized viewport for the measured content.
///
/// The margin covers both axes' offsets shifting during the second resize.
pub fn right_sized_viewport(geometry: &ContentGeometry, margin: u32) -> (u32, u32) {
    let width = geometry.x.max(0) as u32 + geometry.width + margin;
    let height = geometry.y.max(0) as u32 + geometry.height + margin;
    (width, height)
}

/// Apply the right-sized viewport and let layout settle again.
pub async fn second_pass(
    surface: &SurfaceHandle,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<()> {
    debug!("Right-sized viewport: {}x{}", width, height);
    surface.set_viewport(width, height).await?;
    sleep(options.second_settle).await;
    Ok(())
}
