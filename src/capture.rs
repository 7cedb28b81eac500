//! Capture and crop engine
//!
//! Takes a full-viewport raster snapshot at native pixel density and
//! extracts the sub-rectangle covering the measured content bounds. The
//! CSS-to-device conversion and clamping live in [`PixelRect`]; this module
//! owns the raster round trip.

use crate::{ContentGeometry, Error, PixelRect, RenderedImage, Result, SurfaceHandle};
use image::ImageFormat;
use log::debug;
use std::io::Cursor;

/// Capture the surface and crop the raster to the measured content bounds.
pub async fn capture_and_crop(
    surface: &SurfaceHandle,
    geometry: &ContentGeometry,
) -> Result<RenderedImage> {
    eprintln!("DBG capture: sending capture cmd");
    let png = surface.capture().await?;
    eprintln!("DBG capture: got {} bytes, cropping", png.len());
    let r = crop_to_content(&png, geometry);
    eprintln!("DBG capture: crop done ok={}", r.is_ok());
    r
}

/// Crop a captured PNG to the content geometry.
///
/// Fails with [`Error::CaptureEmpty`] when the raster (or the clamped crop)
/// has zero area — a capture-engine malfunction, distinct from a
/// measurement failure.
pub fn crop_to_content(png: &[u8], geometry: &ContentGeometry) -> Result<RenderedImage> {
    let raster = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|e| Error::Image(format!("Failed to decode screenshot: {}", e)))?;

    let raster_width = raster.width();
    let raster_height = raster.height();
    debug!("Captured raster: {}x{}", raster_width, raster_height);
    if raster_width == 0 || raster_height == 0 {
        return Err(Error::CaptureEmpty);
    }

    let rect = PixelRect::from_geometry(geometry, raster_width, raster_height);
    debug!(
        "Crop (device pixels): {},{} {}x{} (dpr {})",
        rect.x, rect.y, rect.width, rect.height, geometry.dpr
    );
    if rect.is_empty() {
        return Err(Error::CaptureEmpty);
    }

    let cropped = raster.crop_imm(rect.x, rect.y, rect.width, rect.height);

    let mut buffer = Cursor::new(Vec::new());
    cropped
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| Error::Image(format!("Failed to encode cropped image: {}", e)))?;

    Ok(RenderedImage {
        width: rect.width,
        height: rect.height,
        png_data: buffer.into_inner(),
    })
}
