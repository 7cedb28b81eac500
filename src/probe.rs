//! Layout probing inside the render surface
//!
//! The prober locates the content container by its fixed element id and
//! reads its bounding rectangle plus the surface's device pixel ratio.
//! Reading `offsetHeight` first forces the engine to resolve any pending
//! layout, so the rectangle that follows is never stale.

use crate::template::CONTAINER_ID;
use crate::{ContentGeometry, Error, Result, SurfaceHandle};

// Offsets are floored and extents ceiled on this side of the boundary so
// sub-pixel boxes can only grow, never clip content.
const MEASURE_TEMPLATE: &str = r#"JSON.stringify((() => {
    const c = document.getElementById('{{CONTAINER_ID}}');
    if (!c) return null;
    void c.offsetHeight;
    const rect = c.getBoundingClientRect();
    return {
        x: Math.floor(rect.x),
        y: Math.floor(rect.y),
        width: Math.ceil(rect.width),
        height: Math.ceil(rect.height),
        dpr: window.devicePixelRatio || 1
    };
})())"#;

pub(crate) fn measure_script() -> String {
    MEASURE_TEMPLATE.replace("{{CONTAINER_ID}}", CONTAINER_ID)
}

/// Measure the content container.
///
/// Returns `None` when the container element is absent; callers treat that
/// as fatal. Every call measures fresh — geometry is never cached across
/// resize passes because resizing can shift layout offsets.
pub async fn measure(surface: &SurfaceHandle) -> Result<Option<ContentGeometry>> {
    let value = surface.eval(&measure_script()).await?;
    if value.is_null() {
        return Ok(None);
    }
    let geometry: ContentGeometry = serde_json::from_value(value)
        .map_err(|e| Error::Script(format!("Malformed geometry probe result: {}", e)))?;
    Ok(Some(geometry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_targets_the_container_id() {
        let script = measure_script();
        assert!(script.contains("markdown-container"));
        assert!(!script.contains("{{CONTAINER_ID}}"));
    }

    #[test]
    fn script_forces_a_layout_flush_before_reading() {
        let script = measure_script();
        let flush = script.find("offsetHeight").unwrap();
        let read = script.find("getBoundingClientRect").unwrap();
        assert!(flush < read);
    }

    #[test]
    fn geometry_deserializes_from_probe_json() {
        let value = serde_json::json!({
            "x": 16, "y": 16, "width": 420, "height": 300, "dpr": 2.0
        });
        let geometry: ContentGeometry = serde_json::from_value(value).unwrap();
        assert_eq!(geometry.x, 16);
        assert_eq!(geometry.width, 420);
        assert_eq!(geometry.dpr, 2.0);
    }
}
