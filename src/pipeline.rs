//! Pipeline orchestration
//!
//! Sequences a render strictly: surface creation, document load, readiness
//! polling, two resize/measure passes, capture, crop. Every step's failure
//! aborts the rest of the run with a typed error; no partial results are
//! returned. A single-flight token rejects concurrent runs, and the overall
//! wall-clock budget races the whole pipeline.

use crate::{
    capture, probe, resize, template, CdpSurface, Error, RenderOptions, RenderedImage, Result,
    Surface, SurfaceConfig, SurfaceHandle,
};
use log::{debug, info, warn};
use serde::Deserialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

/// Seam for producing render surfaces, so the pipeline can be driven against
/// mock surfaces in tests without a real rendering engine.
pub trait SurfaceLauncher: Send + Sync {
    /// Launch a fresh surface with the given configuration
    fn launch(&self, config: SurfaceConfig) -> impl Future<Output = Result<SurfaceHandle>> + Send;
}

/// Default launcher: headless Chrome via the CDP backend
pub struct CdpLauncher;

impl SurfaceLauncher for CdpLauncher {
    async fn launch(&self, config: SurfaceConfig) -> Result<SurfaceHandle> {
        SurfaceHandle::spawn(move || CdpSurface::new(config)).await
    }
}

/// Lifecycle of a single render, in order. Transitions are strictly
/// sequential; any failure short-circuits to a typed error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Idle,
    SurfaceCreated,
    ContentReady,
    ResizedFirstPass,
    MeasuredFirstPass,
    ResizedFinal,
    MeasuredFinal,
    Captured,
    Done,
}

fn enter(state: &mut PipelineState, next: PipelineState) {
    debug!("Pipeline: {:?} -> {:?}", state, next);
    *state = next;
}

// The poller keys on all three conditions holding at once: readyState
// "complete" can fire before the converter has finished executing.
const READY_TEMPLATE: &str = r#"JSON.stringify((() => {
    try {
        return {
            readyState: document.readyState,
            libLoaded: typeof {{SYMBOL}} !== 'undefined',
            rendered: window.{{FLAG}} === true
        };
    } catch (e) {
        return { error: String(e) };
    }
})())"#;

fn ready_script() -> String {
    READY_TEMPLATE
        .replace("{{SYMBOL}}", template::CONVERTER_SYMBOL)
        .replace("{{FLAG}}", template::READY_FLAG)
}

#[derive(Debug, Deserialize)]
struct ReadyProbe {
    #[serde(default, rename = "readyState")]
    ready_state: String,
    #[serde(default, rename = "libLoaded")]
    lib_loaded: bool,
    #[serde(default)]
    rendered: bool,
    #[serde(default)]
    error: Option<String>,
}

impl ReadyProbe {
    fn is_ready(&self) -> bool {
        self.error.is_none() && self.ready_state == "complete" && self.lib_loaded && self.rendered
    }
}

/// Poll the surface until the document reports itself ready.
///
/// A poll attempt that throws is transient and retried; only exhausting the
/// attempt ceiling fails the run.
async fn wait_until_ready(surface: &SurfaceHandle, options: &RenderOptions) -> Result<()> {
    let script = ready_script();
    sleep(options.poll_grace).await;

    for attempt in 1..=options.max_poll_attempts {
        match surface.eval(&script).await {
            Ok(value) => match serde_json::from_value::<ReadyProbe>(value) {
                Ok(probe) => {
                    if let Some(err) = &probe.error {
                        warn!("Readiness probe reported an error: {}", err);
                    } else if probe.is_ready() {
                        debug!("Markdown rendered after {} poll attempts", attempt);
                        return Ok(());
                    } else if attempt % 10 == 0 {
                        debug!(
                            "Waiting for render (attempt {}/{}): readyState={} libLoaded={} rendered={}",
                            attempt,
                            options.max_poll_attempts,
                            probe.ready_state,
                            probe.lib_loaded,
                            probe.rendered
                        );
                    }
                }
                Err(e) => warn!("Malformed readiness probe result: {}", e),
            },
            Err(e) => {
                warn!("Readiness poll failed (attempt {}): {}", attempt, e);
            }
        }

        if attempt < options.max_poll_attempts {
            sleep(options.poll_interval).await;
        }
    }

    let ceiling_ms = options.max_poll_attempts as u64 * options.poll_interval.as_millis() as u64;
    Err(Error::RenderTimeout(ceiling_ms))
}

// Releases the single-flight token when the run ends, however it ends.
struct RunToken<'a>(&'a AtomicBool);

impl Drop for RunToken<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Renders Markdown text to cropped PNG images.
///
/// One renderer serves one invocation source: a second `render` call while
/// a run is in flight is rejected immediately with [`Error::Busy`] rather
/// than queued. Each run creates its own surface and tears down whatever a
/// previous run may have left behind, so two runs never share one.
pub struct Renderer<L: SurfaceLauncher = CdpLauncher> {
    launcher: L,
    options: RenderOptions,
    busy: AtomicBool,
    last_surface: Mutex<Option<SurfaceHandle>>,
}

impl Renderer<CdpLauncher> {
    /// Create a renderer backed by headless Chrome.
    pub fn new(options: RenderOptions) -> Self {
        Self::with_launcher(CdpLauncher, options)
    }
}

impl<L: SurfaceLauncher> Renderer<L> {
    /// Create a renderer with a custom surface launcher.
    pub fn with_launcher(launcher: L, options: RenderOptions) -> Self {
        Self {
            launcher,
            options,
            busy: AtomicBool::new(false),
            last_surface: Mutex::new(None),
        }
    }

    /// Render Markdown text to a cropped PNG.
    ///
    /// Empty or whitespace-only input is rejected before the pipeline is
    /// entered. The run races the overall wall-clock budget; when the budget
    /// wins, the in-flight surface is abandoned (torn down by the next run
    /// or on drop) and [`Error::OverallTimeout`] is returned.
    pub async fn render(&self, markdown: &str) -> Result<RenderedImage> {
        if markdown.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy);
        }
        let _token = RunToken(&self.busy);

        let budget = self.options.overall_timeout;
        eprintln!("DBG render start markdown={:?}", markdown);
        match timeout(budget, self.run_pipeline(markdown)).await {
            Ok(result) => { eprintln!("DBG render completed ok={}", result.is_ok()); result },
            Err(_) => { eprintln!("DBG render TIMEOUT"); Err(Error::OverallTimeout(budget.as_millis() as u64)) },
        }
    }

    async fn run_pipeline(&self, markdown: &str) -> Result<RenderedImage> {
        let mut state = PipelineState::Idle;

        // A surface surviving from an abandoned run is destroyed before a
        // new one is created; two pipelines never share a surface.
        if let Some(stale) = self.last_surface.lock().await.take() {
            debug!("Destroying surface left over from a previous run");
            eprintln!("DBG closing stale surface");
            let _ = stale.close().await;
            eprintln!("DBG closed stale surface");
        }

        let html = template::compose_document(markdown);

        eprintln!("DBG launching surface");
        let surface = self.launcher.launch(self.options.surface.clone()).await?;
        eprintln!("DBG launched surface");
        *self.last_surface.lock().await = Some(surface.clone());
        enter(&mut state, PipelineState::SurfaceCreated);

        eprintln!("DBG driving");
        let result = self.drive(&surface, &mut state, html).await;
        eprintln!("DBG drive done ok={}", result.is_ok());

        // Reached on success and on typed failure alike; only an abandonment
        // (the budget dropping this future mid-await) skips this, leaving the
        // surface in the slot for the next run.
        let _ = self.last_surface.lock().await.take();
        let _ = surface.close().await;

        result
    }

    async fn drive(
        &self,
        surface: &SurfaceHandle,
        state: &mut PipelineState,
        html: String,
    ) -> Result<RenderedImage> {
        let options = &self.options;

        let load_deadline = Duration::from_millis(options.surface.load_timeout_ms);
        timeout(load_deadline, surface.load_document(html))
            .await
            .map_err(|_| Error::LoadTimeout(load_deadline.as_millis() as u64))??;

        eprintln!("DBG loaded, waiting ready");
        wait_until_ready(surface, options).await?;
        eprintln!("DBG ready");
        // Give styles a moment to apply before trusting layout.
        sleep(options.style_settle).await;
        enter(state, PipelineState::ContentReady);

        resize::first_pass(surface, options).await?;
        eprintln!("DBG first_pass done");
        enter(state, PipelineState::ResizedFirstPass);

        let first = probe::measure(surface).await?.ok_or(Error::ContainerNotFound)?;
        eprintln!("DBG measured first {:?}", first);
        debug!("First-pass geometry: {:?}", first);
        enter(state, PipelineState::MeasuredFirstPass);

        let (width, height) = resize::right_sized_viewport(&first, options.resize_margin);
        resize::second_pass(surface, width, height, options).await?;
        eprintln!("DBG second_pass done");
        enter(state, PipelineState::ResizedFinal);

        // Re-measure: the resize itself can reflow the document and shift
        // the content offsets.
        eprintln!("DBG measuring final");
        let final_geometry = probe::measure(surface).await?.ok_or(Error::ContainerNotFound)?;
        eprintln!("DBG measured final {:?}", final_geometry);
        debug!("Final geometry: {:?}", final_geometry);
        enter(state, PipelineState::MeasuredFinal);

        eprintln!("DBG capturing");
        let image = capture::capture_and_crop(surface, &final_geometry).await?;
        eprintln!("DBG captured");
        enter(state, PipelineState::Captured);

        enter(state, PipelineState::Done);
        info!("Rendered markdown to {}x{} image", image.width, image.height);
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_script_checks_all_three_conditions() {
        let script = ready_script();
        assert!(script.contains("readyState"));
        assert!(script.contains("typeof mdjs"));
        assert!(script.contains("markdownRendered"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn readiness_requires_every_condition() {
        let ready = ReadyProbe {
            ready_state: "complete".to_string(),
            lib_loaded: true,
            rendered: true,
            error: None,
        };
        assert!(ready.is_ready());

        let loading = ReadyProbe {
            ready_state: "interactive".to_string(),
            ..probe_with(true, true)
        };
        assert!(!loading.is_ready());

        assert!(!probe_with(false, true).is_ready());
        assert!(!probe_with(true, false).is_ready());

        let errored = ReadyProbe {
            error: Some("boom".to_string()),
            ..probe_with(true, true)
        };
        assert!(!errored.is_ready());
    }

    fn probe_with(lib_loaded: bool, rendered: bool) -> ReadyProbe {
        ReadyProbe {
            ready_state: "complete".to_string(),
            lib_loaded,
            rendered,
            error: None,
        }
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_the_pipeline() {
        struct NeverLauncher;
        impl SurfaceLauncher for NeverLauncher {
            async fn launch(&self, _config: SurfaceConfig) -> Result<SurfaceHandle> {
                panic!("pipeline must not be entered for empty input");
            }
        }

        let renderer = Renderer::with_launcher(NeverLauncher, RenderOptions::default());
        assert!(matches!(renderer.render("").await, Err(Error::EmptyInput)));
        assert!(matches!(
            renderer.render("   \n\t ").await,
            Err(Error::EmptyInput)
        ));
    }
}
