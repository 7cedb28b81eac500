//! Async facade over a synchronous render surface
//!
//! Surface backends are synchronous (the CDP client blocks on protocol
//! round-trips), while the pipeline is a linear sequence of awaited steps.
//! A [`SurfaceHandle`] bridges the two: a dedicated worker thread owns the
//! surface and executes commands sent from async tasks, so callers get an
//! async interface without requiring the surface itself to be `Send`.

use crate::{Error, Result, Surface};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Load(String, oneshot::Sender<Result<()>>),
    Eval(String, oneshot::Sender<Result<serde_json::Value>>),
    SetViewport(u32, u32, oneshot::Sender<Result<()>>),
    Capture(oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// Handle to a render surface living on its own worker thread.
///
/// Clones share the same underlying surface; the pipeline treats the surface
/// as exclusively owned and only keeps a second handle so an abandoned run's
/// surface can be torn down later. Dropping every handle ends the worker
/// loop and releases the surface.
#[derive(Clone)]
pub struct SurfaceHandle {
    cmd_tx: Sender<Command>,
}

impl SurfaceHandle {
    /// Spawn a worker thread, create the surface on it via `factory`, and
    /// return a handle once initialization has succeeded.
    pub async fn spawn<S, F>(factory: F) -> Result<Self>
    where
        S: Surface + 'static,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize the surface on the worker thread
            let mut surface = match factory() {
                Ok(s) => s,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            // Command loop
            eprintln!("DBG worker {:?}: loop start", thread::current().id());
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Load(html, resp) => {
                        let _ = resp.send(surface.load_document(&html));
                    }
                    Command::Eval(script, resp) => {
                        eprintln!("DBG worker {:?}: eval begin", thread::current().id());
                        let r = surface.eval(&script);
                        eprintln!("DBG worker {:?}: eval end ok={}", thread::current().id(), r.is_ok());
                        let _ = resp.send(r);
                    }
                    Command::SetViewport(width, height, resp) => {
                        let _ = resp.send(surface.set_viewport(width, height));
                    }
                    Command::Capture(resp) => {
                        let t = std::time::Instant::now();
                        let r = surface.capture();
                        eprintln!("DBG worker: Capture took {:?} ok={}", t.elapsed(), r.is_ok());
                        let _ = resp.send(r);
                    }
                    Command::Close(resp) => {
                        eprintln!("DBG worker {:?}: close", thread::current().id());
                        let _ = resp.send(surface.close());
                        break;
                    }
                }
            }
            eprintln!("DBG worker {:?}: loop END", thread::current().id());
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Init(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Load a composed document into the surface
    pub async fn load_document(&self, html: String) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Load(html, tx));
        rx.await
            .map_err(|e| Error::Other(format!("Load canceled: {}", e)))?
    }

    /// Evaluate a script and return its JSON result
    pub async fn eval(&self, script: &str) -> Result<serde_json::Value> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Eval(script.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("Eval canceled: {}", e)))?
    }

    /// Resize the surface viewport
    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::SetViewport(width, height, tx));
        rx.await
            .map_err(|e| Error::Other(format!("SetViewport canceled: {}", e)))?
    }

    /// Capture a full-viewport PNG at native density
    pub async fn capture(&self) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Capture(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Capture canceled: {}", e)))?
    }

    /// Tear down the surface and end the worker loop
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SurfaceConfig;

    struct EchoSurface {
        viewport: (u32, u32),
    }

    impl Surface for EchoSurface {
        fn new(_config: SurfaceConfig) -> Result<Self> {
            Ok(Self { viewport: (0, 0) })
        }

        fn load_document(&mut self, _html: &str) -> Result<()> {
            Ok(())
        }

        fn eval(&mut self, script: &str) -> Result<serde_json::Value> {
            Ok(serde_json::json!({ "script_len": script.len() }))
        }

        fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
            self.viewport = (width, height);
            Ok(())
        }

        fn capture(&mut self) -> Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }

        fn close(self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn commands_round_trip_through_the_worker() {
        let handle = SurfaceHandle::spawn(|| EchoSurface::new(SurfaceConfig::default()))
            .await
            .unwrap();

        handle.load_document("<html></html>".to_string()).await.unwrap();
        let value = handle.eval("probe").await.unwrap();
        assert_eq!(value["script_len"], 5);
        handle.set_viewport(800, 600).await.unwrap();
        assert_eq!(handle.capture().await.unwrap(), vec![1, 2, 3]);
        handle.close().await.unwrap();
    }

    #[tokio::test]
    async fn spawn_surfaces_factory_failure() {
        let result = SurfaceHandle::spawn(|| -> Result<EchoSurface> {
            Err(Error::Init("no backend".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::Init(_))));
    }

    #[tokio::test]
    async fn commands_after_close_fail() {
        let handle = SurfaceHandle::spawn(|| EchoSurface::new(SurfaceConfig::default()))
            .await
            .unwrap();
        let second = handle.clone();
        handle.close().await.unwrap();
        assert!(second.eval("x").await.is_err());
    }
}
