//! Background asset rasterization.
//!
//! Rasterizing a large vector asset can take long enough to stall a frame,
//! so this module moves the parse+rasterize stage onto a worker thread.
//! Finished images come back over a channel, and the render thread (the
//! only thread that owns the GL context) performs the texture upload
//! itself. Failures travel the same channel as values; nothing is
//! swallowed.

use std::sync::mpsc;
use std::thread;

use log::warn;

use crate::error::Result;
use crate::raster::{rasterize_from, AssetSource, RasterizedImage};

/// A pending rasterization job.
struct LoadRequest {
    id: String,
    scale: f32,
}

/// The outcome of one rasterization job, delivered to the render thread.
pub struct LoadResult {
    /// The asset identifier the job was requested under.
    pub id: String,
    /// The scale it was rasterized at.
    pub scale: f32,
    /// The rasterized image, or the error the host must decide about.
    pub outcome: Result<RasterizedImage>,
}

/// Indicates that a request could not be sent because the worker thread
/// has exited.
pub struct LoaderDisconnected;

impl std::fmt::Debug for LoaderDisconnected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "asset loader disconnected")
    }
}

/// Handle held by the render thread to communicate with the rasterization
/// worker.
///
/// Dropping the loader closes the request channel; the worker finishes its
/// current job and exits, and the thread is joined.
pub struct AssetLoader {
    /// Channel to forward requests to the worker; `None` only during drop.
    sender: Option<mpsc::Sender<LoadRequest>>,
    /// Channel the worker delivers finished jobs on.
    receiver: mpsc::Receiver<LoadResult>,
    /// Handle for the worker thread.
    worker: Option<thread::JoinHandle<()>>,
}

impl AssetLoader {
    /// Spawn the rasterization worker over the given asset source.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn a thread.
    #[must_use]
    pub fn spawn<S>(source: S) -> Self
    where
        S: AssetSource + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (result_tx, result_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("sprite-asset-loader".to_string())
            .spawn(move || {
                while let Ok(LoadRequest { id, scale }) = request_rx.recv() {
                    let outcome = rasterize_from(&source, &id, scale);
                    if let Err(err) = &outcome {
                        warn!("failed to rasterize `{id}`: {err}");
                    }
                    if result_tx.send(LoadResult { id, scale, outcome }).is_err() {
                        // Render side is gone; nothing left to deliver to.
                        break;
                    }
                }
            })
            .expect("failed to spawn asset loader thread");

        Self {
            sender: Some(request_tx),
            receiver: result_rx,
            worker: Some(worker),
        }
    }

    /// Enqueue a rasterization job.
    ///
    /// # Errors
    ///
    /// [`LoaderDisconnected`] if the worker thread has exited.
    pub fn request(&self, id: &str, scale: f32) -> std::result::Result<(), LoaderDisconnected> {
        let request = LoadRequest {
            id: id.to_owned(),
            scale,
        };
        self.sender
            .as_ref()
            .ok_or(LoaderDisconnected)?
            .send(request)
            .map_err(|_| LoaderDisconnected)
    }

    /// Take the next finished job, if any, without blocking.
    ///
    /// The render thread calls this once per frame and uploads successful
    /// images itself.
    #[must_use]
    pub fn poll(&self) -> Option<LoadResult> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        // Closing the request channel lets the worker drain and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use std::time::Duration;

    const BOX_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200"><rect width="200" height="200" fill="#00ff00"/></svg>"##;

    fn pack() -> HashMap<String, Vec<u8>> {
        let mut pack = HashMap::new();
        pack.insert("box.svg".to_owned(), BOX_SVG.to_vec());
        pack
    }

    fn wait(loader: &AssetLoader) -> LoadResult {
        loader
            .receiver
            .recv_timeout(Duration::from_secs(10))
            .expect("worker must deliver a result")
    }

    #[test]
    fn request_yields_rasterized_image() {
        let loader = AssetLoader::spawn(pack());
        loader.request("box.svg", 1.0).expect("worker alive");

        let result = wait(&loader);
        assert_eq!(result.id, "box.svg");
        let image = result.outcome.expect("rasterization succeeds");
        assert_eq!(image.atlas_width, 256);
        assert_eq!(image.content_width, 200);
    }

    #[test]
    fn unknown_asset_arrives_as_error_value() {
        let loader = AssetLoader::spawn(pack());
        loader.request("missing.svg", 1.0).expect("worker alive");

        let result = wait(&loader);
        match result.outcome {
            Err(Error::AssetNotFound(id)) => assert_eq!(id, "missing.svg"),
            _ => panic!("expected AssetNotFound"),
        }
    }

    #[test]
    fn jobs_preserve_request_order() {
        let loader = AssetLoader::spawn(pack());
        loader.request("box.svg", 1.0).expect("worker alive");
        loader.request("box.svg", 2.0).expect("worker alive");

        let first = wait(&loader);
        let second = wait(&loader);
        assert!((first.scale - 1.0).abs() < f32::EPSILON);
        assert!((second.scale - 2.0).abs() < f32::EPSILON);
    }
}
