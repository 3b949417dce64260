use crate::loading::{CancelledErr, DecodeErr, FetchError, ImageFetcher, ImageFuture, IoErr};
use crossbeam_channel::{Receiver, Sender, unbounded};
use futures::FutureExt;
use futures::channel::oneshot;
use image::RgbaImage;
use snafu::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

struct Job {
    url: String,
    path: PathBuf,
    reply: oneshot::Sender<Result<RgbaImage, FetchError>>,
}

/// Loads images from the local file system on background threads.
///
/// URLs are file paths, optionally prefixed with `file://`. Relative paths resolve against
/// the configured root. The workers exit once the fetcher is dropped.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    jobs: Sender<Job>,
    root: Arc<Path>,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_workers(root, 2)
    }

    pub fn with_workers(root: impl Into<PathBuf>, workers: usize) -> Self {
        let (jobs, rx) = unbounded();

        for index in 0..workers.max(1) {
            let rx: Receiver<Job> = rx.clone();
            std::thread::spawn(move || {
                while let Ok(job) = rx.recv() {
                    // nobody is waiting anymore, e.g. after a context loss
                    if job.reply.is_canceled() {
                        trace!("[File Fetcher] Skipping abandoned load of {}", job.url);
                        continue;
                    }
                    let result = read_image(&job.url, &job.path);
                    let _ = job.reply.send(result);
                }

                debug!("[File Fetcher] Worker {index} exited");
            });
        }

        Self {
            jobs,
            root: Arc::from(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        let path = url.strip_prefix("file://").unwrap_or(url);
        self.root.join(path)
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> ImageFuture {
        let (reply, result) = oneshot::channel();
        let job = Job {
            url: url.to_string(),
            path: self.resolve(url),
            reply,
        };

        if self.jobs.send(job).is_err() {
            let url = url.to_string();
            return async move { CancelledErr { url }.fail::<RgbaImage>() }.boxed();
        }

        let url = url.to_string();
        async move {
            match result.await {
                Ok(result) => result,
                Err(_) => CancelledErr { url }.fail(),
            }
        }
        .boxed()
    }
}

fn read_image(url: &str, path: &Path) -> Result<RgbaImage, FetchError> {
    let bytes = fs::read(path).context(IoErr { url })?;
    let image = image::load_from_memory(&bytes).context(DecodeErr { url })?;
    Ok(image.into_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use image::Rgba;

    #[test]
    fn decodes_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 2, Rgba([9, 8, 7, 255]))
            .save(dir.path().join("tile.png"))
            .unwrap();

        let fetcher = FileFetcher::new(dir.path());
        let image = block_on(fetcher.fetch("file://tile.png")).unwrap();

        assert_eq!(image.dimensions(), (4, 2));
        assert_eq!(*image.get_pixel(3, 1), Rgba([9, 8, 7, 255]));
    }

    #[test]
    fn reports_missing_and_garbage_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("junk.png"), b"not an image").unwrap();
        let fetcher = FileFetcher::new(dir.path());

        assert!(matches!(
            block_on(fetcher.fetch("missing.png")),
            Err(FetchError::Io { .. })
        ));
        assert!(matches!(
            block_on(fetcher.fetch("junk.png")),
            Err(FetchError::Decode { .. })
        ));
    }
}
