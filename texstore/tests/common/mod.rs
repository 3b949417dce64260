#![allow(dead_code)]

use futures::FutureExt;
use futures::channel::oneshot;
use std::cell::RefCell;
use std::rc::Rc;
use texstore::image::{Rgba, RgbaImage};
use texstore::loading::{FetchError, ImageFetcher, ImageFuture, RemoteErr};
use texstore::{GraphicsSession, RecordingContext};
use tracing_subscriber::EnvFilter;

type Reply = oneshot::Sender<Result<RgbaImage, FetchError>>;

/// Fetcher whose loads only finish when a test says so.
#[derive(Clone, Default)]
pub struct ManualFetcher {
    pending: Rc<RefCell<Vec<(String, Reply)>>>,
    requested: Rc<RefCell<Vec<String>>>,
}

impl ImageFetcher for ManualFetcher {
    fn fetch(&self, url: &str) -> ImageFuture {
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push((url.to_string(), tx));
        self.requested.borrow_mut().push(url.to_string());

        let url = url.to_string();
        async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => RemoteErr {
                    url,
                    reason: "reply dropped",
                }
                .fail(),
            }
        }
        .boxed()
    }
}

impl ManualFetcher {
    fn take(&self, url: &str) -> Option<Reply> {
        let mut pending = self.pending.borrow_mut();
        let index = pending.iter().position(|(pending_url, _)| pending_url == url)?;
        Some(pending.remove(index).1)
    }

    /// Finishes the oldest pending load of `url`. Returns `false` if nobody is waiting for it.
    pub fn complete(&self, url: &str, image: RgbaImage) -> bool {
        self.take(url)
            .is_some_and(|reply| reply.send(Ok(image)).is_ok())
    }

    pub fn fail(&self, url: &str) -> bool {
        let error = RemoteErr {
            url,
            reason: "404 Not Found",
        }
        .build();
        self.take(url).is_some_and(|reply| reply.send(Err(error)).is_ok())
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn session() -> (GraphicsSession<RecordingContext>, ManualFetcher) {
    init_tracing();

    let fetcher = ManualFetcher::default();
    let session = GraphicsSession::new(RecordingContext::default(), fetcher.clone());
    (session, fetcher)
}

pub fn filled(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

pub fn face_urls() -> Vec<String> {
    ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"]
        .map(str::to_string)
        .to_vec()
}
