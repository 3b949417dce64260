use crate::loading::{FetchError, ImageFuture, LoadId, LoadTarget};
use crate::textures::TextureKey;
use futures::FutureExt;
use image::RgbaImage;
use std::collections::BTreeMap;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::{debug, trace};
use web_time::Instant;

struct InFlight {
    url: String,
    target: LoadTarget,
    started: Instant,
    future: ImageFuture,
}

/// A load that finished, successfully or not. Already removed from the in-flight set.
#[derive(Debug)]
pub struct CompletedLoad {
    pub id: LoadId,
    pub url: String,
    pub target: LoadTarget,
    pub elapsed: Duration,
    pub result: Result<RgbaImage, FetchError>,
}

/// The set of image fetches currently in flight for one session.
#[derive(Default)]
pub struct ImageLoadCoordinator {
    next_id: u64,
    in_flight: BTreeMap<LoadId, InFlight>,
}

impl std::fmt::Debug for ImageLoadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoadCoordinator")
            .field("next_id", &self.next_id)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl ImageLoadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(
        &mut self,
        url: impl Into<String>,
        target: LoadTarget,
        future: ImageFuture,
    ) -> LoadId {
        let id = LoadId(self.next_id);
        self.next_id += 1;

        let url = url.into();
        trace!("[Image Loader] Tracking load {id} of {url} for {target:?}");
        self.in_flight.insert(
            id,
            InFlight {
                url,
                target,
                started: Instant::now(),
                future,
            },
        );
        id
    }

    /// Drops a load without applying it. Returns whether it was still in flight.
    pub fn untrack(&mut self, id: LoadId) -> bool {
        self.in_flight.remove(&id).is_some()
    }

    /// Polls every in-flight load once and removes the ones that finished.
    ///
    /// Completions come back in the order the loads were started.
    pub fn poll_completed(&mut self, cx: &mut Context<'_>) -> Vec<CompletedLoad> {
        let mut finished = Vec::new();
        for (id, load) in self.in_flight.iter_mut() {
            if let Poll::Ready(result) = load.future.poll_unpin(cx) {
                finished.push((*id, result));
            }
        }

        finished
            .into_iter()
            .filter_map(|(id, result)| {
                let load = self.in_flight.remove(&id)?;
                Some(CompletedLoad {
                    id,
                    url: load.url,
                    target: load.target,
                    elapsed: load.started.elapsed(),
                    result,
                })
            })
            .collect()
    }

    /// Drops every in-flight future. Their results never reach a texture.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.in_flight.len();
        self.in_flight.clear();
        if cancelled > 0 {
            debug!("[Image Loader] Cancelled {cancelled} loads");
        }
        cancelled
    }

    /// Drops the loads feeding `key`.
    pub fn cancel_for(&mut self, key: TextureKey) -> usize {
        let before = self.in_flight.len();
        self.in_flight.retain(|_, load| load.target.key() != key);
        before - self.in_flight.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn url(&self, id: LoadId) -> Option<&str> {
        self.in_flight.get(&id).map(|load| load.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::CancelledErr;
    use futures::channel::oneshot;
    use futures::task::noop_waker_ref;
    use slotmap::SlotMap;

    fn pending_load() -> (oneshot::Sender<Result<RgbaImage, FetchError>>, ImageFuture) {
        let (tx, rx) = oneshot::channel();
        let future = async move {
            rx.await
                .unwrap_or_else(|_| CancelledErr { url: "test" }.fail())
        };
        (tx, future.boxed())
    }

    #[test]
    fn completions_leave_the_set() {
        let mut keys = SlotMap::<TextureKey, ()>::with_key();
        let key = keys.insert(());
        let mut coordinator = ImageLoadCoordinator::new();
        let mut cx = Context::from_waker(noop_waker_ref());

        let (first_tx, first) = pending_load();
        let (_second_tx, second) = pending_load();
        let first_id = coordinator.track("a.png", LoadTarget::Image(key), first);
        coordinator.track("b.png", LoadTarget::CubeFace { key, face: 0 }, second);

        assert!(coordinator.poll_completed(&mut cx).is_empty());
        assert_eq!(coordinator.in_flight(), 2);
        assert_eq!(coordinator.url(first_id), Some("a.png"));

        first_tx.send(Ok(RgbaImage::new(2, 2))).unwrap();
        let done = coordinator.poll_completed(&mut cx);

        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, first_id);
        assert_eq!(done[0].url, "a.png");
        assert!(done[0].result.is_ok());
        assert_eq!(coordinator.in_flight(), 1);
        assert_eq!(coordinator.url(first_id), None);
    }

    #[test]
    fn dropped_sender_reports_cancellation() {
        let mut keys = SlotMap::<TextureKey, ()>::with_key();
        let key = keys.insert(());
        let mut coordinator = ImageLoadCoordinator::new();
        let mut cx = Context::from_waker(noop_waker_ref());

        let (tx, load) = pending_load();
        coordinator.track("gone.png", LoadTarget::Image(key), load);
        drop(tx);

        let done = coordinator.poll_completed(&mut cx);
        assert!(matches!(done[0].result, Err(FetchError::Cancelled { .. })));
        assert!(coordinator.is_idle());
    }

    #[test]
    fn cancellation_by_key_and_in_bulk() {
        let mut keys = SlotMap::<TextureKey, ()>::with_key();
        let a = keys.insert(());
        let b = keys.insert(());
        let mut coordinator = ImageLoadCoordinator::new();

        let mut senders = Vec::new();
        for target in [
            LoadTarget::Image(a),
            LoadTarget::CubeFace { key: b, face: 0 },
            LoadTarget::CubeFace { key: b, face: 1 },
        ] {
            let (tx, load) = pending_load();
            senders.push(tx);
            coordinator.track("x.png", target, load);
        }

        assert_eq!(coordinator.cancel_for(b), 2);
        assert_eq!(coordinator.in_flight(), 1);
        assert_eq!(coordinator.cancel_all(), 1);
        assert!(senders.iter().all(|tx| tx.is_canceled()));
    }
}
