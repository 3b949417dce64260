use crate::context::GraphicsContext;
use static_assertions::assert_impl_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Raised by the host when the platform reports that the graphics context is gone.
///
/// Cheap to clone and safe to raise from any thread. The owning session notices it the next
/// time it is used.
#[derive(Debug, Clone, Default)]
pub struct ContextLossSignal {
    lost: Arc<AtomicBool>,
}

assert_impl_all!(ContextLossSignal: Send, Sync);

impl ContextLossSignal {
    pub fn raise(&self) {
        self.lost.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.lost.swap(false, Ordering::AcqRel)
    }
}

/// Per-context listener for context loss.
#[derive(Debug, Default)]
pub struct ContextLossHandler {
    signal: ContextLossSignal,
    registered: bool,
    losses: usize,
}

impl ContextLossHandler {
    pub fn signal(&self) -> ContextLossSignal {
        self.signal.clone()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Number of losses handled so far.
    pub fn losses(&self) -> usize {
        self.losses
    }

    pub(crate) fn register<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        if self.registered {
            return;
        }

        ctx.register_context_lost(self.signal());
        self.registered = true;
        debug!("[Context Loss] Listener registered");
    }

    /// Consumes a raised signal.
    pub(crate) fn take_pending(&self) -> bool {
        self.signal.take()
    }

    pub(crate) fn record_loss(&mut self) {
        self.losses += 1;
    }
}
