use std::{cmp::Reverse, collections::BinaryHeap, future::Future, sync::Arc, time::Instant};

use async_lock::Mutex;
use futures::{FutureExt as _, StreamExt as _, channel::mpsc, select};
use futures_timer::Delay;

use crate::{
    RefHandler,
    error::{QueueError, Result},
};

mod payload;
pub(crate) use payload::{Envelope, HandlerId, Payload, Tag};

pub(crate) type PayloadTx = mpsc::UnboundedSender<Payload>;
type PayloadRx = mpsc::UnboundedReceiver<Payload>;

/// The cooperative message queue.
///
/// Messages are delivered one at a time, in posting order, with delayed
/// messages interleaved by deadline. [`start`](MessageLoop::start) hands
/// back the loop future and a [`QueueHandle`]; the caller decides where to
/// spawn or await the future, the library never spawns tasks itself.
pub struct MessageLoop {
    tx: PayloadTx,
    rx: PayloadRx,
}

impl MessageLoop {
    pub fn unbounded() -> Self {
        let (tx, rx) = mpsc::unbounded();
        Self { tx, rx }
    }

    pub fn start(self) -> (impl Future<Output = ()>, QueueHandle) {
        let Self { tx, rx } = self;
        let looper = Looper {
            rx,
            pending: BinaryHeap::new(),
            seq: 0,
        };
        (looper.run(), QueueHandle { tx })
    }
}

impl Default for MessageLoop {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// A handle onto a running [`MessageLoop`].
#[derive(Clone)]
pub struct QueueHandle {
    tx: PayloadTx,
}

impl QueueHandle {
    /// Binds `handler` to `parent`, producing a [`RefHandler`] that posts
    /// to this queue.
    ///
    /// Only a weak reference to `parent` is taken.
    pub fn bind<P, H>(&self, parent: &Arc<Mutex<P>>, handler: H) -> RefHandler<P, H>
    where
        P: Send + 'static,
        H: Send + Sync + 'static,
    {
        RefHandler::new(self.tx.clone(), Arc::downgrade(parent), handler)
    }

    /// Stops the loop.
    ///
    /// Messages that are already due are still delivered before the loop
    /// future completes; messages scheduled for a later deadline are
    /// discarded.
    pub fn stop(&self) -> Result<()> {
        self.tx
            .unbounded_send(Payload::Stop)
            .map_err(|_| QueueError::AlreadyStopped)
    }

    /// Whether the loop has shut down.
    pub fn stopped(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One absorbed envelope, ordered by deadline with arrival order as the
/// tie-breaker.
struct Scheduled {
    seq: u64,
    envelope: Envelope,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.envelope.due, self.seq).cmp(&(other.envelope.due, other.seq))
    }
}

struct Looper {
    rx: PayloadRx,
    pending: BinaryHeap<Reverse<Scheduled>>,
    seq: u64,
}

impl Looper {
    async fn run(mut self) {
        log::debug!("message loop running");
        let mut open = true;
        while open {
            open = self.drain();
            self.deliver_due().await;
            if open {
                open = self.wait().await;
            }
        }
        self.deliver_due().await;
        if !self.pending.is_empty() {
            log::debug!(
                "discarding {} undelivered message(s)",
                self.pending.len()
            );
        }
        log::debug!("message loop stopped");
    }

    /// Returns `false` once the loop should shut down.
    fn absorb(&mut self, payload: Payload) -> bool {
        match payload {
            Payload::Post(envelope) => {
                self.seq += 1;
                self.pending.push(Reverse(Scheduled {
                    seq: self.seq,
                    envelope,
                }));
                true
            }
            Payload::Remove(tag) => {
                let before = self.pending.len();
                self.pending
                    .retain(|Reverse(scheduled)| scheduled.envelope.tag != tag);
                log::trace!(
                    "removed {} pending message(s) for handler {}",
                    before - self.pending.len(),
                    tag.handler
                );
                true
            }
            Payload::Stop => false,
        }
    }

    /// Pulls in everything already sitting on the channel without blocking.
    fn drain(&mut self) -> bool {
        loop {
            match self.rx.try_next() {
                Ok(Some(payload)) => {
                    if !self.absorb(payload) {
                        return false;
                    }
                }
                // all senders gone, nothing can arrive anymore
                Ok(None) => return false,
                Err(_) => return true,
            }
        }
    }

    async fn deliver_due(&mut self) {
        loop {
            let due_now = self
                .pending
                .peek()
                .is_some_and(|Reverse(scheduled)| scheduled.envelope.due <= Instant::now());
            if !due_now {
                break;
            }
            if let Some(Reverse(scheduled)) = self.pending.pop() {
                (scheduled.envelope.deliver)().await;
            }
        }
    }

    /// Sleeps until the next payload arrives or the earliest deadline
    /// passes. Returns `false` once the loop should shut down.
    async fn wait(&mut self) -> bool {
        let next_due = self
            .pending
            .peek()
            .map(|Reverse(scheduled)| scheduled.envelope.due);

        let incoming = if let Some(due) = next_due {
            let timeout = due.saturating_duration_since(Instant::now());
            select! {
                payload = self.rx.next() => payload,
                _ = Delay::new(timeout).fuse() => return true,
            }
        } else {
            self.rx.next().await
        };

        match incoming {
            Some(payload) => self.absorb(payload),
            None => false,
        }
    }
}
