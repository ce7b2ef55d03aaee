use std::{
    any::TypeId,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use async_lock::Mutex;
use futures::FutureExt as _;

use crate::{
    Handler, Message,
    error::{QueueError, Result},
    queue::{HandlerId, Payload, PayloadTx, Tag},
};

/// A message handler that holds only a weak reference to its parent.
///
/// Obtained from [`QueueHandle::bind`](crate::QueueHandle::bind). Messages
/// posted through it are delivered in order on the queue's loop. At
/// delivery time the parent is looked up: if it is still alive the bound
/// [`Handler`] runs exactly once with the message and the parent; if it
/// has already been dropped the message is discarded with no side effect
/// and no error. The handler never extends the parent's lifetime, so
/// pending messages cannot keep a torn-down component around.
pub struct RefHandler<P, H> {
    tx: PayloadTx,
    parent: Weak<Mutex<P>>,
    handler: Arc<H>,
    id: HandlerId,
}

impl<P, H> RefHandler<P, H>
where
    P: Send + 'static,
    H: Send + Sync + 'static,
{
    pub(crate) fn new(tx: PayloadTx, parent: Weak<Mutex<P>>, handler: H) -> Self {
        Self {
            tx,
            parent,
            handler: Arc::new(handler),
            id: HandlerId::default(),
        }
    }

    /// Posts `msg` for in-order delivery.
    ///
    /// Errors only if the queue itself is gone; a dead parent is an
    /// expected condition, not an error.
    pub fn send<M>(&self, msg: M) -> Result<()>
    where
        M: Message,
        H: Handler<M, Parent = P>,
    {
        self.post(msg, Instant::now())
    }

    /// Posts `msg` for delivery no earlier than now + `delay`.
    pub fn send_delayed<M>(&self, msg: M, delay: Duration) -> Result<()>
    where
        M: Message,
        H: Handler<M, Parent = P>,
    {
        self.post(msg, Instant::now() + delay)
    }

    /// Withdraws every not-yet-delivered message of type `M` that was
    /// posted through this handler or one of its clones.
    ///
    /// Messages already delivered are unaffected, as are messages posted
    /// after the removal is processed and messages posted by other
    /// handlers.
    pub fn remove_pending<M>(&self) -> Result<()>
    where
        M: Message,
        H: Handler<M, Parent = P>,
    {
        self.tx
            .unbounded_send(Payload::Remove(self.tag::<M>()))
            .map_err(|_| QueueError::QueueClosed)
    }

    /// Whether the parent has been dropped.
    pub fn is_orphaned(&self) -> bool {
        self.parent.strong_count() == 0
    }

    fn post<M>(&self, msg: M, due: Instant) -> Result<()>
    where
        M: Message,
        H: Handler<M, Parent = P>,
    {
        let parent = Weak::clone(&self.parent);
        let handler = Arc::clone(&self.handler);
        let deliver = move || {
            async move {
                // a dropped parent swallows the message
                if let Some(parent) = parent.upgrade() {
                    handler.handle(msg, &mut *parent.lock().await);
                }
            }
            .boxed()
        };
        self.tx
            .unbounded_send(Payload::post(self.tag::<M>(), due, deliver))
            .map_err(|_| QueueError::QueueClosed)
    }

    fn tag<M: Message>(&self) -> Tag {
        Tag {
            handler: self.id,
            message: TypeId::of::<M>(),
        }
    }
}

/// Clones address the same parent and queue and share the handler
/// identity that [`remove_pending`](RefHandler::remove_pending) matches on.
impl<P, H> Clone for RefHandler<P, H> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            parent: Weak::clone(&self.parent),
            handler: Arc::clone(&self.handler),
            id: self.id,
        }
    }
}
