use std::{
    any::TypeId,
    future::Future,
    pin::Pin,
    sync::{LazyLock, atomic::AtomicU64},
    time::Instant,
};

static HANDLER_ID: LazyLock<AtomicU64> = LazyLock::new(|| AtomicU64::new(0));

/// Identifies one bound handler for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct HandlerId(u64);

impl Default for HandlerId {
    fn default() -> Self {
        Self(HANDLER_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which handler posted a message and which message type it carries.
///
/// Removal requests match on this pair, so a handler can only withdraw
/// messages it posted itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Tag {
    pub handler: HandlerId,
    pub message: TypeId,
}

type DeliverFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub(crate) type DeliverFn = Box<dyn FnOnce() -> DeliverFuture + Send + 'static>;

/// One queued message with its erased delivery closure.
///
/// The closure owns the message and a weak reference to the parent;
/// nothing in here keeps the parent alive.
pub(crate) struct Envelope {
    pub tag: Tag,
    pub due: Instant,
    pub deliver: DeliverFn,
}

pub(crate) enum Payload {
    Post(Envelope),
    Remove(Tag),
    Stop,
}

impl Payload {
    pub fn post<F>(tag: Tag, due: Instant, deliver: F) -> Self
    where
        F: FnOnce() -> DeliverFuture + Send + 'static,
    {
        Self::Post(Envelope {
            tag,
            due,
            deliver: Box::new(deliver),
        })
    }
}

#[test]
fn handler_ids_go_up() {
    let id1 = HandlerId::default();
    let id2 = HandlerId::default();
    let id3 = HandlerId::default();
    assert!(id1 < id2);
    assert!(id2 < id3);
}
