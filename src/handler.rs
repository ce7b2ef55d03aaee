use crate::Message;

/// The parent-specific half of a [`RefHandler`](crate::RefHandler).
///
/// Implementors supply the logic that runs when a message is delivered
/// while the parent is still alive. The parent is borrowed mutably for the
/// duration of the call, never owned.
///
/// One handler type may implement this for several message types.
pub trait Handler<M: Message>: Send + Sync + 'static {
    type Parent: Send + 'static;

    fn handle(&self, msg: M, parent: &mut Self::Parent);
}
