use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueueError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The loop driving this queue has stopped or was never started.
    ///
    /// A dead *parent* is not an error: messages addressed to a dropped
    /// parent are discarded silently at delivery time.
    #[error("Message queue closed")]
    QueueClosed,

    /// Indicates that the queue had already stopped by the time the stop was requested.
    #[error("Queue already stopped")]
    AlreadyStopped,
}
