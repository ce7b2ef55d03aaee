/// An opaque unit of queued work.
///
/// Neither the queue nor the wrapper ever inspects a message; it is moved
/// through the queue and handed to the handler's extension point as-is.
/// The concrete message *type* doubles as the discriminant for
/// [`RefHandler::remove_pending`](crate::RefHandler::remove_pending),
/// taking the role that integer message codes play in other runtimes.
pub trait Message: Send + 'static {}

impl<T: Send + 'static> Message for T {}
