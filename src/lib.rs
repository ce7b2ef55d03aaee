//! Weak-parent message handlers over a cooperative queue.
//!
//! A [`RefHandler`] forwards queued messages to its *parent* (typically a
//! long-lived component such as a UI controller or playback engine) while
//! holding only a weak reference to it. A message whose parent has already
//! been dropped is discarded silently at delivery time, so stale queued
//! work can never resurrect or outlive the component it was meant for.
//!
//! The queue is a single cooperative loop: messages are delivered one at a
//! time, in posting order, with delayed messages interleaved by deadline.
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_lock::Mutex;
//! use gossamer::{Handler, MessageLoop};
//!
//! struct Player {
//!     position: u32,
//! }
//!
//! struct Seek(u32);
//!
//! struct PlayerHandler;
//!
//! impl Handler<Seek> for PlayerHandler {
//!     type Parent = Player;
//!
//!     fn handle(&self, Seek(position): Seek, player: &mut Player) {
//!         player.position = position;
//!     }
//! }
//!
//! let player = Arc::new(Mutex::new(Player { position: 0 }));
//!
//! let (event_loop, queue) = MessageLoop::unbounded().start();
//! let handler = queue.bind(&player, PlayerHandler);
//!
//! handler.send(Seek(7)).unwrap();
//! queue.stop().unwrap();
//! futures::executor::block_on(event_loop);
//!
//! assert_eq!(futures::executor::block_on(player.lock()).position, 7);
//! ```

mod handler;
mod message;
mod queue;
mod ref_handler;

pub mod error;

pub use error::{QueueError, Result};
pub use handler::Handler;
pub use message::Message;
pub use queue::{MessageLoop, QueueHandle};
pub use ref_handler::RefHandler;
