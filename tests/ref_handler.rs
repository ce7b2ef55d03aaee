#![allow(clippy::unwrap_used)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use assert_matches::assert_matches;
use async_lock::Mutex;
use gossamer::{Handler, MessageLoop, QueueError};

#[derive(Default)]
struct Display {
    lines: Vec<String>,
}

struct ShowText(String);

/// Counts invocations on itself so dispatch is observable even after the
/// parent is gone.
struct DisplayHandler(Arc<AtomicUsize>);

impl Handler<ShowText> for DisplayHandler {
    type Parent = Display;

    fn handle(&self, ShowText(line): ShowText, display: &mut Display) {
        self.0.fetch_add(1, Ordering::SeqCst);
        display.lines.push(line);
    }
}

#[test_log::test(tokio::test)]
async fn live_parent_receives_the_message_exactly_once() {
    let display = Arc::new(Mutex::new(Display::default()));
    let invocations = Arc::new(AtomicUsize::new(0));

    let (event_loop, queue) = MessageLoop::unbounded().start();
    let task = tokio::spawn(event_loop);

    let handler = queue.bind(&display, DisplayHandler(Arc::clone(&invocations)));
    handler.send(ShowText("hello".into())).unwrap();

    queue.stop().unwrap();
    task.await.unwrap();

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(display.lock().await.lines, vec!["hello"]);
}

#[test_log::test(tokio::test)]
async fn dropped_parent_never_sees_the_message() {
    let display = Arc::new(Mutex::new(Display::default()));
    let invocations = Arc::new(AtomicUsize::new(0));

    let (event_loop, queue) = MessageLoop::unbounded().start();
    let task = tokio::spawn(event_loop);

    let handler = queue.bind(&display, DisplayHandler(Arc::clone(&invocations)));
    drop(display);

    // posting still succeeds, the drop happens at delivery time
    handler.send(ShowText("into the void".into())).unwrap();

    queue.stop().unwrap();
    task.await.unwrap();

    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[test_log::test(tokio::test)]
async fn parent_stays_collectible_while_handler_and_messages_remain() {
    let display = Arc::new(Mutex::new(Display::default()));
    let invocations = Arc::new(AtomicUsize::new(0));

    let (event_loop, queue) = MessageLoop::unbounded().start();

    let handler = queue.bind(&display, DisplayHandler(Arc::clone(&invocations)));
    handler.send(ShowText("queued".into())).unwrap();

    let observer = Arc::downgrade(&display);
    drop(display);

    // handler and an undelivered message are still reachable, yet the
    // parent is gone
    assert!(observer.upgrade().is_none());
    assert!(handler.is_orphaned());

    queue.stop().unwrap();
    event_loop.await;

    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[test_log::test(tokio::test)]
async fn queue_errors_are_reported_but_dead_parents_are_not() {
    let display = Arc::new(Mutex::new(Display::default()));
    let invocations = Arc::new(AtomicUsize::new(0));

    let (event_loop, queue) = MessageLoop::unbounded().start();
    let task = tokio::spawn(event_loop);

    let handler = queue.bind(&display, DisplayHandler(Arc::clone(&invocations)));
    drop(display);
    assert!(handler.send(ShowText("fine".into())).is_ok());

    queue.stop().unwrap();
    task.await.unwrap();

    assert_matches!(
        handler.send(ShowText("too late".into())),
        Err(QueueError::QueueClosed)
    );
}
