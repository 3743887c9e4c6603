use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Run `action` once per burst of events.
///
/// Every event restarts a `quiet` timer; `action` runs when the timer expires.
/// Events arriving while `action` runs are queued and produce at most one
/// further run. Returns when `cancel` fires or the event channel closes; a
/// running `action` is never interrupted.
pub async fn debounce<F, Fut>(
  mut events: mpsc::UnboundedReceiver<()>,
  quiet: Duration,
  cancel: CancellationToken,
  mut action: F,
) where
  F: FnMut() -> Fut,
  Fut: Future<Output = ()>,
{
  loop {
    // Idle
    tokio::select! {
      _ = cancel.cancelled() => return,
      event = events.recv() => if event.is_none() { return },
    }

    // Debouncing
    let mut coalesced = 1usize;
    loop {
      tokio::select! {
        _ = cancel.cancelled() => return,
        event = events.recv() => match event {
          Some(()) => coalesced += 1,
          None => break,
        },
        _ = tokio::time::sleep(quiet) => break,
      }
    }

    // Rebuilding
    debug!(events = coalesced, "change detected, rebuilding");
    action().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<()>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&runs);
    (runs, move || {
      handle.fetch_add(1, Ordering::SeqCst);
      std::future::ready(())
    })
  }

  #[tokio::test(start_paused = true)]
  async fn burst_triggers_one_run() {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let (runs, action) = counter();
    let task = tokio::spawn(debounce(rx, Duration::from_millis(1250), cancel.clone(), action));

    for _ in 0..10 {
      tx.send(()).unwrap();
      tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    cancel.cancel();
    task.await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn separate_bursts_trigger_separate_runs() {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let (runs, action) = counter();
    let task = tokio::spawn(debounce(rx, Duration::from_millis(1250), cancel.clone(), action));

    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    tx.send(()).unwrap();
    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    cancel.cancel();
    task.await.unwrap();
  }

  #[tokio::test(start_paused = true)]
  async fn events_during_run_cause_one_follow_up() {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&runs);
    let during = tx.clone();

    let task = tokio::spawn(debounce(rx, Duration::from_millis(100), cancel.clone(), move || {
      let counted = Arc::clone(&counted);
      let during = during.clone();
      async move {
        if counted.fetch_add(1, Ordering::SeqCst) == 0 {
          for _ in 0..5 {
            during.send(()).unwrap();
          }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
      }
    }));

    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    cancel.cancel();
    task.await.unwrap();
  }

  #[tokio::test(start_paused = true)]
  async fn closed_channel_flushes_pending_burst() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (runs, action) = counter();

    tx.send(()).unwrap();
    drop(tx);
    debounce(rx, Duration::from_millis(1250), CancellationToken::new(), action).await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }
}
