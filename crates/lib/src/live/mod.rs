//! Live-reload broker for development clients.
//!
//! One task owns the set of client queues. Registration, removal and
//! broadcasts all travel through a single ordered command channel, so a
//! broadcast issued after [`Notifier::register`] returns always reaches that
//! client. Delivery is non-blocking: a client whose queue is full or closed is
//! dropped instead of stalling the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::consts::CLIENT_QUEUE_CAPACITY;

enum Command {
  Register {
    id: u64,
    queue: mpsc::Sender<String>,
    ack: oneshot::Sender<()>,
  },
  Unregister(u64),
  Broadcast(String),
}

/// Handle to the broker task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
  commands: mpsc::UnboundedSender<Command>,
  next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for Command {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Command::Register { id, .. } => write!(f, "Register({id})"),
      Command::Unregister(id) => write!(f, "Unregister({id})"),
      Command::Broadcast(message) => write!(f, "Broadcast({message:?})"),
    }
  }
}

impl Notifier {
  /// Start the broker. It runs until `cancel` fires, then drops every client queue.
  pub fn spawn(cancel: CancellationToken) -> (Self, JoinHandle<()>) {
    let (commands, receiver) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_broker(receiver, cancel));
    let notifier = Self {
      commands,
      next_id: Arc::new(AtomicU64::new(1)),
    };
    (notifier, handle)
  }

  /// Add a client. Returns `None` once the broker has shut down.
  pub async fn register(&self) -> Option<Subscription> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let (queue, receiver) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
    let (ack, acked) = oneshot::channel();

    self.commands.send(Command::Register { id, queue, ack }).ok()?;
    acked.await.ok()?;

    Some(Subscription {
      id,
      receiver,
      notifier: self.clone(),
    })
  }

  /// Queue `message` for every registered client.
  pub fn broadcast(&self, message: impl Into<String>) {
    if self.commands.send(Command::Broadcast(message.into())).is_err() {
      debug!("notifier stopped, dropping broadcast");
    }
  }

  fn unregister(&self, id: u64) {
    let _ = self.commands.send(Command::Unregister(id));
  }
}

/// A registered client's inbound queue. Unregisters on drop.
#[derive(Debug)]
pub struct Subscription {
  id: u64,
  receiver: mpsc::Receiver<String>,
  notifier: Notifier,
}

impl Subscription {
  pub fn id(&self) -> u64 {
    self.id
  }

  /// Next message, or `None` once the broker dropped this client.
  pub async fn recv(&mut self) -> Option<String> {
    self.receiver.recv().await
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.notifier.unregister(self.id);
  }
}

async fn run_broker(mut commands: mpsc::UnboundedReceiver<Command>, cancel: CancellationToken) {
  let mut clients: HashMap<u64, mpsc::Sender<String>> = HashMap::new();

  loop {
    let command = tokio::select! {
      _ = cancel.cancelled() => break,
      command = commands.recv() => match command {
        Some(command) => command,
        None => break,
      },
    };

    match command {
      Command::Register { id, queue, ack } => {
        clients.insert(id, queue);
        let _ = ack.send(());
        debug!(client = id, clients = clients.len(), "live-reload client registered");
      }
      Command::Unregister(id) => {
        if clients.remove(&id).is_some() {
          debug!(client = id, clients = clients.len(), "live-reload client unregistered");
        }
      }
      Command::Broadcast(message) => {
        clients.retain(|id, queue| match queue.try_send(message.clone()) {
          Ok(()) => true,
          Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(client = *id, "live-reload client is not keeping up, dropping it");
            false
          }
          Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        info!(clients = clients.len(), %message, "broadcast live-reload message");
      }
    }
  }

  debug!(clients = clients.len(), "notifier shutting down");
}
