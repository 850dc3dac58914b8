// components/archive/src/queue.rs
use crate::cleanup::CleanupWarning;
use crate::error::{ArchiveError, Result};
use crate::mover::Archiver;
use catalog::{Album, AlbumKey};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};

/// Whatever performs the move for a queued album.
pub trait AlbumArchiver: Send + Sync {
    fn archive(&self, album: &mut Album) -> Result<Vec<CleanupWarning>>;
}

impl AlbumArchiver for Archiver {
    fn archive(&self, album: &mut Album) -> Result<Vec<CleanupWarning>> {
        self.archive_album(album)
    }
}

/// Result of archiving one queued album. `album` carries the new paths on
/// success and is unchanged otherwise.
#[derive(Debug)]
pub struct ArchiveOutcome {
    pub key: AlbumKey,
    pub album: Album,
    pub result: Result<Vec<CleanupWarning>>,
}

pub type OutcomeObserver = Arc<dyn Fn(&ArchiveOutcome) + Send + Sync>;

type Reserved = Arc<RwLock<HashSet<AlbumKey>>>;

/// FIFO of albums waiting to be archived by a single consumer.
///
/// An album is reserved from `enqueue` until its outcome is reported, so
/// the same album cannot be queued twice. The reserved set is the only
/// state shared with the worker thread.
pub struct ArchiveQueue {
    sender: Sender<Album>,
    receiver: Receiver<Album>,
    reserved: Reserved,
    archiver: Arc<dyn AlbumArchiver>,
    observer: Option<OutcomeObserver>,
    worker_started: AtomicBool,
}

impl ArchiveQueue {
    pub fn new(capacity: usize, archiver: Arc<dyn AlbumArchiver>) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            reserved: Arc::new(RwLock::new(HashSet::new())),
            archiver,
            observer: None,
            worker_started: AtomicBool::new(false),
        }
    }

    pub fn with_observer(mut self, observer: OutcomeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn enqueue(&self, album: Album) -> Result<()> {
        let key = album.key.clone();
        if !self.reserved.write().insert(key.clone()) {
            return Err(ArchiveError::AlreadyQueued { key });
        }

        match self.sender.try_send(album) {
            Ok(()) => {
                debug!(album = %key, "Queued for archiving");
                Ok(())
            }
            Err(e) => {
                self.reserved.write().remove(&key);
                match e {
                    TrySendError::Full(_) => Err(ArchiveError::QueueFull { key }),
                    TrySendError::Disconnected(_) => Err(ArchiveError::QueueClosed),
                }
            }
        }
    }

    pub fn is_reserved(&self, key: &AlbumKey) -> bool {
        self.reserved.read().contains(key)
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Archive everything queued so far on the calling thread.
    pub fn drain(&self) -> Result<Vec<ArchiveOutcome>> {
        if self.worker_started.load(Ordering::SeqCst) {
            return Err(ArchiveError::WorkerRunning);
        }
        let mut outcomes = Vec::new();
        while let Ok(album) = self.receiver.try_recv() {
            outcomes.push(process(
                self.archiver.as_ref(),
                &self.reserved,
                self.observer.as_ref(),
                album,
            ));
        }
        Ok(outcomes)
    }

    /// Start the background consumer. It runs until the queue is closed
    /// and everything already queued has been archived.
    pub fn spawn_worker(&self) -> Result<JoinHandle<()>> {
        if self.worker_started.swap(true, Ordering::SeqCst) {
            return Err(ArchiveError::WorkerRunning);
        }

        let receiver = self.receiver.clone();
        let reserved = self.reserved.clone();
        let archiver = self.archiver.clone();
        let observer = self.observer.clone();

        std::thread::Builder::new()
            .name("archive-worker".into())
            .spawn(move || {
                info!("Archive worker started");
                while let Ok(album) = receiver.recv() {
                    process(archiver.as_ref(), &reserved, observer.as_ref(), album);
                }
                info!("Archive queue closed, worker exiting");
            })
            .map_err(ArchiveError::Spawn)
    }

    /// Stop accepting albums. A running worker finishes what is queued.
    pub fn close(self) {
        drop(self);
    }
}

fn process(
    archiver: &dyn AlbumArchiver,
    reserved: &Reserved,
    observer: Option<&OutcomeObserver>,
    mut album: Album,
) -> ArchiveOutcome {
    let key = album.key.clone();
    let snapshot = album.clone();

    let result = panic::catch_unwind(AssertUnwindSafe(|| archiver.archive(&mut album)))
        .unwrap_or_else(|_| Err(ArchiveError::WorkerPanicked { key: key.clone() }));

    // Failed attempts hand back the album as it was queued.
    let album = if result.is_ok() { album } else { snapshot };
    reserved.write().remove(&key);

    match &result {
        Ok(warnings) => info!(album = %key, warnings = warnings.len(), "Archive finished"),
        Err(e) => error!(album = %key, error = %e, "Archive failed"),
    }

    let outcome = ArchiveOutcome {
        key,
        album,
        result,
    };
    if let Some(observer) = observer {
        observer(&outcome);
    }
    outcome
}
