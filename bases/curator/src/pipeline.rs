// bases/curator/src/pipeline.rs
use crate::report::OutcomeReport;
use archive::{
    AlbumArchiver, ArchiveError, ArchiveOutcome, ArchiveQueue, CleanupWarning, OutcomeObserver,
};
use catalog::{tag_updates, Album};
use crossbeam::channel::unbounded;
use std::sync::Arc;
use tag_sources::TagWriter;
use tracing::{debug, info, warn};

/// Archives an album, then writes the canonical tags into the archived
/// copies. A tag that cannot be written is logged; the album stays archived.
pub struct TaggingArchiver<A, W> {
    archiver: A,
    writer: W,
}

impl<A, W> TaggingArchiver<A, W> {
    pub fn new(archiver: A, writer: W) -> Self {
        Self { archiver, writer }
    }
}

impl<A, W> AlbumArchiver for TaggingArchiver<A, W>
where
    A: AlbumArchiver,
    W: TagWriter + Send + Sync,
{
    fn archive(&self, album: &mut Album) -> archive::Result<Vec<CleanupWarning>> {
        let warnings = self.archiver.archive(album)?;
        let mut written = 0;
        for (path, update) in tag_updates(album) {
            match self.writer.write_tag(&path, &update) {
                Ok(()) => written += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Could not write canonical tag"),
            }
        }
        debug!(album = %album.key, written, "Wrote canonical tags");
        Ok(warnings)
    }
}

/// Archive albums on the calling thread, draining whenever the queue fills.
pub fn archive_in_place(
    archiver: Arc<dyn AlbumArchiver>,
    capacity: usize,
    albums: Vec<Album>,
) -> Result<Vec<OutcomeReport>, ArchiveError> {
    let queue = ArchiveQueue::new(capacity, archiver);
    let mut reports = Vec::new();

    for album in albums {
        if queue.is_reserved(&album.key) {
            debug!(album = %album.key, "Already queued, skipping");
            continue;
        }
        if queue.pending() >= capacity {
            reports.extend(queue.drain()?.iter().map(OutcomeReport::from));
        }
        queue.enqueue(album)?;
    }
    reports.extend(queue.drain()?.iter().map(OutcomeReport::from));
    Ok(reports)
}

/// Archive albums on the background worker, collecting outcomes as the
/// observer reports them.
pub fn archive_in_background(
    archiver: Arc<dyn AlbumArchiver>,
    capacity: usize,
    albums: Vec<Album>,
) -> Result<Vec<OutcomeReport>, ArchiveError> {
    let (sender, receiver) = unbounded();
    let observer: OutcomeObserver = Arc::new(move |outcome: &ArchiveOutcome| {
        // Only fails once the caller has stopped collecting.
        let _ = sender.send(OutcomeReport::from(outcome));
    });
    let queue = ArchiveQueue::new(capacity, archiver).with_observer(observer);
    let worker = queue.spawn_worker()?;

    let mut reports = Vec::new();
    let mut queued = 0;
    for album in albums {
        if queue.is_reserved(&album.key) {
            debug!(album = %album.key, "Already queued, skipping");
            continue;
        }
        while queue.pending() >= capacity {
            match receiver.recv() {
                Ok(report) => reports.push(report),
                Err(_) => return Err(ArchiveError::QueueClosed),
            }
        }
        queue.enqueue(album)?;
        queued += 1;
    }

    info!(queued, "All albums queued, waiting for the worker");
    queue.close();
    if worker.join().is_err() {
        return Err(ArchiveError::QueueClosed);
    }
    reports.extend(receiver.try_iter());
    Ok(reports)
}
