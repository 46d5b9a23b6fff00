//! Off-thread aggregation with last-edit-wins delivery.
//!
//! A dedicated thread owns the engine and the point cloud. Edits are tagged
//! with increasing generations and applied strictly in submission order. After
//! draining everything queued, the thread aggregates once and publishes the
//! result only if no newer edit arrived in the meantime; the caller side
//! additionally drops any update older than the newest submitted generation,
//! keeping the rejections it carried for the next update handed out.

use crate::dataset::PointCloud;
use crate::error::SelectError;
use crate::model::{EditKind, PolygonEditEvent, PolygonId};
use crate::{SelectionEngine, SelectorConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Selection published by the worker for one settled generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionUpdate {
    /// Newest generation included in `indices`.
    pub generation: u64,
    pub indices: Vec<u32>,
    /// Edits folded into this update that were rejected, by generation.
    pub rejected: Vec<(u64, SelectError)>,
}

/// Receipt for a submitted edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Submitted {
    pub generation: u64,
    /// Id the worker's store assigns, for `Created` events.
    pub created: Option<PolygonId>,
}

enum Command {
    Edit { generation: u64, event: PolygonEditEvent, expect: Option<PolygonId> },
    Refresh { generation: u64 },
    Shutdown,
}

#[derive(Default)]
struct Batch {
    generation: u64,
    rejected: Vec<(u64, SelectError)>,
}

impl Batch {
    /// Returns false on shutdown.
    fn take(&mut self, engine: &mut SelectionEngine, cmd: Command) -> bool {
        match cmd {
            Command::Edit { generation, event, expect } => {
                self.generation = generation;
                match engine.apply(event) {
                    Ok(assigned) => {
                        if assigned != expect {
                            warn!(?assigned, ?expect, "worker store assigned an unexpected id");
                        }
                    }
                    Err(e) => {
                        debug!(generation, error = %e, "edit rejected");
                        self.rejected.push((generation, e));
                    }
                }
                true
            }
            Command::Refresh { generation } => {
                self.generation = generation;
                true
            }
            Command::Shutdown => false,
        }
    }
}

fn run(
    mut engine: SelectionEngine,
    points: Arc<PointCloud>,
    commands: Receiver<Command>,
    updates: Sender<SelectionUpdate>,
    latest: Arc<AtomicU64>,
) {
    let mut batch = Batch::default();
    while let Ok(cmd) = commands.recv() {
        if !batch.take(&mut engine, cmd) {
            break;
        }
        let mut open = true;
        while open {
            match commands.try_recv() {
                Ok(cmd) => open = batch.take(&mut engine, cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => open = false,
            }
        }
        if !open {
            break;
        }

        let indices = engine.selection(&points.view()).to_vec();
        if latest.load(Ordering::Acquire) > batch.generation {
            // a newer edit is already queued; its update will carry this batch too
            debug!(generation = batch.generation, "aggregation superseded");
            continue;
        }
        let update = SelectionUpdate {
            generation: batch.generation,
            indices,
            rejected: std::mem::take(&mut batch.rejected),
        };
        if updates.send(update).is_err() {
            break;
        }
    }
    debug!("aggregation worker stopped");
}

/// Handle to the aggregation thread. Dropping it stops the thread.
pub struct AggregationWorker {
    commands: Sender<Command>,
    updates: Receiver<SelectionUpdate>,
    latest: Arc<AtomicU64>,
    // the worker's store is driven only from here, so its ids are predictable
    next_id: u32,
    // rejections from superseded updates, not yet handed to the caller
    carried: Vec<(u64, SelectError)>,
    handle: Option<JoinHandle<()>>,
}

impl AggregationWorker {
    pub fn spawn(points: Arc<PointCloud>, config: SelectorConfig) -> Self {
        let (commands, command_rx) = mpsc::channel();
        let (update_tx, updates) = mpsc::channel();
        let latest = Arc::new(AtomicU64::new(0));
        let engine = SelectionEngine::with_config(config);
        let thread_latest = Arc::clone(&latest);
        let handle = thread::spawn(move || run(engine, points, command_rx, update_tx, thread_latest));
        AggregationWorker {
            commands,
            updates,
            latest,
            next_id: 0,
            carried: Vec::new(),
            handle: Some(handle),
        }
    }

    fn next_generation(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Queue one edit. Edits are applied in the order they are submitted.
    pub fn submit(&mut self, event: PolygonEditEvent) -> Submitted {
        // mirrors PolygonStore: once the id space is exhausted the edit is
        // rejected by the worker and no id is predicted
        let created = if event.kind == EditKind::Created {
            self.next_id.checked_add(1).map(|next| {
                let id = PolygonId(self.next_id);
                self.next_id = next;
                id
            })
        } else {
            None
        };
        let generation = self.next_generation();
        let _ = self.commands.send(Command::Edit {
            generation,
            event,
            expect: created,
        });
        Submitted { generation, created }
    }

    /// Ask for an update without editing anything (e.g. the initial selection).
    pub fn refresh(&self) -> u64 {
        let generation = self.next_generation();
        let _ = self.commands.send(Command::Refresh { generation });
        generation
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// The update for the newest submitted generation, if it has arrived.
    ///
    /// Older updates found in the channel are discarded, but the rejections
    /// they carried are kept and returned with the next update handed out.
    pub fn latest(&mut self) -> Option<SelectionUpdate> {
        let mut newest = None;
        while let Ok(update) = self.updates.try_recv() {
            newest = self.accept(update).or(newest);
        }
        newest
    }

    /// Block until the newest submitted generation is published or `timeout` passes.
    pub fn wait_latest(&mut self, timeout: Duration) -> Option<SelectionUpdate> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.checked_duration_since(Instant::now())?;
            match self.updates.recv_timeout(left) {
                Ok(update) => {
                    if let Some(update) = self.accept(update) {
                        return Some(update);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    // Keep the rejections of every update; hand out only the newest generation.
    fn accept(&mut self, mut update: SelectionUpdate) -> Option<SelectionUpdate> {
        self.carried.append(&mut update.rejected);
        if update.generation != self.latest_generation() {
            debug!(generation = update.generation, "dropping superseded update");
            return None;
        }
        update.rejected = std::mem::take(&mut self.carried);
        Some(update)
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::Shutdown);
            if handle.join().is_err() {
                warn!("aggregation worker panicked");
            }
        }
    }
}

impl Drop for AggregationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
