//! Debounced content edits.
//!
//! Editors emit one edit per keystroke. The pump buffers them, keeps only the
//! latest text per file, and writes the batch to the session once the stream
//! has been quiet for the debounce window. A flush writes whatever is pending
//! immediately, so an Apply issued after a flush sees the last keystroke.

use super::Session;
use crate::error::ApiError;
use crate::types::FileId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Coalesces edits by file, latest text wins
#[derive(Debug)]
pub struct EditBatcher {
    debounce: Duration,
    pending: BTreeMap<FileId, String>,
    last_edit: Option<Instant>,
}

impl EditBatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: BTreeMap::new(),
            last_edit: None,
        }
    }

    /// Buffer an edit and restart the quiet period
    pub fn add_edit(&mut self, file_id: FileId, text: String) {
        self.pending.insert(file_id, text);
        self.last_edit = Some(Instant::now());
    }

    /// When the pending batch becomes due, if there is one
    pub fn deadline(&self) -> Option<Instant> {
        if self.pending.is_empty() {
            return None;
        }
        self.last_edit.map(|t| t + self.debounce)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().map(|d| now >= d).unwrap_or(false)
    }

    /// Drain the batch in file id order
    pub fn take_batch(&mut self) -> Vec<(FileId, String)> {
        self.last_edit = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

enum EditCommand {
    Edit { file_id: FileId, text: String },
    Flush(oneshot::Sender<usize>),
}

/// Handle for feeding edits to a running [`EditPump`]
#[derive(Clone)]
pub struct EditSender {
    tx: mpsc::UnboundedSender<EditCommand>,
}

impl EditSender {
    /// Queue the editor's full text for a file
    pub fn send(&self, file_id: FileId, text: impl Into<String>) -> Result<(), ApiError> {
        self.tx
            .send(EditCommand::Edit {
                file_id,
                text: text.into(),
            })
            .map_err(|_| ApiError::PumpStopped)
    }

    /// Write pending edits now; returns how many files were written
    pub async fn flush(&self) -> Result<usize, ApiError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(EditCommand::Flush(ack))
            .map_err(|_| ApiError::PumpStopped)?;
        done.await.map_err(|_| ApiError::PumpStopped)
    }
}

/// Background task writing debounced edits into a session
pub struct EditPump;

impl EditPump {
    /// Spawn the pump on the current runtime
    ///
    /// The task ends, after writing anything still pending, once every
    /// sender has been dropped.
    pub fn spawn(session: Arc<Session>, debounce: Duration) -> (EditSender, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(session, rx, EditBatcher::new(debounce)));
        (EditSender { tx }, handle)
    }
}

async fn run(
    session: Arc<Session>,
    mut rx: mpsc::UnboundedReceiver<EditCommand>,
    mut batcher: EditBatcher,
) {
    loop {
        let deadline = batcher.deadline();
        tokio::select! {
            command = rx.recv() => match command {
                Some(EditCommand::Edit { file_id, text }) => batcher.add_edit(file_id, text),
                Some(EditCommand::Flush(ack)) => {
                    let written = write_batch(&session, &mut batcher);
                    let _ = ack.send(written);
                }
                None => {
                    write_batch(&session, &mut batcher);
                    debug!("Edit pump stopped");
                    return;
                }
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                write_batch(&session, &mut batcher);
            }
        }
    }
}

fn write_batch(session: &Session, batcher: &mut EditBatcher) -> usize {
    let mut written = 0;
    for (file_id, text) in batcher.take_batch() {
        match session.set_content(file_id, &text) {
            Ok(_) => written += 1,
            Err(e) => warn!(file_id = %file_id, error = %e, "Dropped buffered edit"),
        }
    }
    if written > 0 {
        debug!(files = written, "Wrote buffered edits");
    }
    written
}
